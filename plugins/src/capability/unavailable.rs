use async_trait::async_trait;
use taskforge_core::api::{ActionCapability, ActionRequest, ActionResult};

/// Stand-in for a capability that is not configured; every call fails.
pub struct UnavailableCapability {
    reason: String,
}

impl UnavailableCapability {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ActionCapability for UnavailableCapability {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn perform(&self, request: &ActionRequest) -> ActionResult {
        tracing::warn!(task_id = %request.task_id, reason = %self.reason, "capability unavailable");
        ActionResult::failure(self.reason.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::api::TaskKind;

    #[tokio::test]
    async fn always_fails_with_reason() {
        let cap = UnavailableCapability::new("no synthesis url configured");
        let result = cap
            .perform(&ActionRequest {
                task_id: "plan-1".into(),
                kind: TaskKind::Generate,
                description: "x".into(),
                path: Some("a.txt".into()),
                command: None,
                context_summary: String::new(),
            })
            .await;
        assert_eq!(result.failure_message(), "no synthesis url configured");
    }
}
