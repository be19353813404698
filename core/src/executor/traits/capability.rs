use async_trait::async_trait;

use crate::executor::types::{ActionRequest, ActionResult, ValidationRequest, ValidationResult};

/// Something that can carry out a task's primary action.
///
/// Implementations must not panic or return Rust errors for task-level
/// problems; they report them through `ActionResult::success == false`.
#[async_trait]
pub trait ActionCapability: Send + Sync {
    fn name(&self) -> &str;

    async fn perform(&self, request: &ActionRequest) -> ActionResult;
}

/// Runs validation commands after a task's action.
#[async_trait]
pub trait ValidationCapability: Send + Sync {
    fn name(&self) -> &str;

    async fn validate(&self, request: &ValidationRequest) -> ValidationResult;
}
