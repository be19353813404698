use serde::{Deserialize, Serialize};

use super::task::{TaskKind, TaskNode, TaskStatus};

/// Request handed to an action capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub task_id: String,
    pub kind: TaskKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub context_summary: String,
}

impl ActionRequest {
    pub fn from_task(task: &TaskNode, context_summary: impl Into<String>) -> Self {
        Self {
            task_id: task.id.clone(),
            kind: task.kind,
            description: task.description.clone(),
            path: task.file_path.clone(),
            command: task.command.clone(),
            context_summary: context_summary.into(),
        }
    }
}

/// Uniform result of any action capability.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ActionResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error_message: Some(message.into()),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Best description of why the action failed.
    pub fn failure_message(&self) -> String {
        match self.error_message.as_deref().map(str::trim) {
            Some(msg) if !msg.is_empty() => msg.to_string(),
            _ if !self.output.trim().is_empty() => self.output.trim().to_string(),
            _ => "action reported failure without details".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Audit entry for one attempted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    /// Namespace of the graph the task belonged to.
    pub graph: String,
    /// 0 for the requested plan, n for the n-th nested recovery graph.
    pub depth: u32,
    pub kind: TaskKind,
    pub description: String,
    pub status: TaskStatus,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Append-only log of everything the supervisor attempted during a run,
/// including every recovery graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLog {
    records: Vec<TaskRecord>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TaskRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn status_of(&self, task_id: &str) -> Option<TaskStatus> {
        self.records
            .iter()
            .rev()
            .find(|r| r.task_id == task_id)
            .map(|r| r.status)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records
            .iter()
            .filter(|r| r.status == TaskStatus::Failed)
    }

    /// Records produced by recovery graphs.
    pub fn recovery_attempts(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter().filter(|r| r.depth > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_prefers_error_then_output() {
        let explicit = ActionResult::failure("disk full").with_output("partial");
        assert_eq!(explicit.failure_message(), "disk full");

        let output_only = ActionResult {
            success: false,
            output: "  stderr text \n".into(),
            error_message: Some("   ".into()),
        };
        assert_eq!(output_only.failure_message(), "stderr text");

        assert_eq!(
            ActionResult::default().failure_message(),
            "action reported failure without details"
        );
    }
}
