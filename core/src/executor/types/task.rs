use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExecutorError, PlannerError};

/// Capability a task is dispatched to.
///
/// The set is closed: open-ended tags coming from templates or synthesis are
/// mapped onto it by [`TaskKind::from_tag`], and anything unrecognised is an
/// explicit [`PlannerError::UnknownTaskKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Create new file content.
    Generate,
    /// Change existing file content.
    Modify,
    /// Run a literal shell command.
    Command,
}

impl TaskKind {
    pub fn from_tag(tag: &str) -> Result<Self, PlannerError> {
        let normalized = tag.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "generate" | "create" | "create-file" | "new-file" | "code-generation"
            | "generation" | "scaffold" | "write" => Ok(Self::Generate),
            "modify" | "edit" | "code-change" | "change" | "refactor" | "fix" | "update"
            | "file-edit" => Ok(Self::Modify),
            "command" | "shell" | "shell-command" | "terminal" | "run" | "exec" | "execute"
            | "bash" => Ok(Self::Command),
            _ => Err(PlannerError::UnknownTaskKind(tag.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Modify => "modify",
            Self::Command => "command",
        }
    }

    pub fn is_content(&self) -> bool {
        matches!(self, Self::Generate | Self::Modify)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Status only moves forward; resetting a graph is the sole way back.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schedulable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    pub description: String,
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_command: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Recovery attempts already made for this node.
    #[serde(default)]
    pub retry_count: u32,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, description: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            kind,
            file_path: None,
            command: None,
            dependencies: Vec::new(),
            validation_command: None,
            status: TaskStatus::Pending,
            retry_count: 0,
        }
    }

    pub fn command(
        id: impl Into<String>,
        description: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self::new(id, description, TaskKind::Command).with_command(command)
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_validation(mut self, command: impl Into<String>) -> Self {
        self.validation_command = Some(command.into());
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// Check the node-local invariants: non-empty id and description, no
    /// self-reference, no duplicate dependency.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let invalid = |reason: &str| PlannerError::InvalidTask {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.description.trim().is_empty() {
            return Err(invalid("empty description"));
        }
        for (idx, dep) in self.dependencies.iter().enumerate() {
            if dep == &self.id {
                return Err(invalid("task depends on itself"));
            }
            if self.dependencies[..idx].contains(dep) {
                return Err(PlannerError::InvalidTask {
                    id: self.id.clone(),
                    reason: format!("duplicate dependency '{dep}'"),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn transition(&mut self, next: TaskStatus) -> Result<(), ExecutorError> {
        if !self.status.can_transition_to(next) {
            return Err(ExecutorError::InvalidTransition {
                task_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
