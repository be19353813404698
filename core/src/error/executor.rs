use thiserror::Error;

use crate::executor::types::TaskStatus;

/// Errors raised while sequencing or supervising an execution graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Circular dependency detected: {}", format_cycle_path(.cycle))]
    CircularDependency { cycle: Vec<String> },

    #[error("Dependency not met: task '{task_id}' is ready but '{dependency}' has not completed")]
    DependencyUnmet { task_id: String, dependency: String },

    #[error("Task '{task_id}' failed: {message}")]
    TaskFailed {
        task_id: String,
        message: String,
        /// Failed task ids from the outermost graph down to the innermost recovery graph.
        recovery_chain: Vec<String>,
    },

    #[error("Invalid status transition for task '{task_id}': {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Run cancelled before task '{next_task}'")]
    Cancelled { next_task: String },
}

impl ExecutorError {
    /// Id of the task the error is about, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::CircularDependency { cycle } => cycle.first().map(String::as_str),
            Self::DependencyUnmet { task_id, .. }
            | Self::TaskFailed { task_id, .. }
            | Self::InvalidTransition { task_id, .. } => Some(task_id),
            Self::TaskNotFound(id) => Some(id),
            Self::Cancelled { next_task } => Some(next_task),
        }
    }
}

fn format_cycle_path(cycle: &[String]) -> String {
    cycle.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_display_joins_path() {
        let err = ExecutorError::CircularDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a -> b -> a");
        assert_eq!(err.task_id(), Some("a"));
    }
}
