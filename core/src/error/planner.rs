use thiserror::Error;

/// Errors raised while turning a request into an execution graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    #[error("Invalid task '{id}': {reason}")]
    InvalidTask { id: String, reason: String },

    #[error("Unknown task kind: {0}")]
    UnknownTaskKind(String),

    #[error("No recovery plan for task '{task_id}': {reason}")]
    NoRecoveryPlan { task_id: String, reason: String },
}
