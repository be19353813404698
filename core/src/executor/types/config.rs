use std::time::Duration;

use crate::config::ExecutorConfig;

/// Options for one execution engine.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Upper bound for a single action dispatch.
    pub action_timeout: Duration,

    /// Upper bound for a single validation command.
    pub validation_timeout: Duration,

    /// Nesting limit for recovery graphs. 0 disables recovery.
    pub max_recovery_depth: u32,

    /// Bytes of action output kept in the run log.
    pub capture_bytes: usize,

    /// Enable the indicatif progress display.
    pub progress_bar: bool,
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(300),
            validation_timeout: Duration::from_secs(120),
            max_recovery_depth: 3,
            capture_bytes: 64 * 1024,
            progress_bar: false,
        }
    }
}

impl ExecutionOpts {
    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self {
            action_timeout: Duration::from_secs(cfg.action_timeout_secs.max(1)),
            validation_timeout: Duration::from_secs(cfg.validation_timeout_secs.max(1)),
            max_recovery_depth: cfg.max_recovery_depth,
            capture_bytes: cfg.capture_bytes,
            progress_bar: cfg.progress_bar,
        }
    }
}
