//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskforge_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, load_default, load_from_path, AppConfig, ExecutorConfig, LoggingConfig,
    OutputConfig, OutputFormat, PlannerConfig, SynthesisConfig, SynthesisProvider,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{CliError, ExecutorError, PlannerError, RunError};
pub use crate::executor::{
    cancel_pair, critical_path, sequence, ActionCapability, ActionRequest, ActionResult,
    CancelHandle, CancelToken, CriticalPath, ExecutionEngine, ExecutionGraph, ExecutionOpts,
    ExecutionOrder, OutputRendererPlugin, RenderEvent, RunContext, RunLog, TaskKind, TaskNode,
    TaskRecord, TaskStatus, ValidationCapability, ValidationRequest, ValidationResult,
};
pub use crate::orchestrator::{Orchestrator, PlannedRun, RunOutcome};
pub use crate::planner::{
    classify, extract_json_span, parse_synthesized_tasks, GraphBuilder, GraphSynthesizer,
    PlanRequest, PlanStrategy, RecoveryPlanner, SynthesisRequest, SynthesizedTask,
};
pub use crate::util::{tail_bytes, tail_chars};
