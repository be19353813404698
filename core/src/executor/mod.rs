//! Sequential supervisor for task dependency graphs.
//!
//! This module owns everything between a planned graph and a finished run:
//! - Task node model and graph-scoped id generation
//! - Topological sequencing with cycle detection
//! - Critical path analysis for reporting
//! - Dependency-gated dispatch to action and validation capabilities
//! - Recursive recovery through the planner when a task fails
//!
//! # Architecture
//!
//! ```text
//! ExecutionGraph
//!   ↓
//! sequence() → ExecutionOrder          (CircularDependency on cycles)
//!   ↓
//! critical_path() → CriticalPath       (reporting only)
//!   ↓
//! ExecutionEngine::run()
//!   ├─ per task: dependency check → action → validation
//!   └─ on failure: RecoveryPlanner::recover() → sequence() → run_graph(depth + 1)
//!   ↓
//! RunLog + Result<(), ExecutorError>
//! ```

mod control;
mod critical_path;
mod engine;
mod graph;
mod progress;
mod sequencer;
pub mod traits;
pub mod types;

pub use control::{cancel_pair, CancelHandle, CancelToken};
pub use critical_path::{critical_path, CriticalPath};
pub use engine::{ExecutionEngine, ExecutionEngineBuilder, RunContext};
pub use graph::ExecutionGraph;
pub use progress::ProgressMonitor;
pub use sequencer::{sequence, ExecutionOrder};
pub use traits::{ActionCapability, OutputRendererPlugin, RenderEvent, ValidationCapability};
pub use types::{
    ActionRequest, ActionResult, ExecutionOpts, RunLog, TaskKind, TaskNode, TaskRecord,
    TaskStatus, ValidationRequest, ValidationResult,
};
