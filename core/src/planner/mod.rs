//! Request planning: template expansion, synthesized decomposition and
//! recovery planning.
//!
//! ```text
//! PlanRequest
//!   ↓
//! classify() → PlanStrategy
//!   ↓
//! templates::expand()            (CommandChain / RunScript / Scaffold)
//!   or GraphSynthesizer → parse_synthesized_tasks() → assemble()   (Decompose)
//!   ↓
//! ExecutionGraph
//! ```

mod builder;
mod classify;
mod extract;
mod recovery;
mod templates;
mod types;

pub use builder::{GraphBuilder, GraphSynthesizer};
pub use classify::{classify, Ecosystem, PlanStrategy};
pub use extract::{extract_json_span, parse_synthesized_tasks};
pub use recovery::RecoveryPlanner;
pub use templates::{expand, interpreter_for};
pub use types::{PlanRequest, SynthesisRequest, SynthesizedTask};
