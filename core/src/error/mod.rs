#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod planner;

pub use error::{CliError, RunError};
pub use executor::ExecutorError;
pub use planner::PlannerError;
