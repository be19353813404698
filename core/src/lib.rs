//! Task-graph planning and supervised execution.
//!
//! A [`planner::PlanRequest`] is turned into an [`executor::ExecutionGraph`],
//! ordered, and run task by task with validation and recursive recovery.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod util;
