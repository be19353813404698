use std::sync::Arc;

use crate::error::PlannerError;
use crate::executor::{ExecutionGraph, TaskNode};
use crate::util::tail_chars;

use super::builder::GraphBuilder;
use super::types::{PlanRequest, SynthesisRequest};

/// Error text folded into a recovery request is capped to its last part.
const MAX_ERROR_CHARS: usize = 4000;

/// Plans sub-graphs that repair a failed task.
///
/// Recovery always goes to the synthesis capability. Template strategies are
/// never applied, so a repair cannot replay the plan that produced the failure.
pub struct RecoveryPlanner {
    builder: Arc<GraphBuilder>,
}

impl RecoveryPlanner {
    pub fn new(builder: Arc<GraphBuilder>) -> Self {
        Self { builder }
    }

    /// Namespace for the recovery graph of `task_id`.
    pub fn namespace_for(task_id: &str) -> String {
        format!("{task_id}-fix")
    }

    /// Planning request asking to fix `failed`.
    ///
    /// The query names only the failed task and its error; the original
    /// request travels in the synthesis context instead.
    pub fn recovery_request(failed: &TaskNode, error: &str, context: &PlanRequest) -> PlanRequest {
        let mut query = format!(
            "Fix the failure of one {} step: \"{}\".",
            failed.kind,
            neutralize(&failed.description)
        );
        if let Some(path) = &failed.file_path {
            query.push_str(&format!("\nTarget file: {path}"));
        }
        if let Some(command) = &failed.command {
            query.push_str(&format!("\nThe failing command was: \"{}\"", neutralize(command)));
        }
        if let Some(validation) = &failed.validation_command {
            query.push_str(&format!("\nIt must pass the check: \"{}\"", neutralize(validation)));
        }
        query.push_str("\nError:\n");
        query.push_str(tail_chars(error.trim(), MAX_ERROR_CHARS));
        query.push_str("\nOnly repair this failure; earlier steps already succeeded.");

        PlanRequest {
            query,
            project_hint: context.project_hint.clone(),
            known_files: context.known_files.clone(),
            active_file: failed
                .file_path
                .clone()
                .or_else(|| context.active_file.clone()),
        }
    }

    /// Synthesis request for the recovery of `failed`.
    pub fn synthesis_request(
        failed: &TaskNode,
        error: &str,
        context: &PlanRequest,
    ) -> SynthesisRequest {
        let request = Self::recovery_request(failed, error, context);
        let mut project_context = request.context_summary();
        let original = context.query.trim();
        if !original.is_empty() {
            project_context.push_str("Original request: ");
            project_context.push_str(original);
            project_context.push('\n');
        }
        SynthesisRequest {
            query: request.query,
            project_context,
        }
    }

    /// Plan a graph that resolves `failed`, in namespace `{id}-fix`.
    pub async fn recover(
        &self,
        failed: &TaskNode,
        error: &str,
        context: &PlanRequest,
    ) -> Result<ExecutionGraph, PlannerError> {
        let request = Self::recovery_request(failed, error, context);
        let synthesis = Self::synthesis_request(failed, error, context);
        let namespace = Self::namespace_for(&failed.id);

        let graph = self
            .builder
            .synthesize_graph(&synthesis, &request, &namespace)
            .await
            .map_err(|e| PlannerError::NoRecoveryPlan {
                task_id: failed.id.clone(),
                reason: e.to_string(),
            })?;

        if graph.is_empty() {
            return Err(PlannerError::NoRecoveryPlan {
                task_id: failed.id.clone(),
                reason: "recovery produced no tasks".to_string(),
            });
        }

        tracing::info!(
            task_id = %failed.id,
            namespace = %namespace,
            tasks = graph.len(),
            "planned recovery graph"
        );
        Ok(graph)
    }
}

/// Backticks read as command quoting; fold them into plain quotes.
fn neutralize(text: &str) -> String {
    text.replace('`', "'")
}
