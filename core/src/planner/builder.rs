use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::executor::{ExecutionGraph, TaskKind, TaskNode};

use super::classify::{classify, PlanStrategy};
use super::extract::parse_synthesized_tasks;
use super::templates;
use super::types::{PlanRequest, SynthesisRequest, SynthesizedTask};

/// External capability that drafts a task list for open-ended requests.
///
/// Returns the raw reply text; parsing is done by the builder.
#[async_trait]
pub trait GraphSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<String>;
}

/// Turns plan requests into execution graphs.
pub struct GraphBuilder {
    synthesizer: Option<Arc<dyn GraphSynthesizer>>,
    synthesis_timeout: Duration,
    templates_enabled: bool,
    default_project_name: String,
}

impl GraphBuilder {
    pub fn new(synthesizer: Option<Arc<dyn GraphSynthesizer>>) -> Self {
        Self {
            synthesizer,
            synthesis_timeout: Duration::from_secs(120),
            templates_enabled: true,
            default_project_name: "app".to_string(),
        }
    }

    pub fn from_config(
        cfg: &PlannerConfig,
        synthesizer: Option<Arc<dyn GraphSynthesizer>>,
    ) -> Self {
        Self::new(synthesizer)
            .with_synthesis_timeout(Duration::from_secs(cfg.synthesis_timeout_secs.max(1)))
            .with_templates(cfg.templates_enabled)
            .with_default_project_name(cfg.default_project_name.clone())
    }

    pub fn with_synthesis_timeout(mut self, timeout: Duration) -> Self {
        self.synthesis_timeout = timeout;
        self
    }

    pub fn with_templates(mut self, enabled: bool) -> Self {
        self.templates_enabled = enabled;
        self
    }

    pub fn with_default_project_name(mut self, name: impl Into<String>) -> Self {
        self.default_project_name = name.into();
        self
    }

    /// Strategy the builder would use for `request`.
    pub fn strategy_for(&self, request: &PlanRequest) -> PlanStrategy {
        if self.templates_enabled {
            classify(request)
        } else {
            PlanStrategy::Decompose
        }
    }

    /// Build a graph whose ids live in `namespace`.
    ///
    /// Never returns an empty graph.
    pub async fn build_graph(
        &self,
        request: &PlanRequest,
        namespace: &str,
    ) -> Result<ExecutionGraph, PlannerError> {
        let strategy = self.strategy_for(request);
        tracing::info!(
            strategy = strategy.name(),
            template = strategy.is_template(),
            namespace = namespace,
            "building execution graph"
        );

        let graph = match templates::expand(
            &strategy,
            namespace,
            request,
            &self.default_project_name,
        )? {
            Some(graph) => graph,
            None => {
                self.synthesize_graph(&SynthesisRequest::from(request), request, namespace)
                    .await?
            }
        };

        if graph.is_empty() {
            return Err(PlannerError::PlanningFailed(
                "planning produced no tasks".to_string(),
            ));
        }
        Ok(graph)
    }

    /// Build a graph from the synthesis capability alone, bypassing templates.
    ///
    /// `request` supplies the known files used to infer missing task kinds.
    pub async fn synthesize_graph(
        &self,
        synthesis_request: &SynthesisRequest,
        request: &PlanRequest,
        namespace: &str,
    ) -> Result<ExecutionGraph, PlannerError> {
        let Some(synthesizer) = &self.synthesizer else {
            return Err(PlannerError::PlanningFailed(
                "request needs decomposition but no synthesis capability is configured"
                    .to_string(),
            ));
        };

        tracing::debug!(synthesizer = synthesizer.name(), "requesting task synthesis");
        let reply = match tokio::time::timeout(
            self.synthesis_timeout,
            synthesizer.synthesize(synthesis_request),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                return Err(PlannerError::PlanningFailed(format!(
                    "synthesis failed: {e:#}"
                )))
            }
            Err(_) => {
                return Err(PlannerError::PlanningFailed(format!(
                    "synthesis timed out after {}s",
                    self.synthesis_timeout.as_secs()
                )))
            }
        };

        let entries = parse_synthesized_tasks(&reply)?;
        let graph = assemble(namespace, entries, request)?;
        if graph.is_empty() {
            return Err(PlannerError::PlanningFailed(
                "synthesis produced no tasks".to_string(),
            ));
        }
        Ok(graph)
    }
}

/// Kind of a synthesized entry with no usable tag.
fn infer_kind(entry: &SynthesizedTask, request: &PlanRequest) -> TaskKind {
    if entry.command.is_some() {
        TaskKind::Command
    } else if entry
        .file_path
        .as_deref()
        .is_some_and(|p| request.is_known_file(p))
    {
        TaskKind::Modify
    } else {
        TaskKind::Generate
    }
}

/// Rename synthesized ids into `namespace` and rebuild their edges.
///
/// Runs in two passes so that an entry may depend on one listed after it.
pub(crate) fn assemble(
    namespace: &str,
    entries: Vec<SynthesizedTask>,
    request: &PlanRequest,
) -> Result<ExecutionGraph, PlannerError> {
    let mut graph = ExecutionGraph::new(namespace);

    let mut renamed: HashMap<String, String> = HashMap::new();
    let mut accepted: Vec<(String, TaskKind, SynthesizedTask)> = Vec::new();
    for entry in entries {
        if entry.description.trim().is_empty() {
            tracing::warn!(id = ?entry.id, "dropping synthesized task without description");
            continue;
        }
        let kind = match entry.kind.as_deref() {
            Some(tag) => match TaskKind::from_tag(tag) {
                Ok(kind) => kind,
                Err(e) => {
                    tracing::warn!(id = ?entry.id, error = %e, "dropping synthesized task");
                    continue;
                }
            },
            None => infer_kind(&entry, request),
        };

        let new_id = graph.next_id();
        if let Some(old) = entry.id.as_deref() {
            if renamed.contains_key(old) {
                tracing::warn!(id = old, "duplicate synthesized id, later entry unreachable by id");
            } else {
                renamed.insert(old.to_string(), new_id.clone());
            }
        }
        accepted.push((new_id, kind, entry));
    }

    for (id, kind, entry) in accepted {
        let mut seen: HashSet<String> = HashSet::new();
        let mut dependencies = Vec::new();
        for dep in &entry.dependencies {
            let Some(target) = renamed.get(dep) else {
                tracing::debug!(task_id = %id, dependency = %dep, "dropping dangling dependency");
                continue;
            };
            if *target == id {
                tracing::debug!(task_id = %id, "dropping self dependency");
                continue;
            }
            if !seen.insert(target.clone()) {
                tracing::debug!(task_id = %id, dependency = %target, "dropping duplicate dependency");
                continue;
            }
            dependencies.push(target.clone());
        }

        let mut node = TaskNode::new(id, entry.description.trim(), kind);
        node.file_path = entry.file_path;
        node.command = entry.command;
        node.validation_command = entry.validation_command;
        node.dependencies = dependencies;
        graph.push(node)?;
    }

    Ok(graph)
}
