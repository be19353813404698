use std::sync::Arc;

use uuid::Uuid;

use crate::config::AppConfig;
use crate::context::Services;
use crate::error::RunError;
use crate::executor::{
    critical_path, sequence, CancelToken, CriticalPath, ExecutionEngine, ExecutionGraph,
    ExecutionOpts, ExecutionOrder, RunContext, RunLog,
};
use crate::planner::{GraphBuilder, PlanRequest, RecoveryPlanner};

/// A graph ready for supervision.
#[derive(Debug, Clone)]
pub struct PlannedRun {
    pub graph: ExecutionGraph,
    pub order: ExecutionOrder,
    pub critical_path: CriticalPath,
}

/// Everything the caller learns about one request.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    /// Absent when planning failed. After a run, node statuses are final.
    pub plan: Option<PlannedRun>,
    pub result: Result<(), RunError>,
    pub log: RunLog,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Request -> graph -> order -> supervised run.
pub struct Orchestrator {
    builder: Arc<GraphBuilder>,
    engine: ExecutionEngine,
    namespace: String,
}

impl Orchestrator {
    pub fn new(cfg: &AppConfig, services: Services, cancel: Option<CancelToken>) -> Self {
        let builder = Arc::new(GraphBuilder::from_config(
            &cfg.planner,
            services.synthesizer.clone(),
        ));

        let mut engine = ExecutionEngine::builder(
            services.content.clone(),
            services.command.clone(),
            services.validator.clone(),
        )
        .opts(ExecutionOpts::from_config(&cfg.executor))
        .recovery(Arc::new(RecoveryPlanner::new(builder.clone())));
        if let Some(renderer) = services.renderer.clone() {
            engine = engine.renderer(renderer);
        }
        if let Some(token) = cancel {
            engine = engine.cancel_token(token);
        }

        Self::from_parts(builder, engine.build(), cfg.planner.namespace.clone())
    }

    pub fn from_parts(
        builder: Arc<GraphBuilder>,
        engine: ExecutionEngine,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            builder,
            engine,
            namespace: namespace.into(),
        }
    }

    /// Build, sequence and annotate a graph without running it.
    pub async fn plan(&self, request: &PlanRequest) -> Result<PlannedRun, RunError> {
        let graph = self.builder.build_graph(request, &self.namespace).await?;
        let order = sequence(&graph)?;
        let critical_path = critical_path(&graph, &order);
        tracing::info!(
            tasks = graph.len(),
            critical_path_len = critical_path.len(),
            "plan ready"
        );
        Ok(PlannedRun {
            graph,
            order,
            critical_path,
        })
    }

    /// Plan and run `request` to a single terminal result.
    pub async fn handle(&self, request: PlanRequest) -> RunOutcome {
        let run_id = Uuid::new_v4().to_string();
        let mut log = RunLog::new();

        let mut plan = match self.plan(&request).await {
            Ok(plan) => plan,
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "planning failed");
                return RunOutcome {
                    run_id,
                    plan: None,
                    result: Err(e),
                    log,
                };
            }
        };

        let ctx = RunContext::new(run_id.clone(), request);
        let result = self
            .engine
            .run(&ctx, &mut plan.graph, &plan.order, &mut log)
            .await
            .map_err(RunError::from);

        RunOutcome {
            run_id,
            plan: Some(plan),
            result,
            log,
        }
    }
}
