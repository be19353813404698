use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_recursion::async_recursion;

use crate::error::ExecutorError;
use crate::planner::{PlanRequest, RecoveryPlanner};
use crate::util::tail_bytes;

use super::control::CancelToken;
use super::critical_path::critical_path;
use super::graph::ExecutionGraph;
use super::progress::ProgressMonitor;
use super::sequencer::{sequence, ExecutionOrder};
use super::traits::{ActionCapability, OutputRendererPlugin, RenderEvent, ValidationCapability};
use super::types::{
    ActionRequest, ExecutionOpts, RunLog, TaskKind, TaskNode, TaskRecord, TaskStatus,
    ValidationRequest,
};

/// Per-run data shared by the top-level graph and every recovery graph.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub request: PlanRequest,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, request: PlanRequest) -> Self {
        Self {
            run_id: run_id.into(),
            request,
        }
    }
}

/// Outcome of one task attempt, before it is recorded.
struct Attempt {
    output: String,
    error: Option<String>,
}

impl Attempt {
    fn ok(output: String) -> Self {
        Self {
            output,
            error: None,
        }
    }

    fn failed(output: String, error: impl Into<String>) -> Self {
        Self {
            output,
            error: Some(error.into()),
        }
    }
}

/// Sequential supervisor for execution graphs.
///
/// Tasks run one at a time in execution order. A failed task is handed to the
/// recovery planner and the resulting graph is supervised the same way, up to
/// `max_recovery_depth` levels deep.
pub struct ExecutionEngine {
    content: Arc<dyn ActionCapability>,
    command: Arc<dyn ActionCapability>,
    validator: Arc<dyn ValidationCapability>,
    recovery: Option<Arc<RecoveryPlanner>>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    cancel: Option<CancelToken>,
    opts: ExecutionOpts,
}

pub struct ExecutionEngineBuilder {
    content: Arc<dyn ActionCapability>,
    command: Arc<dyn ActionCapability>,
    validator: Arc<dyn ValidationCapability>,
    recovery: Option<Arc<RecoveryPlanner>>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    cancel: Option<CancelToken>,
    opts: ExecutionOpts,
}

impl ExecutionEngine {
    pub fn builder(
        content: Arc<dyn ActionCapability>,
        command: Arc<dyn ActionCapability>,
        validator: Arc<dyn ValidationCapability>,
    ) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(content, command, validator)
    }

    pub fn opts(&self) -> &ExecutionOpts {
        &self.opts
    }

    /// Supervise `graph` in `order`, recording every attempt in `log`.
    ///
    /// `order` must come from [`sequence`] over the same graph.
    pub async fn run(
        &self,
        ctx: &RunContext,
        graph: &mut ExecutionGraph,
        order: &ExecutionOrder,
        log: &mut RunLog,
    ) -> Result<(), ExecutorError> {
        let start = Instant::now();
        self.emit(RenderEvent::RunStart {
            run_id: ctx.run_id.clone(),
            total_tasks: graph.len(),
        });
        self.emit(RenderEvent::Plan {
            run_id: ctx.run_id.clone(),
            order: order.ids().to_vec(),
            critical_path: critical_path(graph, order).ids().to_vec(),
        });

        let mut progress = ProgressMonitor::new(graph.len(), self.opts.progress_bar);
        let result = self
            .run_graph(ctx, graph, order, 0, log, &mut progress)
            .await;
        progress.finish(result.is_ok());

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => tracing::info!(
                run_id = %ctx.run_id,
                tasks = log.len(),
                duration_ms,
                "run completed"
            ),
            Err(e) => tracing::error!(run_id = %ctx.run_id, error = %e, duration_ms, "run failed"),
        }
        self.emit(RenderEvent::RunEnd {
            run_id: ctx.run_id.clone(),
            success: result.is_ok(),
            failed_task: result
                .as_ref()
                .err()
                .and_then(|e| e.task_id())
                .map(str::to_string),
            duration_ms,
        });
        result
    }

    #[async_recursion]
    async fn run_graph(
        &self,
        ctx: &RunContext,
        graph: &mut ExecutionGraph,
        order: &ExecutionOrder,
        depth: u32,
        log: &mut RunLog,
        progress: &mut ProgressMonitor,
    ) -> Result<(), ExecutorError> {
        // Failed tasks whose recovery graph succeeded; they satisfy dependents.
        let mut superseded: HashSet<String> = HashSet::new();

        for task_id in order.iter() {
            if self.is_cancelled() {
                tracing::warn!(run_id = %ctx.run_id, next_task = task_id, "run cancelled");
                return Err(ExecutorError::Cancelled {
                    next_task: task_id.to_string(),
                });
            }

            let task = graph
                .get(task_id)
                .cloned()
                .ok_or_else(|| ExecutorError::TaskNotFound(task_id.to_string()))?;
            self.check_dependencies(graph, &task, &superseded)?;

            graph.transition(task_id, TaskStatus::Running)?;
            self.emit(RenderEvent::TaskStart {
                run_id: ctx.run_id.clone(),
                task_id: task_id.to_string(),
                depth,
            });
            progress.start_task(task_id, &task.description);
            tracing::info!(task_id, kind = %task.kind, depth, "task started");

            let started = Instant::now();
            let attempt = self.attempt(ctx, &task).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let status = if attempt.error.is_none() {
                TaskStatus::Completed
            } else {
                TaskStatus::Failed
            };
            graph.transition(task_id, status)?;
            progress.complete_task(task_id, status == TaskStatus::Completed, duration_ms);

            let record = TaskRecord {
                task_id: task_id.to_string(),
                graph: graph.namespace().to_string(),
                depth,
                kind: task.kind,
                description: task.description.clone(),
                status,
                output: attempt.output,
                error: attempt.error.clone(),
                duration_ms,
            };
            log.push(record.clone());
            self.emit(RenderEvent::TaskComplete {
                run_id: ctx.run_id.clone(),
                record,
            });

            let Some(message) = attempt.error else {
                tracing::info!(task_id, duration_ms, "task completed");
                continue;
            };
            tracing::warn!(task_id, error = %message, depth, "task failed");

            self.recover_task(ctx, graph, &task, message, depth, log, progress)
                .await?;
            superseded.insert(task_id.to_string());
        }

        Ok(())
    }

    /// Every in-graph dependency must be completed, or failed and recovered.
    fn check_dependencies(
        &self,
        graph: &ExecutionGraph,
        task: &TaskNode,
        superseded: &HashSet<String>,
    ) -> Result<(), ExecutorError> {
        for dep in graph.dependencies_in_graph(task) {
            let done = graph
                .get(dep)
                .map(|n| n.status == TaskStatus::Completed)
                .unwrap_or(false);
            if !done && !superseded.contains(dep) {
                tracing::error!(task_id = %task.id, dependency = dep, "dependency not met");
                return Err(ExecutorError::DependencyUnmet {
                    task_id: task.id.clone(),
                    dependency: dep.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Run the task's action and, if it succeeded, its validation command.
    async fn attempt(&self, ctx: &RunContext, task: &TaskNode) -> Attempt {
        let capability = if task.kind.is_content() {
            &self.content
        } else {
            &self.command
        };
        if task.kind == TaskKind::Command
            && task.command.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Attempt::failed(String::new(), "task has no command to run");
        }

        let request = ActionRequest::from_task(task, ctx.request.context_summary());
        tracing::debug!(task_id = %task.id, capability = capability.name(), "dispatching action");
        let result = match tokio::time::timeout(
            self.opts.action_timeout,
            capability.perform(&request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                return Attempt::failed(
                    String::new(),
                    format!(
                        "action timed out after {}s",
                        self.opts.action_timeout.as_secs()
                    ),
                )
            }
        };

        let output = tail_bytes(&result.output, self.opts.capture_bytes).to_string();
        if !result.success {
            return Attempt::failed(output, result.failure_message());
        }

        let Some(command) = task.validation_command.as_deref() else {
            return Attempt::ok(output);
        };
        let validation = ValidationRequest {
            command: command.to_string(),
        };
        tracing::debug!(task_id = %task.id, command, "running validation");
        match tokio::time::timeout(
            self.opts.validation_timeout,
            self.validator.validate(&validation),
        )
        .await
        {
            Ok(v) if v.passed() => Attempt::ok(output),
            Ok(v) => {
                let detail = if v.stderr.trim().is_empty() {
                    v.stdout.trim()
                } else {
                    v.stderr.trim()
                };
                let mut message =
                    format!("validation `{command}` exited with {}", v.exit_code);
                if !detail.is_empty() {
                    message.push_str(": ");
                    message.push_str(tail_bytes(detail, self.opts.capture_bytes));
                }
                Attempt::failed(output, message)
            }
            Err(_) => Attempt::failed(
                output,
                format!(
                    "validation `{command}` timed out after {}s",
                    self.opts.validation_timeout.as_secs()
                ),
            ),
        }
    }

    /// Plan and supervise a recovery graph for `task`.
    ///
    /// Any failure comes back as `TaskFailed` naming `task`, carrying the
    /// innermost message and the chain of failed ids.
    async fn recover_task(
        &self,
        ctx: &RunContext,
        graph: &mut ExecutionGraph,
        task: &TaskNode,
        message: String,
        depth: u32,
        log: &mut RunLog,
        progress: &mut ProgressMonitor,
    ) -> Result<(), ExecutorError> {
        let give_up = |message: String| ExecutorError::TaskFailed {
            task_id: task.id.clone(),
            message,
            recovery_chain: vec![task.id.clone()],
        };

        let Some(recovery) = &self.recovery else {
            return Err(give_up(message));
        };
        if depth >= self.opts.max_recovery_depth {
            tracing::warn!(
                task_id = %task.id,
                depth,
                limit = self.opts.max_recovery_depth,
                "recovery depth limit reached"
            );
            return Err(give_up(message));
        }

        if let Some(node) = graph.get_mut(&task.id) {
            node.retry_count += 1;
        }

        let mut sub = match recovery.recover(task, &message, &ctx.request).await {
            Ok(sub) => sub,
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "no recovery plan");
                return Err(give_up(message));
            }
        };
        let sub_order = match sequence(&sub) {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "recovery graph is not executable");
                return Err(give_up(format!("{message} (recovery plan rejected: {e})")));
            }
        };

        progress.add_tasks(sub.len());
        self.emit(RenderEvent::RecoveryStart {
            run_id: ctx.run_id.clone(),
            failed_task: task.id.clone(),
            graph: sub.namespace().to_string(),
            task_ids: sub_order.ids().to_vec(),
            depth: depth + 1,
        });
        tracing::info!(
            task_id = %task.id,
            graph = sub.namespace(),
            tasks = sub.len(),
            depth = depth + 1,
            "running recovery graph"
        );

        match self
            .run_graph(ctx, &mut sub, &sub_order, depth + 1, log, progress)
            .await
        {
            Ok(()) => {
                tracing::info!(task_id = %task.id, "task recovered");
                Ok(())
            }
            Err(ExecutorError::TaskFailed {
                message: inner,
                recovery_chain,
                ..
            }) => {
                let mut chain = vec![task.id.clone()];
                chain.extend(recovery_chain);
                Err(ExecutorError::TaskFailed {
                    task_id: task.id.clone(),
                    message: inner,
                    recovery_chain: chain,
                })
            }
            Err(other) => Err(other),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }
}

impl ExecutionEngineBuilder {
    pub fn new(
        content: Arc<dyn ActionCapability>,
        command: Arc<dyn ActionCapability>,
        validator: Arc<dyn ValidationCapability>,
    ) -> Self {
        Self {
            content,
            command,
            validator,
            recovery: None,
            renderer: None,
            cancel: None,
            opts: ExecutionOpts::default(),
        }
    }

    pub fn recovery(mut self, recovery: Arc<RecoveryPlanner>) -> Self {
        self.recovery = Some(recovery);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn opts(mut self, opts: ExecutionOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            content: self.content,
            command: self.command,
            validator: self.validator,
            recovery: self.recovery,
            renderer: self.renderer,
            cancel: self.cancel,
            opts: self.opts,
        }
    }
}
