//! CLI assembly: merges flag overrides into config, builds services and runs one request.
use std::path::Path;

use serde_json::json;
use taskforge_core::api::{
    AppConfig, AppContext, CancelToken, CliError, ExecutorError, Orchestrator, PlannedRun,
    RunError,
};

use crate::commands::cli::{PlanArgs, RunArgs};

pub fn apply_run_overrides(cfg: &mut AppConfig, args: &RunArgs) {
    if let Some(workspace) = args.workspace.as_deref().filter(|w| !w.trim().is_empty()) {
        cfg.executor.workspace = workspace.to_string();
    }
    if let Some(depth) = args.max_recovery_depth {
        cfg.executor.max_recovery_depth = depth;
    }
    if args.no_progress {
        cfg.executor.progress_bar = false;
    }
}

#[tracing::instrument(name = "cli.plan", skip(args, ctx))]
pub async fn plan_cmd(args: PlanArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let services = ctx
        .build_services()
        .await
        .map_err(|e| CliError::Config(format!("{e:#}")))?;
    let orchestrator = Orchestrator::new(ctx.cfg(), services, None);

    let plan = orchestrator
        .plan(&args.request.to_request())
        .await
        .map_err(CliError::Run)?;

    if args.json {
        let doc = plan_to_json(&plan);
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).map_err(|e| CliError::Anyhow(e.into()))?
        );
    } else {
        print!("{}", render_plan_text(&plan, ctx.cfg().output.ascii_only));
    }
    Ok(0)
}

#[tracing::instrument(name = "cli.run", skip(args, ctx, cancel))]
pub async fn run_cmd(args: RunArgs, ctx: &AppContext, cancel: CancelToken) -> Result<i32, CliError> {
    let mut cfg = ctx.cfg().clone();
    apply_run_overrides(&mut cfg, &args);

    let workspace = Path::new(&cfg.executor.workspace);
    if !workspace.is_dir() {
        return Err(CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("workspace {} is not a directory", workspace.display()),
        )));
    }

    let ctx = ctx.with_config(cfg);
    let services = ctx
        .build_services()
        .await
        .map_err(|e| CliError::Config(format!("{e:#}")))?;
    let orchestrator = Orchestrator::new(ctx.cfg(), services, Some(cancel));

    let outcome = orchestrator.handle(args.request.to_request()).await;
    tracing::info!(
        run_id = %outcome.run_id,
        attempted = outcome.log.len(),
        recoveries = outcome.log.recovery_attempts().count(),
        success = outcome.is_success(),
        "run finished"
    );

    if let Err(RunError::Execution(ExecutorError::TaskFailed { recovery_chain, .. })) =
        &outcome.result
    {
        if recovery_chain.len() > 1 {
            eprintln!("recovery chain: {}", recovery_chain.join(" -> "));
        }
    }
    outcome.result.map_err(CliError::Run)?;
    Ok(0)
}

pub fn plan_to_json(plan: &PlannedRun) -> serde_json::Value {
    json!({
        "namespace": plan.graph.namespace(),
        "tasks": plan.graph.nodes(),
        "order": plan.order.ids(),
        "critical_path": plan.critical_path.ids(),
    })
}

pub fn render_plan_text(plan: &PlannedRun, ascii_only: bool) -> String {
    let arrow = if ascii_only { " -> " } else { " → " };
    let mut out = format!("PLAN {} ({} tasks)\n", plan.graph.namespace(), plan.graph.len());
    for id in plan.order.iter() {
        let Some(task) = plan.graph.get(id) else {
            continue;
        };
        let marker = if plan.critical_path.contains(id) { "*" } else { " " };
        out.push_str(&format!(
            "{} {} [{}] {}\n",
            marker,
            task.id,
            task.kind.as_str(),
            task.description
        ));
        if let Some(path) = &task.file_path {
            out.push_str(&format!("      file: {}\n", path));
        }
        if let Some(cmd) = &task.command {
            out.push_str(&format!("      $ {}\n", cmd));
        }
        if let Some(check) = &task.validation_command {
            out.push_str(&format!("      check: {}\n", check));
        }
        if !task.dependencies.is_empty() {
            out.push_str(&format!("      after: {}\n", task.dependencies.join(", ")));
        }
    }
    out.push_str(&format!("order: {}\n", plan.order.ids().join(arrow)));
    out.push_str(&format!(
        "critical path: {}\n",
        plan.critical_path.ids().join(arrow)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cli::RequestArgs;
    use taskforge_core::api::{
        critical_path, sequence, ExecutionGraph, TaskKind, TaskNode,
    };

    fn sample_plan() -> PlannedRun {
        let graph = ExecutionGraph::from_tasks(
            "plan",
            vec![
                TaskNode::new("plan-1", "build", TaskKind::Command)
                    .with_command("cargo build"),
                TaskNode::new("plan-2", "test", TaskKind::Command)
                    .with_command("cargo test")
                    .depends_on("plan-1"),
            ],
        )
        .unwrap();
        let order = sequence(&graph).unwrap();
        let critical_path = critical_path(&graph, &order);
        PlannedRun {
            graph,
            order,
            critical_path,
        }
    }

    #[test]
    fn plan_text_lists_tasks_in_order() {
        let text = render_plan_text(&sample_plan(), true);
        assert!(text.starts_with("PLAN plan (2 tasks)\n"));
        assert!(text.contains("* plan-1 [command] build\n      $ cargo build\n"));
        assert!(text.contains("      after: plan-1\n"));
        assert!(text.ends_with("critical path: plan-1 -> plan-2\n"));
    }

    #[test]
    fn plan_json_has_order_and_tasks() {
        let doc = plan_to_json(&sample_plan());
        assert_eq!(doc["order"], json!(["plan-1", "plan-2"]));
        assert_eq!(doc["tasks"][1]["dependencies"], json!(["plan-1"]));
    }

    #[test]
    fn run_overrides_apply() {
        let mut cfg = AppConfig::default();
        let args = RunArgs {
            request: RequestArgs {
                query: "x".into(),
                project_hint: None,
                known_files: Vec::new(),
                active_file: None,
            },
            workspace: Some("/tmp/ws".into()),
            max_recovery_depth: Some(0),
            no_progress: true,
        };
        apply_run_overrides(&mut cfg, &args);
        assert_eq!(cfg.executor.workspace, "/tmp/ws");
        assert_eq!(cfg.executor.max_recovery_depth, 0);
        assert!(!cfg.executor.progress_bar);
    }
}
