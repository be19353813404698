use std::sync::Arc;

use clap::Parser;
use taskforge_cli::{app, commands::cli};
use taskforge_core::api::{self as core_api, AppContext, CliError, ExecutorError, RunError};
use taskforge_plugins::services::PluginServicesFactory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let mut cfg = match args.config.as_deref() {
        Some(path) => core_api::load_from_path(path),
        None => core_api::load_default(),
    }
    .map_err(|e| CliError::Config(format!("{e:#}")))?;
    if let Some(format) = args.format {
        cfg.output.format = format.into();
    }
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    let ctx = AppContext::new(cfg, Some(Arc::new(PluginServicesFactory)));

    match args.command {
        cli::Commands::Plan(plan_args) => app::plan_cmd(plan_args, &ctx).await,
        cli::Commands::Run(run_args) => {
            let (handle, token) = core_api::cancel_pair();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, stopping before the next task");
                    handle.cancel();
                }
            });
            app::run_cmd(run_args, &ctx, token).await
        }
    }
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config error
    // 20: io error
    // 30/31: planning failed / circular dependency
    // 40/41/42: task failed / dependency unmet / cancelled
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Io(_) | CliError::Command(_) => 20,
        CliError::Run(RunError::Planning(_)) => 30,
        CliError::Run(RunError::Execution(ee)) => match ee {
            ExecutorError::CircularDependency { .. } => 31,
            ExecutorError::TaskFailed { .. } => 40,
            ExecutorError::DependencyUnmet { .. } => 41,
            ExecutorError::Cancelled { .. } => 42,
            ExecutorError::InvalidTransition { .. } | ExecutorError::TaskNotFound(_) => 50,
        },
        CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &core_api::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("taskforge"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("taskforge.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_api::PlannerError;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(exit_code_for_error(&CliError::Config("x".into())), 11);
        assert_eq!(
            exit_code_for_error(&CliError::Run(RunError::Planning(
                PlannerError::PlanningFailed("empty".into())
            ))),
            30
        );
        assert_eq!(
            exit_code_for_error(&CliError::Run(RunError::Execution(
                ExecutorError::CircularDependency {
                    cycle: vec!["a".into(), "a".into()]
                }
            ))),
            31
        );
        assert_eq!(
            exit_code_for_error(&CliError::Run(RunError::Execution(
                ExecutorError::TaskFailed {
                    task_id: "plan-1".into(),
                    message: "boom".into(),
                    recovery_chain: vec!["plan-1".into()],
                }
            ))),
            40
        );
        assert_eq!(
            exit_code_for_error(&CliError::Run(RunError::Execution(
                ExecutorError::Cancelled {
                    next_task: "plan-2".into()
                }
            ))),
            42
        );
    }
}
