use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use taskforge_core::api::{OutputFormat, PlanRequest};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Text,
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "taskforge", version, about = "Plan and run engineering requests as task graphs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ~/.taskforge/config.toml, then ./taskforge.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Event output format (overrides [output] format).
    #[arg(long, value_enum, global = true)]
    pub format: Option<FormatArg>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RequestArgs {
    #[arg(long)]
    pub query: String,

    #[arg(long)]
    pub project_hint: Option<String>,

    /// Can be specified multiple times.
    #[arg(long = "known-file", action = clap::ArgAction::Append)]
    pub known_files: Vec<String>,

    #[arg(long)]
    pub active_file: Option<String>,
}

impl RequestArgs {
    pub fn to_request(&self) -> PlanRequest {
        let mut request = PlanRequest::new(self.query.clone())
            .with_known_files(self.known_files.iter().cloned());
        if let Some(hint) = &self.project_hint {
            request = request.with_project_hint(hint.clone());
        }
        if let Some(active) = &self.active_file {
            request = request.with_active_file(active.clone());
        }
        request
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Print the plan as one JSON document.
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Directory commands run in and files are written to.
    #[arg(long)]
    pub workspace: Option<String>,

    /// 0 disables recovery.
    #[arg(long)]
    pub max_recovery_depth: Option<u32>,

    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and print a plan without running it.
    Plan(PlanArgs),
    /// Plan, then run with validation and recovery.
    Run(RunArgs),
}
