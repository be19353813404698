use crate::error::PlannerError;
use crate::executor::{ExecutionGraph, TaskKind, TaskNode};

use super::classify::{Ecosystem, PlanStrategy};
use super::types::PlanRequest;

/// One step of a template before ids are assigned.
struct Step {
    description: String,
    kind: TaskKind,
    file_path: Option<String>,
    command: Option<String>,
    validation: Option<String>,
    /// Indices of earlier steps this one waits for.
    after: Vec<usize>,
}

impl Step {
    fn command(description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind: TaskKind::Command,
            file_path: None,
            command: Some(command.into()),
            validation: None,
            after: Vec::new(),
        }
    }

    fn generate(description: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind: TaskKind::Generate,
            file_path: Some(path.into()),
            command: None,
            validation: None,
            after: Vec::new(),
        }
    }

    fn validated_by(mut self, command: impl Into<String>) -> Self {
        self.validation = Some(command.into());
        self
    }

    fn after(mut self, step: usize) -> Self {
        self.after.push(step);
        self
    }
}

/// Expand a template strategy into a fresh graph.
///
/// Returns `Ok(None)` for [`PlanStrategy::Decompose`], which has no template.
pub fn expand(
    strategy: &PlanStrategy,
    namespace: &str,
    request: &PlanRequest,
    default_project_name: &str,
) -> Result<Option<ExecutionGraph>, PlannerError> {
    let steps = match strategy {
        PlanStrategy::CommandChain { commands } => command_chain(commands),
        PlanStrategy::RunScript { script } => run_script(script),
        PlanStrategy::Scaffold { ecosystem, name } => {
            let name = name.as_deref().unwrap_or(default_project_name);
            scaffold(*ecosystem, name, request)
        }
        PlanStrategy::Decompose => return Ok(None),
    };

    let mut graph = ExecutionGraph::new(namespace);
    let mut ids: Vec<String> = Vec::with_capacity(steps.len());
    for step in steps {
        let id = graph.next_id();
        let mut node = TaskNode::new(id.clone(), step.description, step.kind);
        node.file_path = step.file_path;
        node.command = step.command;
        node.validation_command = step.validation;
        for idx in step.after {
            if let Some(dep) = ids.get(idx) {
                node = node.depends_on(dep.clone());
            }
        }
        graph.push(node)?;
        ids.push(id);
    }

    tracing::debug!(
        strategy = strategy.name(),
        namespace = namespace,
        tasks = graph.len(),
        "expanded template"
    );
    Ok(Some(graph))
}

fn command_chain(commands: &[String]) -> Vec<Step> {
    commands
        .iter()
        .enumerate()
        .map(|(i, cmd)| {
            let step = Step::command(format!("Run `{cmd}`"), cmd.clone());
            if i == 0 {
                step
            } else {
                step.after(i - 1)
            }
        })
        .collect()
}

/// Interpreter for a script, chosen from its extension.
pub fn interpreter_for(script: &str) -> &'static str {
    let ext = script
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "bash" => "bash",
        "py" => "python3",
        "js" | "mjs" => "node",
        "ts" => "npx tsx",
        "rb" => "ruby",
        "pl" => "perl",
        "ps1" => "pwsh -File",
        _ => "sh",
    }
}

fn run_script(script: &str) -> Vec<Step> {
    let interpreter = interpreter_for(script);
    vec![
        Step::command(
            format!("Check that {script} exists"),
            format!("test -f {script}"),
        ),
        Step::command(
            format!("Run {script} with {interpreter}"),
            format!("{interpreter} {script}"),
        )
        .after(0),
    ]
}

fn scaffold(ecosystem: Ecosystem, name: &str, request: &PlanRequest) -> Vec<Step> {
    let readme = format!("{name}/README.md");
    let readme_step = Step::generate(
        format!("Write a README for {name} describing: {}", request.query.trim()),
        readme.clone(),
    )
    .validated_by(format!("test -s {readme}"))
    .after(0);

    match ecosystem {
        Ecosystem::Rust => vec![
            Step::command(
                format!("Create the Rust crate {name}"),
                format!("cargo new {name}"),
            )
            .validated_by(format!("test -f {name}/Cargo.toml")),
            readme_step,
            Step::command(
                format!("Build {name}"),
                format!("cd {name} && cargo build"),
            )
            .after(0),
        ],
        Ecosystem::Node => vec![
            Step::command(
                format!("Initialise the Node package {name}"),
                format!("mkdir -p {name} && cd {name} && npm init -y"),
            )
            .validated_by(format!("test -f {name}/package.json")),
            Step::generate(
                format!("Write the entry point of {name}"),
                format!("{name}/index.js"),
            )
            .after(0),
            readme_step,
            Step::command(
                format!("Check {name}/index.js parses"),
                format!("node --check {name}/index.js"),
            )
            .after(1),
        ],
        Ecosystem::Python => vec![
            Step::command(
                format!("Create the Python project {name} with a virtualenv"),
                format!("mkdir -p {name} && python3 -m venv {name}/.venv"),
            )
            .validated_by(format!("test -d {name}/.venv")),
            Step::generate(
                format!("Write the main module of {name}"),
                format!("{name}/main.py"),
            )
            .after(0),
            readme_step,
            Step::command(
                format!("Byte-compile {name}/main.py"),
                format!("python3 -m py_compile {name}/main.py"),
            )
            .after(1),
        ],
        Ecosystem::Go => vec![
            Step::command(
                format!("Initialise the Go module {name}"),
                format!("mkdir -p {name} && cd {name} && go mod init {name}"),
            )
            .validated_by(format!("test -f {name}/go.mod")),
            Step::generate(
                format!("Write the main package of {name}"),
                format!("{name}/main.go"),
            )
            .after(0),
            readme_step,
            Step::command(
                format!("Build {name}"),
                format!("cd {name} && go build ./..."),
            )
            .after(1),
        ],
        Ecosystem::React => vec![
            Step::command(
                format!("Create the Vite React app {name}"),
                format!("npm create vite@latest {name} -- --template react"),
            )
            .validated_by(format!("test -f {name}/package.json")),
            Step::command(
                format!("Install dependencies of {name}"),
                format!("cd {name} && npm install"),
            )
            .validated_by(format!("test -d {name}/node_modules"))
            .after(0),
            readme_step,
            Step::command(
                format!("Build {name}"),
                format!("cd {name} && npm run build"),
            )
            .validated_by(format!("test -d {name}/dist"))
            .after(1),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expand_strategy(strategy: PlanStrategy) -> ExecutionGraph {
        expand(&strategy, "plan", &PlanRequest::new("q"), "app")
            .unwrap()
            .unwrap()
    }

    #[test]
    fn command_chain_links_each_command_to_the_previous() {
        let graph = expand_strategy(PlanStrategy::CommandChain {
            commands: vec!["cargo fmt".into(), "cargo clippy".into(), "cargo test".into()],
        });
        let ids: Vec<&str> = graph.ids().collect();
        assert_eq!(ids, vec!["plan-1", "plan-2", "plan-3"]);
        assert!(graph.get("plan-1").unwrap().dependencies.is_empty());
        assert_eq!(graph.get("plan-3").unwrap().dependencies, vec!["plan-2"]);
        assert_eq!(
            graph.get("plan-2").unwrap().command.as_deref(),
            Some("cargo clippy")
        );
    }

    #[test]
    fn run_script_checks_then_runs_with_interpreter() {
        let graph = expand_strategy(PlanStrategy::RunScript {
            script: "tools/seed.py".into(),
        });
        assert_eq!(graph.len(), 2);
        let run = graph.get("plan-2").unwrap();
        assert_eq!(run.command.as_deref(), Some("python3 tools/seed.py"));
        assert_eq!(run.dependencies, vec!["plan-1"]);
    }

    #[test]
    fn interpreter_follows_extension() {
        assert_eq!(interpreter_for("a.sh"), "sh");
        assert_eq!(interpreter_for("a.MJS"), "node");
        assert_eq!(interpreter_for("dir.v2/run.rb"), "ruby");
    }

    #[test]
    fn scaffold_uses_default_name_and_validations() {
        let graph = expand_strategy(PlanStrategy::Scaffold {
            ecosystem: Ecosystem::Rust,
            name: None,
        });
        let first = graph.get("plan-1").unwrap();
        assert_eq!(first.command.as_deref(), Some("cargo new app"));
        assert_eq!(
            first.validation_command.as_deref(),
            Some("test -f app/Cargo.toml")
        );
        let readme = graph.get("plan-2").unwrap();
        assert_eq!(readme.kind, TaskKind::Generate);
        assert_eq!(readme.file_path.as_deref(), Some("app/README.md"));
    }

    #[test]
    fn every_scaffold_is_a_valid_graph() {
        for eco in [
            Ecosystem::Rust,
            Ecosystem::Node,
            Ecosystem::Python,
            Ecosystem::Go,
            Ecosystem::React,
        ] {
            let graph = expand_strategy(PlanStrategy::Scaffold {
                ecosystem: eco,
                name: Some("demo".into()),
            });
            assert!(graph.len() >= 3, "{} produced too few tasks", eco.as_str());
            assert!(crate::executor::sequence(&graph).is_ok());
        }
    }

    #[test]
    fn decompose_has_no_template() {
        let out = expand(&PlanStrategy::Decompose, "plan", &PlanRequest::new("q"), "app").unwrap();
        assert!(out.is_none());
    }
}
