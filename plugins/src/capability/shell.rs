use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use taskforge_core::api::{
    tail_bytes, ActionCapability, ActionRequest, ActionResult, ExecutorConfig,
    ValidationCapability, ValidationRequest, ValidationResult,
};
use tokio::process::Command;

/// Captured result of one shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// -1 when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs commands through `<shell> -c` inside the workspace.
///
/// Serves both `command` tasks and validation commands.
pub struct ShellCapability {
    shell: String,
    workspace: PathBuf,
    capture_bytes: usize,
}

impl ShellCapability {
    pub fn new(shell: impl Into<String>, workspace: impl Into<PathBuf>, capture_bytes: usize) -> Self {
        Self {
            shell: shell.into(),
            workspace: workspace.into(),
            capture_bytes,
        }
    }

    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self::new(cfg.shell.clone(), cfg.workspace.clone(), cfg.capture_bytes)
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub async fn run(&self, command: &str) -> std::io::Result<ShellOutput> {
        tracing::debug!(shell = %self.shell, cwd = %self.workspace.display(), command, "spawning");
        let out = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(&self.workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);
        Ok(ShellOutput {
            exit_code: out.status.code().unwrap_or(-1),
            stdout: tail_bytes(&stdout, self.capture_bytes).to_string(),
            stderr: tail_bytes(&stderr, self.capture_bytes).to_string(),
        })
    }
}

#[async_trait]
impl ActionCapability for ShellCapability {
    fn name(&self) -> &str {
        "shell"
    }

    async fn perform(&self, request: &ActionRequest) -> ActionResult {
        let Some(command) = request.command.as_deref().filter(|c| !c.trim().is_empty()) else {
            return ActionResult::failure("no command given");
        };

        match self.run(command).await {
            Ok(out) if out.exit_code == 0 => ActionResult::ok(out.stdout),
            Ok(out) => {
                let detail = if out.stderr.trim().is_empty() {
                    out.stdout.trim()
                } else {
                    out.stderr.trim()
                };
                let mut message = format!("`{command}` exited with {}", out.exit_code);
                if !detail.is_empty() {
                    message.push_str(": ");
                    message.push_str(detail);
                }
                ActionResult::failure(message).with_output(out.stdout)
            }
            Err(e) => ActionResult::failure(format!("failed to spawn `{command}`: {e}")),
        }
    }
}

#[async_trait]
impl ValidationCapability for ShellCapability {
    fn name(&self) -> &str {
        "shell"
    }

    async fn validate(&self, request: &ValidationRequest) -> ValidationResult {
        match self.run(&request.command).await {
            Ok(out) => ValidationResult {
                exit_code: out.exit_code,
                stdout: out.stdout,
                stderr: out.stderr,
            },
            Err(e) => ValidationResult {
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("failed to spawn validation: {e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskforge_core::api::TaskKind;

    fn request(command: &str) -> ActionRequest {
        ActionRequest {
            task_id: "plan-1".into(),
            kind: TaskKind::Command,
            description: "test".into(),
            path: None,
            command: Some(command.into()),
            context_summary: String::new(),
        }
    }

    #[tokio::test]
    async fn command_runs_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let shell = ShellCapability::new("sh", dir.path(), 1024);

        let result = shell.perform(&request("echo hi > out.txt && cat out.txt")).await;

        assert!(result.success);
        assert_eq!(result.output.trim(), "hi");
        assert!(dir.path().join("out.txt").exists());
    }

    #[tokio::test]
    async fn non_zero_exit_is_failure_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let shell = ShellCapability::new("sh", dir.path(), 1024);

        let result = shell.perform(&request("echo nope >&2; exit 3")).await;

        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("`echo nope >&2; exit 3` exited with 3: nope")
        );
    }

    #[tokio::test]
    async fn validation_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let shell = ShellCapability::new("sh", dir.path(), 1024);

        let missing = shell
            .validate(&ValidationRequest {
                command: "test -f out.txt".into(),
            })
            .await;
        assert_eq!(missing.exit_code, 1);

        std::fs::write(dir.path().join("out.txt"), "x").unwrap();
        let present = shell
            .validate(&ValidationRequest {
                command: "test -f out.txt".into(),
            })
            .await;
        assert!(present.passed());
    }

    #[tokio::test]
    async fn output_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let shell = ShellCapability::new("sh", dir.path(), 4);

        let out = shell.run("printf 0123456789").await.unwrap();

        assert_eq!(out.stdout, "6789");
    }

    #[tokio::test]
    async fn missing_command_is_failure() {
        let shell = ShellCapability::new("sh", ".", 1024);
        let mut req = request("x");
        req.command = None;
        assert!(!shell.perform(&req).await.success);
    }
}
