use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use taskforge_core::api::{ActionCapability, ActionRequest, ActionResult, TaskKind};

use crate::backend::AiServiceClient;

/// Writes generated or rewritten files into the workspace.
pub struct AiContentCapability {
    client: Arc<AiServiceClient>,
    workspace: PathBuf,
}

impl AiContentCapability {
    pub fn new(client: Arc<AiServiceClient>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            client,
            workspace: workspace.into(),
        }
    }

    /// Resolve `path` under the workspace; absolute and `..` paths are refused.
    pub fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(path);
        if path.trim().is_empty() {
            anyhow::bail!("empty file path");
        }
        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => anyhow::bail!("path `{}` escapes the workspace", path),
            }
        }
        Ok(self.workspace.join(rel))
    }

    async fn apply(&self, request: &ActionRequest) -> anyhow::Result<String> {
        let Some(path) = request.path.as_deref() else {
            return self.compose(request).await;
        };
        let target = self.resolve(path)?;

        let existing = match request.kind {
            TaskKind::Modify => Some(
                tokio::fs::read_to_string(&target)
                    .await
                    .with_context(|| format!("failed to read {}", target.display()))?,
            ),
            _ => None,
        };

        let prompt = build_prompt(request, Some(path), existing.as_deref());
        let reply = self.client.generate(&prompt).await?;
        let body = strip_code_fence(&reply);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, ensure_trailing_newline(body))
            .await
            .with_context(|| format!("failed to write {}", target.display()))?;

        tracing::info!(task_id = %request.task_id, path, bytes = body.len(), "file written");
        Ok(format!("wrote {} ({} bytes)", path, body.len()))
    }

    /// Path-less generation: the reply becomes the task output.
    async fn compose(&self, request: &ActionRequest) -> anyhow::Result<String> {
        if request.kind == TaskKind::Modify {
            anyhow::bail!("modify task has no file path");
        }
        let reply = self.client.generate(&build_prompt(request, None, None)).await?;
        let body = strip_code_fence(&reply);
        tracing::info!(task_id = %request.task_id, bytes = body.len(), "content generated");
        Ok(body.to_string())
    }
}

#[async_trait]
impl ActionCapability for AiContentCapability {
    fn name(&self) -> &str {
        "aiservice-content"
    }

    async fn perform(&self, request: &ActionRequest) -> ActionResult {
        match self.apply(request).await {
            Ok(summary) => ActionResult::ok(summary),
            Err(e) => ActionResult::failure(format!("{e:#}")),
        }
    }
}

fn build_prompt(request: &ActionRequest, path: Option<&str>, existing: Option<&str>) -> String {
    let mut prompt = String::new();
    match (path, existing) {
        (_, Some(_)) => prompt.push_str("Rewrite the file below to accomplish the task.\n"),
        (Some(_), None) => prompt.push_str("Write the complete contents of a new file for the task.\n"),
        (None, None) => prompt.push_str("Produce the text the task asks for.\n"),
    }
    prompt.push_str("Reply with the content only, no commentary.\n\n");
    prompt.push_str(&format!("Task: {}\n", request.description));
    if let Some(path) = path {
        prompt.push_str(&format!("File: {path}\n"));
    }
    if !request.context_summary.trim().is_empty() {
        prompt.push('\n');
        prompt.push_str(request.context_summary.trim_end());
        prompt.push('\n');
    }
    if let Some(current) = existing {
        prompt.push_str("\nCurrent contents:\n");
        prompt.push_str(current);
        if !current.ends_with('\n') {
            prompt.push('\n');
        }
    }
    prompt
}

/// Drop a single surrounding ``` fence, language tag included.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    match body.find('\n') {
        Some(idx) => body[idx + 1..].trim_end_matches(['\n', '\r']),
        None => body.trim(),
    }
}

fn ensure_trailing_newline(body: &str) -> String {
    let mut out = body.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
