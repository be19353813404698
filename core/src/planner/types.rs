use serde::{Deserialize, Serialize};

/// Inbound planning request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_hint: Option<String>,
    #[serde(default)]
    pub known_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_file: Option<String>,
}

impl PlanRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_project_hint(mut self, hint: impl Into<String>) -> Self {
        self.project_hint = Some(hint.into());
        self
    }

    pub fn with_known_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_active_file(mut self, path: impl Into<String>) -> Self {
        self.active_file = Some(path.into());
        self
    }

    pub fn is_known_file(&self, path: &str) -> bool {
        self.known_files.iter().any(|f| f == path)
    }

    /// Short project description handed to capabilities and synthesis.
    pub fn context_summary(&self) -> String {
        let mut out = String::new();
        if let Some(hint) = self.project_hint.as_deref().filter(|h| !h.trim().is_empty()) {
            out.push_str("Project: ");
            out.push_str(hint.trim());
            out.push('\n');
        }
        if let Some(active) = self.active_file.as_deref() {
            out.push_str("Active file: ");
            out.push_str(active);
            out.push('\n');
        }
        if !self.known_files.is_empty() {
            const MAX_LISTED: usize = 50;
            out.push_str("Known files:\n");
            for file in self.known_files.iter().take(MAX_LISTED) {
                out.push_str("- ");
                out.push_str(file);
                out.push('\n');
            }
            if self.known_files.len() > MAX_LISTED {
                out.push_str(&format!(
                    "- ... {} more\n",
                    self.known_files.len() - MAX_LISTED
                ));
            }
        }
        out
    }
}

/// Outbound request to a graph-synthesis capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub query: String,
    pub project_context: String,
}

impl From<&PlanRequest> for SynthesisRequest {
    fn from(request: &PlanRequest) -> Self {
        Self {
            query: request.query.clone(),
            project_context: request.context_summary(),
        }
    }
}

/// One entry recovered from synthesis output, before ids are rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedTask {
    pub id: Option<String>,
    pub description: String,
    pub kind: Option<String>,
    pub dependencies: Vec<String>,
    pub file_path: Option<String>,
    pub command: Option<String>,
    pub validation_command: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_summary_lists_hint_and_files() {
        let req = PlanRequest::new("add tests")
            .with_project_hint("rust")
            .with_active_file("src/lib.rs")
            .with_known_files(["Cargo.toml", "src/lib.rs"]);
        let summary = req.context_summary();
        assert!(summary.starts_with("Project: rust\n"));
        assert!(summary.contains("Active file: src/lib.rs"));
        assert!(summary.contains("- Cargo.toml\n"));
    }

    #[test]
    fn empty_request_has_empty_summary() {
        assert_eq!(PlanRequest::new("x").context_summary(), "");
    }
}
