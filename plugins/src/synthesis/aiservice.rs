use std::sync::Arc;

use async_trait::async_trait;
use taskforge_core::api::{GraphSynthesizer, SynthesisRequest};

use crate::backend::AiServiceClient;

const TASK_SCHEMA: &str = r#"[
  {
    "id": "1",
    "description": "what this step does",
    "type": "generate | modify | command",
    "dependencies": ["ids of steps that must finish first"],
    "filePath": "relative/path for generate and modify steps",
    "command": "shell command for command steps",
    "validationCommand": "optional shell command that exits 0 when the step worked"
  }
]"#;

/// Asks an AI service to decompose a request into a JSON task array.
pub struct AiServiceSynthesizer {
    client: Arc<AiServiceClient>,
}

impl AiServiceSynthesizer {
    pub fn new(client: Arc<AiServiceClient>) -> Self {
        Self { client }
    }
}

pub fn build_synthesis_prompt(request: &SynthesisRequest) -> String {
    let mut prompt = String::from(
        "Break the engineering request below into small, ordered steps.\n\
         Reply with a JSON array only, using this shape:\n",
    );
    prompt.push_str(TASK_SCHEMA);
    prompt.push_str(
        "\n\nRules:\n\
         - every step needs a non-empty description\n\
         - dependencies may only name ids from the same array\n\
         - file paths are relative to the project root\n",
    );
    if !request.project_context.trim().is_empty() {
        prompt.push_str("\nProject context:\n");
        prompt.push_str(request.project_context.trim_end());
        prompt.push('\n');
    }
    prompt.push_str("\nRequest:\n");
    prompt.push_str(request.query.trim());
    prompt.push('\n');
    prompt
}

#[async_trait]
impl GraphSynthesizer for AiServiceSynthesizer {
    fn name(&self) -> &str {
        "aiservice"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> anyhow::Result<String> {
        let prompt = build_synthesis_prompt(request);
        tracing::debug!(url = %self.client.url(), "requesting task decomposition");
        self.client.generate(&prompt).await
    }
}
