use std::sync::Arc;

use anyhow::Result;

use taskforge_core::api::{
    ActionCapability, AppConfig, GraphSynthesizer, OutputFormat, OutputRendererPlugin,
    ValidationCapability,
};

use crate::backend::AiServiceClient;
use crate::capability::{AiContentCapability, ShellCapability, UnavailableCapability};
use crate::executor::{JsonlRendererPlugin, TextRendererPlugin};
use crate::synthesis::AiServiceSynthesizer;

/// `None` when no AI service is configured.
pub fn build_client(cfg: &AppConfig) -> Result<Option<Arc<AiServiceClient>>> {
    if !cfg.synthesis.is_enabled() {
        return Ok(None);
    }
    Ok(Some(Arc::new(AiServiceClient::from_config(&cfg.synthesis)?)))
}

pub fn build_synthesizer(client: Option<&Arc<AiServiceClient>>) -> Option<Arc<dyn GraphSynthesizer>> {
    client.map(|c| Arc::new(AiServiceSynthesizer::new(c.clone())) as Arc<dyn GraphSynthesizer>)
}

pub fn build_content(
    cfg: &AppConfig,
    client: Option<&Arc<AiServiceClient>>,
) -> Arc<dyn ActionCapability> {
    match client {
        Some(c) => Arc::new(AiContentCapability::new(c.clone(), cfg.executor.workspace.clone())),
        None => Arc::new(UnavailableCapability::new(
            "content generation needs [synthesis] provider = \"aiservice\" and a url",
        )),
    }
}

pub fn build_shell(cfg: &AppConfig) -> Arc<ShellCapability> {
    Arc::new(ShellCapability::from_config(&cfg.executor))
}

pub fn build_renderer(cfg: &AppConfig) -> Arc<dyn OutputRendererPlugin> {
    match cfg.output.format {
        OutputFormat::Jsonl => Arc::new(JsonlRendererPlugin::new(false)),
        OutputFormat::Text => Arc::new(TextRendererPlugin::new(cfg.output.ascii_only)),
    }
}

/// Shell handles both commands and validation.
pub fn build_command_and_validator(
    cfg: &AppConfig,
) -> (Arc<dyn ActionCapability>, Arc<dyn ValidationCapability>) {
    let shell = build_shell(cfg);
    let command: Arc<dyn ActionCapability> = shell.clone();
    let validator: Arc<dyn ValidationCapability> = shell;
    (command, validator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_core::api::SynthesisProvider;

    #[test]
    fn no_url_means_no_client() {
        let cfg = AppConfig::default();
        assert!(build_client(&cfg).unwrap().is_none());
        assert!(build_synthesizer(None).is_none());
        assert_eq!(build_content(&cfg, None).name(), "unavailable");
    }

    #[test]
    fn configured_url_builds_ai_stack() {
        let mut cfg = AppConfig::default();
        cfg.synthesis.provider = SynthesisProvider::AiService;
        cfg.synthesis.url = "http://127.0.0.1:8080/generate".into();

        let client = build_client(&cfg).unwrap();
        assert!(client.is_some());
        assert_eq!(build_synthesizer(client.as_ref()).unwrap().name(), "aiservice");
        assert_eq!(build_content(&cfg, client.as_ref()).name(), "aiservice-content");
    }

    #[test]
    fn bad_url_is_an_error() {
        let mut cfg = AppConfig::default();
        cfg.synthesis.provider = SynthesisProvider::AiService;
        cfg.synthesis.url = "localhost:8080".into();
        assert!(build_client(&cfg).is_err());
    }

    #[test]
    fn renderer_follows_output_format() {
        let mut cfg = AppConfig::default();
        assert_eq!(build_renderer(&cfg).format(), "text");
        cfg.output.format = OutputFormat::Jsonl;
        assert_eq!(build_renderer(&cfg).format(), "jsonl");
    }
}
