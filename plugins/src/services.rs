//! `ServicesFactory` implementation: builds every capability from config for the CLI.
use async_trait::async_trait;
use taskforge_core::api::{AppConfig, Services, ServicesFactory};

use crate::factory;

pub struct PluginServicesFactory;

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services> {
        let client = factory::build_client(cfg)?;
        let synthesizer = factory::build_synthesizer(client.as_ref());
        let content = factory::build_content(cfg, client.as_ref());
        let (command, validator) = factory::build_command_and_validator(cfg);
        let renderer = Some(factory::build_renderer(cfg));

        tracing::debug!(
            synthesis = synthesizer.as_ref().map(|s| s.name().to_string()),
            content = content.name(),
            "services built"
        );
        Ok(Services {
            content,
            command,
            validator,
            synthesizer,
            renderer,
        })
    }
}
