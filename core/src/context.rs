use std::sync::Arc;

use crate::config::AppConfig;
use crate::executor::{ActionCapability, OutputRendererPlugin, ValidationCapability};
use crate::planner::GraphSynthesizer;

/// Capabilities the orchestrator dispatches to.
#[derive(Clone)]
pub struct Services {
    /// Handles `generate` and `modify` tasks.
    pub content: Arc<dyn ActionCapability>,
    /// Handles `command` tasks.
    pub command: Arc<dyn ActionCapability>,
    pub validator: Arc<dyn ValidationCapability>,
    pub synthesizer: Option<Arc<dyn GraphSynthesizer>>,
    pub renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn with_config(&self, cfg: AppConfig) -> Self {
        Self {
            cfg,
            services_factory: self.services_factory.clone(),
        }
    }

    pub async fn build_services(&self) -> anyhow::Result<Services> {
        let Some(factory) = self.services_factory.as_ref() else {
            anyhow::bail!("services_factory missing (cannot build capabilities)");
        };
        factory.build_services(&self.cfg).await
    }
}
