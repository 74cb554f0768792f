pub mod admin;
pub mod catalog;
pub mod config;
pub mod donate;
pub mod donations;
pub mod funds;
pub mod import;
pub mod reports;

use anyhow::bail;
use shanyraq_catalog::{AppConfig, DataGateway};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Resolved configuration plus a connected gateway
pub struct Context {
    pub config: AppConfig,
    pub gateway: Arc<dyn DataGateway>,
}

impl Context {
    pub async fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = AppConfig::resolve(config_path).await?;
        let gateway = shanyraq_catalog::connect(&config.gateway)?;
        debug!(url = %config.gateway.project_url, "Connected gateway");
        Ok(Self { config, gateway })
    }

    pub fn require_service_key(&self) -> anyhow::Result<()> {
        if self.config.gateway.service_key.is_none() {
            bail!("This command needs the service key (set SHANYRAQ_SUPABASE_SERVICE_KEY or service_key in the config file)");
        }
        Ok(())
    }

    /// City from the command line, else the configured one
    pub fn city<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit.or(self.config.catalog.selected_city.as_deref())
    }
}
