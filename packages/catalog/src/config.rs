use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};

/// Default HTTP timeout for gateway calls, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the hosted data gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Supabase project URL
    pub project_url: String,

    /// Public anonymous key, sent as `apikey` on every request
    pub anon_key: String,

    /// Service key used as the bearer token for back-office writes
    #[serde(default)]
    pub service_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            project_url: String::new(),
            anon_key: String::new(),
            service_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    pub fn with_credentials(project_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            project_url: project_url.into(),
            anon_key: anon_key.into(),
            ..Self::default()
        }
    }

    /// Base URL of the REST endpoint, without a trailing slash
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.project_url.trim_end_matches('/'))
    }

    /// Validate configuration
    pub fn validate(&self) -> CatalogResult<()> {
        if self.project_url.is_empty() {
            return Err(CatalogError::config("Project URL is required"));
        }
        if self.anon_key.is_empty() {
            return Err(CatalogError::config("Anonymous key is required"));
        }
        if !self.project_url.starts_with("https://") && !is_local_url(&self.project_url) {
            return Err(CatalogError::config("Project URL must use HTTPS"));
        }
        if self.timeout_secs == 0 {
            return Err(CatalogError::config("Timeout must be at least one second"));
        }
        Ok(())
    }
}

fn is_local_url(url: &str) -> bool {
    ["http://localhost", "http://127.0.0.1"]
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Viewer-facing catalog settings.
///
/// The selected city lives here rather than in any ambient store so the
/// query services receive it explicitly; persisting the choice is up to the
/// caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub selected_city: Option<String>,
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl AppConfig {
    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shanyraq")
            .join("config.toml")
    }

    /// Load configuration from a TOML file
    pub async fn load_from(path: &Path) -> CatalogResult<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            CatalogError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub async fn save_to(&self, path: &Path) -> CatalogResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                CatalogError::config(format!("Failed to create config dir: {}", e))
            })?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| CatalogError::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Build configuration from `SHANYRAQ_*` environment variables
    pub fn from_env() -> CatalogResult<Self> {
        let project_url = env::var("SHANYRAQ_SUPABASE_URL")
            .map_err(|_| CatalogError::config("SHANYRAQ_SUPABASE_URL not found in environment"))?;
        let anon_key = env::var("SHANYRAQ_SUPABASE_ANON_KEY").map_err(|_| {
            CatalogError::config("SHANYRAQ_SUPABASE_ANON_KEY not found in environment")
        })?;

        let timeout_secs = match env::var("SHANYRAQ_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                CatalogError::config(format!("Invalid SHANYRAQ_HTTP_TIMEOUT_SECS: {}", raw))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            gateway: GatewayConfig {
                project_url,
                anon_key,
                service_key: non_empty_var("SHANYRAQ_SUPABASE_SERVICE_KEY"),
                timeout_secs,
            },
            catalog: CatalogSettings {
                selected_city: non_empty_var("SHANYRAQ_CITY"),
            },
        };
        config.gateway.validate()?;
        Ok(config)
    }

    /// Load from an explicit file if given, else the environment, else the
    /// default config file.
    pub async fn resolve(path: Option<&Path>) -> CatalogResult<Self> {
        if let Some(path) = path {
            let config = Self::load_from(path).await?;
            config.gateway.validate()?;
            return Ok(config);
        }
        match Self::from_env() {
            Ok(config) => Ok(config),
            Err(env_err) => {
                let default_path = Self::default_path();
                if !default_path.exists() {
                    return Err(env_err);
                }
                let config = Self::load_from(&default_path).await?;
                config.gateway.validate()?;
                Ok(config)
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
