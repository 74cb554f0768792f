use anyhow::bail;
use clap::Subcommand;
use colored::*;
use shanyraq_catalog::{AppConfig, CatalogSettings, GatewayConfig};
use std::path::Path;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file
    Init {
        /// Supabase project URL
        #[arg(long)]
        url: String,
        /// Public anonymous key
        #[arg(long)]
        anon_key: String,
        /// Service key for back-office commands
        #[arg(long)]
        service_key: Option<String>,
        /// Default city for the catalog
        #[arg(long)]
        city: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the resolved configuration with keys masked
    Show,
}

pub async fn handle_config_command(
    command: ConfigCommands,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Init {
            url,
            anon_key,
            service_key,
            city,
            force,
        } => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(AppConfig::default_path);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }

            let mut gateway = GatewayConfig::with_credentials(url, anon_key);
            gateway.service_key = service_key;
            gateway.validate()?;
            let config = AppConfig {
                gateway,
                catalog: CatalogSettings { selected_city: city },
            };
            config.save_to(&path).await?;
            println!("{} {}", "✅ Config written to".green(), path.display());
        }
        ConfigCommands::Show => {
            let config = AppConfig::resolve(config_path).await?;
            println!("{:<14} {}", "Project URL:".cyan(), config.gateway.project_url);
            println!("{:<14} {}", "Anon key:".cyan(), mask(&config.gateway.anon_key));
            println!(
                "{:<14} {}",
                "Service key:".cyan(),
                config
                    .gateway
                    .service_key
                    .as_deref()
                    .map(mask)
                    .unwrap_or_else(|| "not set".dimmed().to_string())
            );
            println!("{:<14} {}s", "Timeout:".cyan(), config.gateway.timeout_secs);
            println!(
                "{:<14} {}",
                "City:".cyan(),
                config
                    .catalog
                    .selected_city
                    .as_deref()
                    .unwrap_or(shanyraq_catalog::ALL_CITIES)
            );
        }
    }
    Ok(())
}

/// Keep the first and last four characters of a key
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
