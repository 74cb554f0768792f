use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;

mod cli;

use cli::admin::AdminCommands;
use cli::catalog::CatalogCommands;
use cli::config::ConfigCommands;
use cli::donate::DonateArgs;
use cli::donations::DonationsArgs;
use cli::funds::FundsCommands;
use cli::import::ImportArgs;
use cli::reports::ReportsCommands;
use cli::Context;

#[derive(Parser)]
#[command(name = "shanyraq")]
#[command(about = "Shanyraq CLI - charity catalog, donations and back-office")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the environment and the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the public catalog
    #[command(subcommand)]
    Catalog(CatalogCommands),
    /// Browse partner funds
    #[command(subcommand)]
    Funds(FundsCommands),
    /// Browse published reports
    #[command(subcommand)]
    Reports(ReportsCommands),
    /// Create a payment request for a beneficiary
    Donate(DonateArgs),
    /// Paid donation history for a phone number
    Donations(DonationsArgs),
    /// Back-office operations (requires the service key)
    #[command(subcommand)]
    Admin(AdminCommands),
    /// Import the legacy JSON export
    Import(ImportArgs),
    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    shanyraq_cli::logging::init(cli.verbose);

    match handle_command(cli).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn handle_command(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Config(command) => cli::config::handle_config_command(command, config_path).await,
        Commands::Catalog(command) => {
            let ctx = Context::load(config_path).await?;
            cli::catalog::handle_catalog_command(command, &ctx).await
        }
        Commands::Funds(command) => {
            let ctx = Context::load(config_path).await?;
            cli::funds::handle_funds_command(command, &ctx).await
        }
        Commands::Reports(command) => {
            let ctx = Context::load(config_path).await?;
            cli::reports::handle_reports_command(command, &ctx).await
        }
        Commands::Donate(args) => {
            let ctx = Context::load(config_path).await?;
            cli::donate::handle_donate(args, &ctx).await
        }
        Commands::Donations(args) => {
            let ctx = Context::load(config_path).await?;
            cli::donations::handle_donations(args, &ctx).await
        }
        Commands::Admin(command) => {
            let ctx = Context::load(config_path).await?;
            ctx.require_service_key()?;
            cli::admin::handle_admin_command(command, &ctx).await
        }
        Commands::Import(args) => {
            let ctx = Context::load(config_path).await?;
            ctx.require_service_key()?;
            cli::import::handle_import(args, &ctx).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::admin::{BeneficiaryCommands, RequestCommands};
    use crate::cli::donate::MethodArg;
    use shanyraq_catalog::{Category, PaymentStatus};

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_catalog_list_arguments() {
        let cli = Cli::try_parse_from([
            "shanyraq", "catalog", "list", "--category", "urgent", "--city", "Алматы", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Catalog(CatalogCommands::List { category, city, json }) => {
                assert_eq!(category.as_deref(), Some("urgent"));
                assert_eq!(city.as_deref(), Some("Алматы"));
                assert!(json);
            }
            _ => panic!("expected catalog list"),
        }
    }

    #[test]
    fn test_payment_status_is_parsed() {
        let cli = Cli::try_parse_from([
            "shanyraq", "admin", "requests", "set-status", "p-1", "invoice_sent",
        ])
        .unwrap();
        match cli.command {
            Commands::Admin(AdminCommands::Requests(RequestCommands::SetStatus { id, status })) => {
                assert_eq!(id, "p-1");
                assert_eq!(status, PaymentStatus::InvoiceSent);
            }
            _ => panic!("expected set-status"),
        }

        assert!(Cli::try_parse_from([
            "shanyraq", "admin", "requests", "set-status", "p-1", "refunded",
        ])
        .is_err());
    }

    #[test]
    fn test_beneficiary_create_arguments() {
        let cli = Cli::try_parse_from([
            "shanyraq",
            "--config",
            "/tmp/shanyraq.toml",
            "admin",
            "beneficiaries",
            "create",
            "--title",
            "Корм для приюта",
            "--category",
            "animals",
            "--target",
            "200000",
            "--urgent",
            "true",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/shanyraq.toml")));
        match cli.command {
            Commands::Admin(AdminCommands::Beneficiaries(BeneficiaryCommands::Create(fields))) => {
                assert_eq!(fields.title.as_deref(), Some("Корм для приюта"));
                assert_eq!(fields.category, Some(Category::Animals));
                assert_eq!(fields.target, Some(200_000));
                assert_eq!(fields.urgent, Some(true));
            }
            _ => panic!("expected beneficiary create"),
        }
    }

    #[test]
    fn test_donations_requires_phone() {
        let cli =
            Cli::try_parse_from(["shanyraq", "donations", "--phone", "87012345678", "--json"])
                .unwrap();
        match cli.command {
            Commands::Donations(args) => {
                assert_eq!(args.phone, "87012345678");
                assert!(args.json);
            }
            _ => panic!("expected donations"),
        }

        assert!(Cli::try_parse_from(["shanyraq", "donations"]).is_err());
    }

    #[test]
    fn test_donate_defaults_to_kaspi() {
        let cli = Cli::try_parse_from([
            "shanyraq", "donate", "b-1", "--amount", "2000", "--phone", "87012345678",
        ])
        .unwrap();
        match cli.command {
            Commands::Donate(args) => {
                assert_eq!(args.amount, 2000);
                assert_eq!(args.method, MethodArg::Kaspi);
            }
            _ => panic!("expected donate"),
        }
    }
}
