use anyhow::Context as _;
use clap::Args;
use colored::*;
use shanyraq_catalog::import::import_legacy;
use std::path::PathBuf;

use super::Context;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Exported partner funds JSON
    #[arg(long)]
    pub funds: PathBuf,
    /// Exported beneficiaries JSON
    #[arg(long)]
    pub beneficiaries: PathBuf,
}

pub async fn handle_import(args: ImportArgs, ctx: &Context) -> anyhow::Result<()> {
    let funds = tokio::fs::read_to_string(&args.funds)
        .await
        .with_context(|| format!("Failed to read {}", args.funds.display()))?;
    let beneficiaries = tokio::fs::read_to_string(&args.beneficiaries)
        .await
        .with_context(|| format!("Failed to read {}", args.beneficiaries.display()))?;

    println!("{}", "🔄 Importing legacy data...".blue().bold());
    let summary = import_legacy(ctx.gateway.as_ref(), &funds, &beneficiaries).await?;

    println!();
    println!("{:<10} {}", "Inserted:".cyan(), summary.inserted.to_string().green());
    println!("{:<10} {}", "Skipped:".cyan(), summary.skipped);
    if summary.failed > 0 {
        println!("{:<10} {}", "Failed:".cyan(), summary.failed.to_string().red());
        println!("{}", "See the log output above for the failed rows".dimmed());
    }
    Ok(())
}
