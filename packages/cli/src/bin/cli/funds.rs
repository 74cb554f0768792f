use anyhow::anyhow;
use clap::Subcommand;
use colored::*;
use shanyraq_catalog::{BeneficiaryQueryService, PartnerFundFeed, PartnerFundQueryService};
use shanyraq_cli::output::{format_amount, format_date, print_json, table, truncate};

use super::Context;

#[derive(Debug, Subcommand)]
pub enum FundsCommands {
    /// List partner funds, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a fund and its active beneficiaries
    Show {
        /// Fund name
        name: String,
    },
}

pub async fn handle_funds_command(command: FundsCommands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        FundsCommands::List { json } => list_funds(ctx, json).await,
        FundsCommands::Show { name } => show_fund(ctx, &name).await,
    }
}

async fn list_funds(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let feed = PartnerFundFeed::new(PartnerFundQueryService::new(ctx.gateway.clone()));
    feed.mount().await;
    let snapshot = feed.snapshot();
    if let Some(error) = snapshot.error {
        return Err(anyhow!(error));
    }
    let funds = snapshot.data;

    if json {
        return print_json(&funds);
    }
    if funds.is_empty() {
        println!("{}", "No partner funds found".yellow());
        return Ok(());
    }

    let mut listing = table(&["Фонд", "Проверен", "Описание", "Добавлен"]);
    for fund in &funds {
        listing.add_row(vec![
            fund.name.clone(),
            if fund.is_verified { "✓".to_string() } else { String::new() },
            truncate(fund.description.as_deref().unwrap_or(""), 40),
            format_date(fund.created_at.as_ref()),
        ]);
    }
    println!("{}", listing);
    println!("Total: {} funds", funds.len().to_string().cyan());
    Ok(())
}

async fn show_fund(ctx: &Context, name: &str) -> anyhow::Result<()> {
    let fund = PartnerFundQueryService::new(ctx.gateway.clone())
        .fetch_partner_fund(name)
        .await?;
    let beneficiaries = BeneficiaryQueryService::new(ctx.gateway.clone())
        .fetch_by_partner_fund(&fund.name)
        .await?;

    let title = if fund.is_verified {
        format!("{} ✓", fund.name)
    } else {
        fund.name.clone()
    };
    println!("{}", title.blue().bold());
    if let Some(description) = &fund.description {
        println!("{}", description);
    }
    if let Some(logo) = &fund.logo_url {
        println!("{:<10} {}", "Логотип:".cyan(), logo);
    }
    println!();

    if beneficiaries.is_empty() {
        println!("{}", "No active beneficiaries".yellow());
        return Ok(());
    }

    let mut listing = table(&["ID", "Название", "Собрано", "Цель"]);
    for beneficiary in &beneficiaries {
        listing.add_row(vec![
            beneficiary.id.clone(),
            truncate(&beneficiary.title, 36),
            format_amount(beneficiary.raised_amount.unwrap_or(0)),
            format_amount(beneficiary.target_amount.unwrap_or(0)),
        ]);
    }
    println!("{}", listing);
    Ok(())
}
