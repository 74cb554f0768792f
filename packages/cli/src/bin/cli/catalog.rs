use anyhow::anyhow;
use clap::Subcommand;
use colored::*;
use shanyraq_catalog::{
    format_beneficiary, BeneficiaryFeed, BeneficiaryQueryService, BeneficiaryView, CatalogFilter,
};
use shanyraq_cli::output::{
    collection_status_colored, format_amount, print_json, progress_bar, table, truncate,
};

use super::Context;

#[derive(Debug, Subcommand)]
pub enum CatalogCommands {
    /// List active beneficiaries, newest first
    List {
        /// Category code, or "all"
        #[arg(long)]
        category: Option<String>,
        /// City name, or "all" / "Все города" for the whole country
        #[arg(long)]
        city: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one beneficiary
    Show {
        /// Beneficiary ID
        id: String,
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_catalog_command(command: CatalogCommands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        CatalogCommands::List { category, city, json } => {
            list_beneficiaries(ctx, category.as_deref(), city.as_deref(), json).await
        }
        CatalogCommands::Show { id, json } => show_beneficiary(ctx, &id, json).await,
    }
}

async fn list_beneficiaries(
    ctx: &Context,
    category: Option<&str>,
    city: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let filter = CatalogFilter::from_selection(category, ctx.city(city))?;
    let feed = BeneficiaryFeed::new(BeneficiaryQueryService::new(ctx.gateway.clone()));
    feed.set_filter(filter.clone()).await;

    let snapshot = feed.snapshot();
    if let Some(error) = snapshot.error {
        return Err(anyhow!(error));
    }
    let views = snapshot.data;

    if json {
        return print_json(&views);
    }

    if views.is_empty() {
        println!("{}", "No beneficiaries found".yellow());
        return Ok(());
    }

    let heading = match filter.city.city() {
        Some(city) => format!("Подопечные · {}", city),
        None => "Подопечные · Все города".to_string(),
    };
    println!("{}", heading.blue().bold());
    println!();

    let mut listing = table(&["ID", "Название", "Категория", "Фонд", "Собрано", "Прогресс", ""]);
    for view in &views {
        listing.add_row(vec![
            view.id.clone(),
            truncate(&view.title, 32),
            view.category_name.clone(),
            view.partner_fund.clone().unwrap_or_else(|| "—".to_string()),
            format!("{} / {}", format_amount(view.raised), format_amount(view.target)),
            progress_bar(view.progress_percent()),
            if view.is_urgent { "Срочно".to_string() } else { String::new() },
        ]);
    }
    println!("{}", listing);
    println!("Total: {} beneficiaries", views.len().to_string().cyan());
    Ok(())
}

async fn show_beneficiary(ctx: &Context, id: &str, json: bool) -> anyhow::Result<()> {
    let service = BeneficiaryQueryService::new(ctx.gateway.clone());
    let view = format_beneficiary(&service.fetch_beneficiary(id).await?);

    if json {
        return print_json(&view);
    }
    print_beneficiary(&view);
    Ok(())
}

pub fn print_beneficiary(view: &BeneficiaryView) {
    println!("{}", view.title.blue().bold());
    println!();
    println!("{:<15} {}", "ID:".cyan(), view.id);
    println!("{:<15} {}", "Категория:".cyan(), view.category_name);
    if let Some(fund) = &view.partner_fund {
        println!("{:<15} {}", "Фонд:".cyan(), fund);
    }
    println!("{:<15} {}", "Статус:".cyan(), collection_status_colored(view.collection_status));
    println!(
        "{:<15} {} / {}",
        "Собрано:".cyan(),
        format_amount(view.raised),
        format_amount(view.target)
    );
    println!("{:<15} {}", "Прогресс:".cyan(), progress_bar(view.progress_percent()));
    if let Some(helpers) = &view.helpers_count {
        println!("{:<15} {}", "Помогли:".cyan(), helpers);
    }
    if let Some(link) = &view.documents_link {
        println!("{:<15} {}", "Документы:".cyan(), link);
    }
    if !view.description.trim().is_empty() {
        println!();
        println!("{}", view.description);
    }
    if !view.images.is_empty() {
        println!();
        println!("{}", "Фото:".cyan());
        for image in &view.images {
            println!("  {}", image);
        }
    }
    if !view.videos.is_empty() {
        println!("{}", "Видео:".cyan());
        for video in &view.videos {
            println!("  {}", video);
        }
    }
}
