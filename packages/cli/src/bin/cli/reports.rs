use clap::Subcommand;
use colored::*;
use shanyraq_catalog::{format_report, BeneficiaryQueryService, ReportView};
use shanyraq_cli::output::{format_amount, format_date, print_json, table, truncate};

use super::Context;

#[derive(Debug, Subcommand)]
pub enum ReportsCommands {
    /// List published reports, most recently completed first
    List {
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_reports_command(command: ReportsCommands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        ReportsCommands::List { json } => {
            let records = BeneficiaryQueryService::new(ctx.gateway.clone())
                .fetch_reports()
                .await?;
            let reports: Vec<ReportView> = records.iter().map(format_report).collect();

            if json {
                return print_json(&reports);
            }
            if reports.is_empty() {
                println!("{}", "No reports published yet".yellow());
                return Ok(());
            }

            let mut listing = table(&["Название", "Категория", "Собрано", "Завершён", "Фото"]);
            for report in &reports {
                listing.add_row(vec![
                    truncate(&report.title, 36),
                    report.category_name.clone(),
                    format_amount(report.amount),
                    format_date(report.completed_date.as_ref()),
                    report.report_photos.len().to_string(),
                ]);
            }
            println!("{}", listing);
            println!("Total: {} reports", reports.len().to_string().cyan());
            Ok(())
        }
    }
}
