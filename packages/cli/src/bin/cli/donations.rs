use clap::Args;
use colored::*;
use shanyraq_catalog::services::{format_phone, DonationHistory, DonorService};
use shanyraq_cli::output::{format_amount, format_date, print_json, table, truncate};

use super::Context;

#[derive(Debug, Args)]
pub struct DonationsArgs {
    /// Phone number the donations were made from
    #[arg(long)]
    pub phone: String,
    /// Print JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_donations(args: DonationsArgs, ctx: &Context) -> anyhow::Result<()> {
    let history = DonorService::new(ctx.gateway.clone())
        .donation_history(&args.phone)
        .await?;

    if args.json {
        return print_json(&history);
    }
    print_history(&history);
    Ok(())
}

fn print_history(history: &DonationHistory) {
    if !history.is_activated() {
        println!("{}", "No paid donations yet for this number".yellow());
        return;
    }

    println!("{}", format_phone(&history.phone).blue().bold());
    println!(
        "{:<12} {}",
        "Donated:".cyan(),
        format_amount(history.total).green().bold()
    );
    println!("{:<12} {}", "Donations:".cyan(), history.donations.len());

    for group in &history.by_category {
        println!();
        println!(
            "{} · {}",
            group.category_name.bold(),
            format_amount(group.total())
        );
        let mut listing = table(&["Дата", "Подопечный", "Сумма"]);
        for donation in &group.donations {
            listing.add_row(vec![
                format_date(donation.date.as_ref()),
                truncate(&donation.name, 40),
                format_amount(donation.amount),
            ]);
        }
        println!("{}", listing);
    }
}
