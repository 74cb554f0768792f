use clap::{Args, ValueEnum};
use colored::*;
use shanyraq_catalog::services::{format_phone, DonationRequest, DonationService, PaymentMethod};
use shanyraq_catalog::BeneficiaryQueryService;
use shanyraq_cli::output::format_amount;

use super::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Kaspi,
    Card,
}

impl From<MethodArg> for PaymentMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Kaspi => PaymentMethod::Kaspi,
            MethodArg::Card => PaymentMethod::Card,
        }
    }
}

#[derive(Debug, Args)]
pub struct DonateArgs {
    /// Beneficiary ID
    pub beneficiary_id: String,
    /// Amount in tenge
    #[arg(long)]
    pub amount: i64,
    /// Donor phone number; any formatting is accepted
    #[arg(long)]
    pub phone: String,
    #[arg(long, value_enum, default_value = "kaspi")]
    pub method: MethodArg,
}

pub async fn handle_donate(args: DonateArgs, ctx: &Context) -> anyhow::Result<()> {
    let beneficiary = BeneficiaryQueryService::new(ctx.gateway.clone())
        .fetch_beneficiary(&args.beneficiary_id)
        .await?;

    let request = DonationService::new(ctx.gateway.clone())
        .submit(DonationRequest {
            beneficiary_id: beneficiary.id.clone(),
            beneficiary_title: beneficiary.title.clone(),
            amount: args.amount,
            phone: args.phone,
            method: args.method.into(),
        })
        .await?;

    println!("{}", "✅ Payment request created".green());
    println!("{:<12} {}", "Request:".cyan(), request.id);
    println!("{:<12} {}", "For:".cyan(), request.beneficiary_title);
    println!("{:<12} {}", "Amount:".cyan(), format_amount(request.amount));
    println!("{:<12} {}", "Phone:".cyan(), format_phone(&request.phone));
    println!();
    println!("{}", "An invoice will be sent to this number".dimmed());
    Ok(())
}
