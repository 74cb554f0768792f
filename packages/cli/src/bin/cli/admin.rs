use clap::{Args, Subcommand};
use colored::*;
use inquire::Confirm;
use shanyraq_catalog::services::{
    format_phone, parse_url_list, AdminService, BeneficiaryInput, ReportInput,
};
use shanyraq_catalog::{Beneficiary, Category, CollectionStatus, PaymentStatus};
use shanyraq_cli::output::{
    collection_status_colored, format_amount, format_datetime, payment_status_colored, table,
    truncate,
};

use super::Context;

#[derive(Debug, Subcommand)]
pub enum AdminCommands {
    /// Kaspi payment requests
    #[command(subcommand)]
    Requests(RequestCommands),
    /// Beneficiary records
    #[command(subcommand)]
    Beneficiaries(BeneficiaryCommands),
}

#[derive(Debug, Subcommand)]
pub enum RequestCommands {
    /// List payment requests, newest first
    List {
        /// new, invoice_sent, paid or unpaid
        #[arg(long)]
        status: Option<PaymentStatus>,
    },
    /// Number of requests in each status
    Counts,
    /// Move a request to its next status
    SetStatus {
        /// Payment request ID
        id: String,
        /// invoice_sent, paid or unpaid
        status: PaymentStatus,
    },
}

#[derive(Debug, Subcommand)]
pub enum BeneficiaryCommands {
    /// List all beneficiaries, including hidden ones
    List {
        /// active, completed or reported
        #[arg(long)]
        status: Option<CollectionStatus>,
    },
    /// Create a beneficiary
    Create(BeneficiaryFields),
    /// Edit a beneficiary; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: BeneficiaryFields,
    },
    /// Delete a beneficiary
    Delete {
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Close the collection without a report
    Complete { id: String },
    /// Publish the collection report
    Report {
        id: String,
        /// What the money was spent on
        #[arg(long)]
        description: String,
        /// Report photo URLs, one per line
        #[arg(long, default_value = "")]
        photos: String,
        /// Report video URLs, one per line
        #[arg(long, default_value = "")]
        videos: String,
    },
}

/// Form fields; list fields take newline-separated URLs
#[derive(Debug, Args)]
pub struct BeneficiaryFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub fund: Option<String>,
    /// Target amount in tenge
    #[arg(long)]
    pub target: Option<i64>,
    /// Raised amount in tenge
    #[arg(long)]
    pub raised: Option<i64>,
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long)]
    pub images: Option<String>,
    #[arg(long)]
    pub videos: Option<String>,
    #[arg(long)]
    pub helpers: Option<String>,
    #[arg(long)]
    pub documents: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
    #[arg(long)]
    pub urgent: Option<bool>,
    #[arg(long)]
    pub nationwide: Option<bool>,
}

impl BeneficiaryFields {
    pub fn apply(self, input: &mut BeneficiaryInput) {
        if let Some(title) = self.title {
            input.title = title;
        }
        if let Some(description) = self.description {
            input.description = description;
        }
        if let Some(category) = self.category {
            input.set_category(category);
        }
        if let Some(city) = self.city {
            input.city = city;
        }
        if let Some(fund) = self.fund {
            input.partner_fund = fund;
        }
        if let Some(target) = self.target {
            input.target_amount = target;
        }
        if let Some(raised) = self.raised {
            input.raised_amount = raised;
        }
        if let Some(image) = self.image {
            input.image_url = image;
        }
        if let Some(images) = self.images {
            input.images = parse_url_list(&images);
        }
        if let Some(videos) = self.videos {
            input.videos = parse_url_list(&videos);
        }
        if let Some(helpers) = self.helpers {
            input.helpers_count = Some(helpers).filter(|h| !h.trim().is_empty());
        }
        if let Some(documents) = self.documents {
            input.documents_link = Some(documents).filter(|d| !d.trim().is_empty());
        }
        if let Some(active) = self.active {
            input.is_active = active;
        }
        if let Some(urgent) = self.urgent {
            input.is_urgent = urgent;
        }
        if let Some(nationwide) = self.nationwide {
            input.is_nationwide = nationwide;
        }
    }
}

pub async fn handle_admin_command(command: AdminCommands, ctx: &Context) -> anyhow::Result<()> {
    let admin = AdminService::new(ctx.gateway.clone());
    match command {
        AdminCommands::Requests(command) => handle_requests(&admin, command).await,
        AdminCommands::Beneficiaries(command) => handle_beneficiaries(&admin, command).await,
    }
}

async fn handle_requests(admin: &AdminService, command: RequestCommands) -> anyhow::Result<()> {
    match command {
        RequestCommands::List { status } => {
            let requests = admin.list_payment_requests(status).await?;
            if requests.is_empty() {
                println!("{}", "No payment requests".yellow());
                return Ok(());
            }

            let mut listing = table(&["ID", "Создана", "Подопечный", "Телефон", "Сумма", "Статус"]);
            for request in &requests {
                listing.add_row(vec![
                    request.id.clone(),
                    format_datetime(request.created_at.as_ref()),
                    truncate(&request.beneficiary_title, 30),
                    format_phone(&request.phone),
                    format_amount(request.amount),
                    payment_status_colored(request.status).to_string(),
                ]);
            }
            println!("{}", listing);
            println!("Total: {} requests", requests.len().to_string().cyan());
        }
        RequestCommands::Counts => {
            for (status, count) in admin.status_counts().await? {
                println!("{:<14} {}", payment_status_colored(status), count.to_string().bold());
            }
        }
        RequestCommands::SetStatus { id, status } => {
            let updated = admin.update_payment_status(&id, status).await?;
            println!(
                "{} {} → {}",
                "✅ Request".green(),
                updated.id,
                payment_status_colored(updated.status)
            );
        }
    }
    Ok(())
}

async fn handle_beneficiaries(
    admin: &AdminService,
    command: BeneficiaryCommands,
) -> anyhow::Result<()> {
    match command {
        BeneficiaryCommands::List { status } => {
            let records = admin.list_beneficiaries(status).await?;
            if records.is_empty() {
                println!("{}", "No beneficiaries".yellow());
                return Ok(());
            }

            let mut listing = table(&["ID", "Название", "Город", "Собрано", "Видим", "Статус"]);
            for record in &records {
                listing.add_row(vec![
                    record.id.clone(),
                    truncate(&record.title, 30),
                    city_label(record),
                    format!(
                        "{} / {}",
                        format_amount(record.raised_amount.unwrap_or(0)),
                        format_amount(record.target_amount.unwrap_or(0))
                    ),
                    if record.is_active { "да" } else { "нет" }.to_string(),
                    collection_status_colored(record.status()).to_string(),
                ]);
            }
            println!("{}", listing);
            println!("Total: {} beneficiaries", records.len().to_string().cyan());
        }
        BeneficiaryCommands::Create(fields) => {
            let mut input = BeneficiaryInput::new(String::new());
            fields.apply(&mut input);
            let created = admin.create_beneficiary(&input).await?;
            println!("{}", format!("✅ Beneficiary '{}' created", created.title).green());
            println!("ID: {}", created.id.cyan());
        }
        BeneficiaryCommands::Update { id, fields } => {
            let current = admin.load_beneficiary(&id).await?;
            let mut input = BeneficiaryInput::from_beneficiary(&current);
            fields.apply(&mut input);
            let updated = admin.update_beneficiary(&id, &input).await?;
            println!("{}", format!("✅ Beneficiary '{}' updated", updated.title).green());
        }
        BeneficiaryCommands::Delete { id, yes } => {
            let current = admin.load_beneficiary(&id).await?;
            let confirmed = yes
                || Confirm::new(&format!("Delete '{}'?", current.title))
                    .with_default(false)
                    .prompt()?;
            if confirmed {
                admin.delete_beneficiary(&id).await?;
                println!("{}", format!("✅ Beneficiary '{}' deleted", current.title).green());
            } else {
                println!("{}", "❌ Operation cancelled".yellow());
            }
        }
        BeneficiaryCommands::Complete { id } => {
            let completed = admin.mark_completed(&id).await?;
            println!(
                "{} {}",
                format!("✅ '{}'", completed.title).green(),
                collection_status_colored(completed.status())
            );
        }
        BeneficiaryCommands::Report {
            id,
            description,
            photos,
            videos,
        } => {
            let report = ReportInput {
                photos: parse_url_list(&photos),
                videos: parse_url_list(&videos),
                description,
            };
            let reported = admin.submit_report(&id, &report).await?;
            println!(
                "{} {}",
                format!("✅ '{}'", reported.title).green(),
                collection_status_colored(reported.status())
            );
        }
    }
    Ok(())
}

fn city_label(record: &Beneficiary) -> String {
    if record.is_nationwide.unwrap_or(false) {
        return "Вся страна".to_string();
    }
    record.city.clone().unwrap_or_else(|| "—".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn empty_fields() -> BeneficiaryFields {
        BeneficiaryFields {
            title: None,
            description: None,
            category: None,
            city: None,
            fund: None,
            target: None,
            raised: None,
            image: None,
            images: None,
            videos: None,
            helpers: None,
            documents: None,
            active: None,
            urgent: None,
            nationwide: None,
        }
    }

    #[test]
    fn test_omitted_fields_keep_current_values() {
        let mut input = BeneficiaryInput::new("Операция для Данияра");
        input.target_amount = 1_000_000;

        let mut fields = empty_fields();
        fields.raised = Some(400_000);
        fields.images = Some("https://img/1.jpg\n\nhttps://img/2.jpg\n".to_string());
        fields.apply(&mut input);

        assert_eq!(input.title, "Операция для Данияра");
        assert_eq!(input.target_amount, 1_000_000);
        assert_eq!(input.raised_amount, 400_000);
        assert_eq!(input.images, vec!["https://img/1.jpg", "https://img/2.jpg"]);
    }

    #[test]
    fn test_category_flag_replaces_unknown_code() {
        let mut input = BeneficiaryInput::new("Старая запись");
        input.category = "other".to_string();

        fields_with_category(None).apply(&mut input);
        assert_eq!(input.category, "other");

        fields_with_category(Some(Category::Children)).apply(&mut input);
        assert_eq!(input.category, "children");
    }

    fn fields_with_category(category: Option<Category>) -> BeneficiaryFields {
        let mut fields = empty_fields();
        fields.category = category;
        fields
    }

    #[test]
    fn test_blank_helpers_clear_the_label() {
        let mut input = BeneficiaryInput::new("t");
        input.helpers_count = Some("12".to_string());

        let mut fields = empty_fields();
        fields.helpers = Some("  ".to_string());
        fields.apply(&mut input);
        assert_eq!(input.helpers_count, None);
    }
}
