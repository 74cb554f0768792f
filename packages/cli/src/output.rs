//! Terminal rendering helpers shared by the CLI commands.

use chrono::{DateTime, Utc};
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use shanyraq_catalog::{CollectionStatus, PaymentStatus};

/// Table with the CLI's standard look
pub fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

/// Whole tenge with space-grouped thousands, e.g. `1 250 000 ₸`
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{}{} ₸", sign, grouped)
}

pub fn format_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| "—".to_string())
}

pub fn format_datetime(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string())
}

/// Ten-cell bar followed by the percentage
pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) / 10;
    format!("{}{} {}%", "█".repeat(filled), "░".repeat(10 - filled), percent)
}

/// Shorten to `max_chars` characters, counting characters rather than bytes
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn payment_status_colored(status: PaymentStatus) -> ColoredString {
    match status {
        PaymentStatus::New => status.label().cyan(),
        PaymentStatus::InvoiceSent => status.label().yellow(),
        PaymentStatus::Paid => status.label().green(),
        PaymentStatus::Unpaid => status.label().red(),
    }
}

pub fn collection_status_colored(status: CollectionStatus) -> ColoredString {
    match status {
        CollectionStatus::Active => "Активный сбор".green(),
        CollectionStatus::Completed => "Сбор завершён".yellow(),
        CollectionStatus::Reported => "Отчёт опубликован".blue(),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
