//! Pure mapping from stored records to the shapes the presentation layer renders.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Beneficiary, CatalogBeneficiary, CollectionStatus};

/// Beneficiary card/detail view model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub category_name: String,
    pub partner_fund: Option<String>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub helpers_count: Option<String>,
    pub documents_link: Option<String>,
    pub raised: i64,
    pub target: i64,
    pub is_urgent: bool,
    pub collection_status: CollectionStatus,
}

impl BeneficiaryView {
    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.raised, self.target)
    }
}

/// Reports feed view model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: i64,
    pub completed_date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub category_name: String,
    pub report_photos: Vec<String>,
    pub report_videos: Vec<String>,
    pub partner_fund: Option<String>,
}

/// Display label for a category code. Codes without a label, including
/// unknown ones, are shown as stored.
pub fn category_label(code: &str) -> &str {
    match code {
        "children" => "Дети",
        "urgent" => "Срочно",
        "operations" => "Операции",
        "animals" => "Животные",
        "non_material" => "Нематериальная помощь",
        other => other,
    }
}

/// Funding progress for display, capped at 100
pub fn progress_percent(raised: i64, target: i64) -> u8 {
    if target <= 0 || raised <= 0 {
        return 0;
    }
    let percent = (raised as f64 / target as f64 * 100.0).min(100.0);
    percent.floor() as u8
}

/// Stored lists win when non-empty, otherwise the primary image stands in
fn gallery(images: Option<&Vec<String>>, image_url: Option<&String>) -> Vec<String> {
    match images {
        Some(images) if !images.is_empty() => images.clone(),
        _ => image_url.cloned().into_iter().collect(),
    }
}

pub fn format_beneficiary(record: &CatalogBeneficiary) -> BeneficiaryView {
    BeneficiaryView {
        id: record.id.clone(),
        title: record.title.clone(),
        description: record.description.clone(),
        category: record.category.clone(),
        category_name: category_label(&record.category).to_string(),
        partner_fund: record.partner_fund.clone(),
        image: record.image_url.clone(),
        images: gallery(record.images.as_ref(), record.image_url.as_ref()),
        videos: record.videos.clone().unwrap_or_default(),
        helpers_count: record.helpers_count.clone(),
        documents_link: record.documents_link.clone(),
        raised: record.raised_amount.unwrap_or(0),
        target: record.target_amount.unwrap_or(0),
        is_urgent: record.is_urgent.unwrap_or(false),
        collection_status: record.collection_status.unwrap_or_default(),
    }
}

pub fn format_beneficiaries(records: &[CatalogBeneficiary]) -> Vec<BeneficiaryView> {
    records.iter().map(format_beneficiary).collect()
}

pub fn format_report(record: &Beneficiary) -> ReportView {
    let report_photos = gallery(record.report_photos.as_ref(), record.image_url.as_ref());
    ReportView {
        id: record.id.clone(),
        title: record.title.clone(),
        description: record.report_description.clone(),
        amount: record.raised_amount.unwrap_or(0),
        completed_date: record.completion_date,
        image: report_photos.first().cloned(),
        category_name: category_label(&record.category).to_string(),
        report_videos: record.report_videos.clone().unwrap_or_default(),
        report_photos,
        partner_fund: record.partner_fund.clone(),
    }
}
