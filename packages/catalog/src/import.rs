//! Import of the legacy JSON export into the gateway tables.
//!
//! The export is an array of `{objectId, objectData, createdAt, updatedAt}`
//! records, one file per table. Rows are inserted one at a time so a bad row
//! is reported and skipped without aborting the rest.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::CatalogResult;
use crate::gateway::{tables, DataGateway};
use crate::types::CollectionStatus;

/// One exported object
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    pub object_id: Value,
    #[serde(default)]
    pub object_data: Option<Map<String, Value>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl LegacyRecord {
    fn data(&self) -> Option<&Map<String, Value>> {
        self.object_data.as_ref().filter(|data| !data.is_empty())
    }

    fn legacy_id(&self) -> Value {
        match &self.object_id {
            Value::Number(n) => Value::String(n.to_string()),
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.failed + self.skipped
    }

    fn merge(self, other: ImportSummary) -> Self {
        Self {
            inserted: self.inserted + other.inserted,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

pub fn parse_export(json: &str) -> CatalogResult<Vec<LegacyRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Exported booleans are either real booleans or the string "true"
fn flag(data: &Map<String, Value>, key: &str) -> bool {
    matches!(data.get(key), Some(Value::Bool(true)))
        || matches!(data.get(key), Some(Value::String(s)) if s == "true")
}

fn list(data: &Map<String, Value>, key: &str) -> Value {
    match data.get(key) {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        _ => Value::Array(Vec::new()),
    }
}

fn amount(data: &Map<String, Value>, key: &str) -> Value {
    let parsed = match data.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Value::from(parsed.unwrap_or(0))
}

/// Copy a field when present and non-null
fn carry(row: &mut Map<String, Value>, data: &Map<String, Value>, key: &str) {
    if let Some(value) = data.get(key).filter(|v| !v.is_null()) {
        row.insert(key.to_string(), value.clone());
    }
}

fn carry_value(row: &mut Map<String, Value>, key: &str, value: Option<&String>) {
    if let Some(value) = value {
        row.insert(key.to_string(), Value::String(value.clone()));
    }
}

/// Partner fund row for an exported fund, `None` for empty records
pub fn fund_row(record: &LegacyRecord) -> Option<Value> {
    let data = record.data()?;
    let mut row = Map::new();
    row.insert("trickle_id".to_string(), record.legacy_id());
    for key in ["name", "description", "logo_url"] {
        carry(&mut row, data, key);
    }
    row.insert("is_verified".to_string(), Value::Bool(flag(data, "is_verified")));

    let created_at = data
        .get("created_at")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| record.created_at.clone());
    carry_value(&mut row, "created_at", created_at.as_ref());
    Some(Value::Object(row))
}

/// Beneficiary row for an exported beneficiary, `None` for empty records
pub fn beneficiary_row(record: &LegacyRecord) -> Option<Value> {
    let data = record.data()?;
    let mut row = Map::new();
    row.insert("trickle_id".to_string(), record.legacy_id());
    for key in [
        "title",
        "description",
        "category",
        "city",
        "partner_fund",
        "image_url",
        "helpers_count",
        "completion_date",
        "report_description",
        "documents_link",
    ] {
        carry(&mut row, data, key);
    }

    row.insert("target_amount".to_string(), amount(data, "target_amount"));
    row.insert("raised_amount".to_string(), amount(data, "raised_amount"));
    for key in ["images", "videos", "report_photos", "report_videos"] {
        row.insert(key.to_string(), list(data, key));
    }

    let is_active = !matches!(data.get("is_active"), Some(Value::Bool(false)));
    row.insert("is_active".to_string(), Value::Bool(is_active));
    row.insert("is_urgent".to_string(), Value::Bool(flag(data, "is_urgent")));
    row.insert("is_nationwide".to_string(), Value::Bool(flag(data, "is_nationwide")));

    let status = match data.get("collection_status") {
        Some(Value::String(s)) if !s.is_empty() => Value::String(s.clone()),
        _ => Value::String(CollectionStatus::Active.code().to_string()),
    };
    row.insert("collection_status".to_string(), status);

    carry_value(&mut row, "created_at", record.created_at.as_ref());
    carry_value(&mut row, "updated_at", record.updated_at.as_ref());
    Some(Value::Object(row))
}

fn row_label(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_str)
        .unwrap_or("(untitled)")
        .to_string()
}

async fn import_records(
    gateway: &dyn DataGateway,
    table: &str,
    records: &[LegacyRecord],
    to_row: fn(&LegacyRecord) -> Option<Value>,
    label_key: &str,
) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for record in records {
        let Some(row) = to_row(record) else {
            summary.skipped += 1;
            continue;
        };
        let label = row_label(&row, label_key);
        match gateway.insert(table, vec![row]).await {
            Ok(_) => {
                info!(table, "Imported {}", label);
                summary.inserted += 1;
            }
            Err(e) => {
                warn!(table, "Failed to import {}: {}", label, e);
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Import both exports, funds first. Only malformed input files fail the
/// whole import; row failures are counted.
pub async fn import_legacy(
    gateway: &dyn DataGateway,
    funds_json: &str,
    beneficiaries_json: &str,
) -> CatalogResult<ImportSummary> {
    let funds = parse_export(funds_json)?;
    let beneficiaries = parse_export(beneficiaries_json)?;

    let fund_summary =
        import_records(gateway, tables::PARTNER_FUNDS, &funds, fund_row, "name").await;
    let beneficiary_summary = import_records(
        gateway,
        tables::BENEFICIARIES,
        &beneficiaries,
        beneficiary_row,
        "title",
    )
    .await;

    let summary = fund_summary.merge(beneficiary_summary);
    info!(
        inserted = summary.inserted,
        failed = summary.failed,
        skipped = summary.skipped,
        "Legacy import finished"
    );
    Ok(summary)
}
