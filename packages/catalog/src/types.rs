use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// City selection meaning "show the whole country"
pub const ALL_CITIES: &str = "Все города";

/// Beneficiary categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Children,
    Urgent,
    Operations,
    Animals,
    Social,
    NonMaterial,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Children,
        Category::Urgent,
        Category::Operations,
        Category::Animals,
        Category::Social,
        Category::NonMaterial,
    ];

    /// Code as stored by the gateway
    pub fn code(&self) -> &'static str {
        match self {
            Category::Children => "children",
            Category::Urgent => "urgent",
            Category::Operations => "operations",
            Category::Animals => "animals",
            Category::Social => "social",
            Category::NonMaterial => "non_material",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.code() == s)
            .ok_or_else(|| CatalogError::validation(format!("Unknown category: {}", s)))
    }
}

/// Category narrowing for catalog queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// `None` and the `"all"` sentinel both mean no narrowing
    pub fn from_selection(selection: Option<&str>) -> Result<Self, CatalogError> {
        match selection.map(str::trim) {
            None | Some("") | Some("all") => Ok(CategoryFilter::All),
            Some(code) => code.parse().map(CategoryFilter::Only),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_selection(Some(s))
    }
}

/// City narrowing for catalog queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CityFilter {
    #[default]
    Everywhere,
    City(String),
}

impl CityFilter {
    /// `None`, `"all"` and `"Все города"` all select the nationwide catalog
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            None | Some("") | Some("all") | Some(ALL_CITIES) => CityFilter::Everywhere,
            Some(city) => CityFilter::City(city.to_string()),
        }
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            CityFilter::Everywhere => None,
            CityFilter::City(city) => Some(city),
        }
    }
}

impl From<Option<&str>> for CityFilter {
    fn from(selection: Option<&str>) -> Self {
        Self::from_selection(selection)
    }
}

/// Parameters of one catalog query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: CategoryFilter,
    pub city: CityFilter,
}

impl CatalogFilter {
    pub fn new(category: CategoryFilter, city: CityFilter) -> Self {
        Self { category, city }
    }

    pub fn from_selection(
        category: Option<&str>,
        city: Option<&str>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            category: CategoryFilter::from_selection(category)?,
            city: CityFilter::from_selection(city),
        })
    }
}

/// Fundraising lifecycle stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    #[default]
    Active,
    Completed,
    Reported,
}

impl CollectionStatus {
    pub fn code(&self) -> &'static str {
        match self {
            CollectionStatus::Active => "active",
            CollectionStatus::Completed => "completed",
            CollectionStatus::Reported => "reported",
        }
    }

    /// Collection only moves forward; a finished collection is never reopened
    pub fn can_transition_to(&self, next: CollectionStatus) -> bool {
        matches!(
            (self, next),
            (CollectionStatus::Active, CollectionStatus::Completed)
                | (CollectionStatus::Active, CollectionStatus::Reported)
                | (CollectionStatus::Completed, CollectionStatus::Reported)
        )
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CollectionStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CollectionStatus::Active),
            "completed" => Ok(CollectionStatus::Completed),
            "reported" => Ok(CollectionStatus::Reported),
            other => Err(CatalogError::validation(format!(
                "Unknown collection status: {}",
                other
            ))),
        }
    }
}

/// Payment request status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    New,
    InvoiceSent,
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::New,
        PaymentStatus::InvoiceSent,
        PaymentStatus::Paid,
        PaymentStatus::Unpaid,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            PaymentStatus::New => "new",
            PaymentStatus::InvoiceSent => "invoice_sent",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
        }
    }

    /// Back-office label
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::New => "Новые",
            PaymentStatus::InvoiceSent => "Счёт выслан",
            PaymentStatus::Paid => "Оплачено",
            PaymentStatus::Unpaid => "Не оплачено",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Unpaid)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::New, PaymentStatus::InvoiceSent)
                | (PaymentStatus::New, PaymentStatus::Unpaid)
                | (PaymentStatus::InvoiceSent, PaymentStatus::Paid)
                | (PaymentStatus::InvoiceSent, PaymentStatus::Unpaid)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PaymentStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.code() == s)
            .ok_or_else(|| CatalogError::validation(format!("Unknown payment status: {}", s)))
    }
}

/// Beneficiary row as projected for the public catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBeneficiary {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Raw category code; unknown codes are kept as stored
    pub category: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub partner_fund: Option<String>,
    #[serde(default)]
    pub target_amount: Option<i64>,
    #[serde(default)]
    pub raised_amount: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub videos: Option<Vec<String>>,
    #[serde(default)]
    pub is_urgent: Option<bool>,
    #[serde(default)]
    pub is_nationwide: Option<bool>,
    #[serde(default)]
    pub collection_status: Option<CollectionStatus>,
    #[serde(default, deserialize_with = "label")]
    pub helpers_count: Option<String>,
    #[serde(default)]
    pub documents_link: Option<String>,
}

impl CatalogBeneficiary {
    /// Columns fetched for the catalog; nothing beyond these is requested
    pub const COLUMNS: [&'static str; 16] = [
        "id",
        "title",
        "description",
        "category",
        "city",
        "partner_fund",
        "target_amount",
        "raised_amount",
        "image_url",
        "images",
        "videos",
        "is_urgent",
        "is_nationwide",
        "collection_status",
        "helpers_count",
        "documents_link",
    ];
}

/// Full persisted beneficiary record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub is_nationwide: Option<bool>,
    #[serde(default)]
    pub partner_fund: Option<String>,
    #[serde(default)]
    pub target_amount: Option<i64>,
    #[serde(default)]
    pub raised_amount: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub videos: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_urgent: Option<bool>,
    #[serde(default)]
    pub collection_status: Option<CollectionStatus>,
    #[serde(default)]
    pub report_photos: Option<Vec<String>>,
    #[serde(default)]
    pub report_videos: Option<Vec<String>>,
    #[serde(default)]
    pub report_description: Option<String>,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "label")]
    pub helpers_count: Option<String>,
    #[serde(default)]
    pub documents_link: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Beneficiary {
    pub fn status(&self) -> CollectionStatus {
        self.collection_status.unwrap_or_default()
    }
}

/// Partner charity fund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerFund {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payment request created by the donation flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub beneficiary_id: String,
    pub beneficiary_title: String,
    pub phone: String,
    pub amount: i64,
    pub status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for a new payment request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPaymentRequest {
    pub beneficiary_id: String,
    pub beneficiary_title: String,
    pub phone: String,
    pub amount: i64,
    pub status: PaymentStatus,
}

fn default_true() -> bool {
    true
}

/// Ids are opaque: accept whatever scalar the gateway uses
pub(crate) fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Free-text or numeric label, kept as text
fn label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
