use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::gateway::{decode_rows, tables, DataGateway, Filter, Query};
use crate::services::funds::HOUSE_FUND;
use crate::types::{Beneficiary, Category, CollectionStatus, PaymentRequest, PaymentStatus};

/// City preselected in the beneficiary form
pub const DEFAULT_CITY: &str = "Алматы";

/// Split a newline-separated list of URLs, dropping blank lines
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Editable beneficiary fields, as entered in the back-office form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeneficiaryInput {
    pub title: String,
    pub description: String,
    /// Category code. Codes outside [`Category`] are kept as stored.
    pub category: String,
    pub city: String,
    pub partner_fund: String,
    pub target_amount: i64,
    pub raised_amount: i64,
    pub image_url: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub helpers_count: Option<String>,
    pub documents_link: Option<String>,
    pub is_active: bool,
    pub is_urgent: bool,
    pub is_nationwide: bool,
}

impl BeneficiaryInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: Category::Children.code().to_string(),
            city: DEFAULT_CITY.to_string(),
            partner_fund: HOUSE_FUND.to_string(),
            target_amount: 0,
            raised_amount: 0,
            image_url: String::new(),
            images: Vec::new(),
            videos: Vec::new(),
            helpers_count: None,
            documents_link: None,
            is_active: true,
            is_urgent: false,
            is_nationwide: false,
        }
    }

    /// Prefill the form from a stored record
    pub fn from_beneficiary(record: &Beneficiary) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            city: record.city.clone().unwrap_or_default(),
            partner_fund: record
                .partner_fund
                .clone()
                .unwrap_or_else(|| HOUSE_FUND.to_string()),
            target_amount: record.target_amount.unwrap_or(0),
            raised_amount: record.raised_amount.unwrap_or(0),
            image_url: record.image_url.clone().unwrap_or_default(),
            images: record.images.clone().unwrap_or_default(),
            videos: record.videos.clone().unwrap_or_default(),
            helpers_count: record.helpers_count.clone(),
            documents_link: record.documents_link.clone(),
            is_active: record.is_active,
            is_urgent: record.is_urgent.unwrap_or(false),
            is_nationwide: record.is_nationwide.unwrap_or(false),
        }
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category.code().to_string();
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::validation("Title is required"));
        }
        if self.category.trim().is_empty() {
            return Err(CatalogError::validation("Category is required"));
        }
        if self.target_amount < 0 || self.raised_amount < 0 {
            return Err(CatalogError::validation("Amounts cannot be negative"));
        }
        Ok(())
    }
}

/// Report attached when a collection is closed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportInput {
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub description: String,
}

/// Back-office operations. Expects a gateway authenticated with the
/// service key.
#[derive(Clone)]
pub struct AdminService {
    gateway: Arc<dyn DataGateway>,
}

impl AdminService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    // Payment requests

    /// Payment requests newest first, optionally narrowed to one status
    pub async fn list_payment_requests(
        &self,
        status: Option<PaymentStatus>,
    ) -> CatalogResult<Vec<PaymentRequest>> {
        let mut query = Query::table(tables::PAYMENT_REQUESTS);
        if let Some(status) = status {
            query = query.eq("status", status.code());
        }
        decode_rows(self.gateway.select(&query.order("created_at", false)).await?)
    }

    pub async fn count_payment_requests(&self, status: PaymentStatus) -> CatalogResult<usize> {
        let query = Query::table(tables::PAYMENT_REQUESTS).eq("status", status.code());
        self.gateway.count(&query).await
    }

    /// Number of requests in every status, in lifecycle order
    pub async fn status_counts(&self) -> CatalogResult<Vec<(PaymentStatus, usize)>> {
        let mut counts = Vec::with_capacity(PaymentStatus::ALL.len());
        for status in PaymentStatus::ALL {
            counts.push((status, self.count_payment_requests(status).await?));
        }
        Ok(counts)
    }

    /// Advance a payment request; only forward moves out of non-terminal
    /// states are accepted
    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        id: &str,
        next: PaymentStatus,
    ) -> CatalogResult<PaymentRequest> {
        let query = Query::table(tables::PAYMENT_REQUESTS).eq("id", id).limit(1);
        let current = decode_rows::<PaymentRequest>(self.gateway.select(&query).await?)?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(format!("Payment request {}", id)))?;

        if !current.status.can_transition_to(next) {
            return Err(CatalogError::transition(current.status, next));
        }

        let patch = json!({
            "status": next,
            "updated_at": Utc::now(),
        });
        let guard = [
            Filter::eq("id", id),
            Filter::eq("status", current.status.code()),
        ];
        let updated = self
            .gateway
            .update(tables::PAYMENT_REQUESTS, &guard, patch)
            .await?;

        match decode_rows::<PaymentRequest>(updated)?.into_iter().next() {
            Some(request) => {
                info!(from = %current.status, to = %next, "Payment request status updated");
                Ok(request)
            }
            None => {
                // moved by someone else since it was read
                let latest = decode_rows::<PaymentRequest>(self.gateway.select(&query).await?)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| CatalogError::not_found(format!("Payment request {}", id)))?;
                warn!(
                    id,
                    expected = %current.status,
                    found = %latest.status,
                    "Payment request changed concurrently"
                );
                Err(CatalogError::transition(latest.status, next))
            }
        }
    }

    // Beneficiaries

    /// Every beneficiary, visible or not, newest first
    pub async fn list_beneficiaries(
        &self,
        status: Option<CollectionStatus>,
    ) -> CatalogResult<Vec<Beneficiary>> {
        let mut query = Query::table(tables::BENEFICIARIES);
        if let Some(status) = status {
            query = query.eq("collection_status", status.code());
        }
        decode_rows(self.gateway.select(&query.order("created_at", false)).await?)
    }

    pub async fn load_beneficiary(&self, id: &str) -> CatalogResult<Beneficiary> {
        let query = Query::table(tables::BENEFICIARIES).eq("id", id).limit(1);
        decode_rows::<Beneficiary>(self.gateway.select(&query).await?)?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(format!("Beneficiary {}", id)))
    }

    pub async fn create_beneficiary(&self, input: &BeneficiaryInput) -> CatalogResult<Beneficiary> {
        input.validate()?;
        let mut row = serde_json::to_value(input)?;
        if let Value::Object(object) = &mut row {
            object.insert(
                "collection_status".to_string(),
                json!(CollectionStatus::Active),
            );
        }

        let stored = self.gateway.insert(tables::BENEFICIARIES, vec![row]).await?;
        let created = decode_rows::<Beneficiary>(stored)?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::InvalidResponse("No beneficiary returned".to_string()))?;
        info!(id = %created.id, title = %created.title, "Beneficiary created");
        Ok(created)
    }

    /// Overwrite the editable fields. The collection status is left alone so
    /// an edit can never reopen a finished collection.
    pub async fn update_beneficiary(
        &self,
        id: &str,
        input: &BeneficiaryInput,
    ) -> CatalogResult<Beneficiary> {
        input.validate()?;
        let mut patch = serde_json::to_value(input)?;
        if let Value::Object(object) = &mut patch {
            object.insert("updated_at".to_string(), json!(Utc::now()));
        }
        self.patch_beneficiary(id, patch).await
    }

    pub async fn delete_beneficiary(&self, id: &str) -> CatalogResult<()> {
        self.gateway
            .delete(tables::BENEFICIARIES, &[Filter::eq("id", id)])
            .await?;
        info!(id, "Beneficiary deleted");
        Ok(())
    }

    /// Close a collection without a report yet
    pub async fn mark_completed(&self, id: &str) -> CatalogResult<Beneficiary> {
        let current = self.load_beneficiary(id).await?;
        self.ensure_transition(&current, CollectionStatus::Completed)?;
        let now = Utc::now();
        self.move_collection(
            &current,
            CollectionStatus::Completed,
            json!({
                "collection_status": CollectionStatus::Completed,
                "completion_date": now,
                "updated_at": now,
            }),
        )
        .await
    }

    /// Attach the report and publish the collection to the reports feed
    pub async fn submit_report(&self, id: &str, report: &ReportInput) -> CatalogResult<Beneficiary> {
        let current = self.load_beneficiary(id).await?;
        self.ensure_transition(&current, CollectionStatus::Reported)?;
        let now = Utc::now();
        let reported = self
            .move_collection(
                &current,
                CollectionStatus::Reported,
                json!({
                    "report_photos": report.photos,
                    "report_videos": report.videos,
                    "report_description": report.description,
                    "collection_status": CollectionStatus::Reported,
                    "completion_date": now,
                    "updated_at": now,
                }),
            )
            .await?;
        info!(id, "Report submitted");
        Ok(reported)
    }

    fn ensure_transition(&self, current: &Beneficiary, next: CollectionStatus) -> CatalogResult<()> {
        let status = current.status();
        if status.can_transition_to(next) {
            Ok(())
        } else {
            Err(CatalogError::transition(status, next))
        }
    }

    /// Write a collection status move, provided the row still has the status
    /// it was read with
    async fn move_collection(
        &self,
        current: &Beneficiary,
        next: CollectionStatus,
        patch: Value,
    ) -> CatalogResult<Beneficiary> {
        let expected = match current.collection_status {
            Some(status) => Filter::eq("collection_status", status.code()),
            None => Filter::is_null("collection_status"),
        };
        let updated = self
            .gateway
            .update(
                tables::BENEFICIARIES,
                &[Filter::eq("id", &current.id), expected],
                patch,
            )
            .await?;

        match decode_rows::<Beneficiary>(updated)?.into_iter().next() {
            Some(record) => Ok(record),
            None => {
                let latest = self.load_beneficiary(&current.id).await?;
                warn!(
                    id = %current.id,
                    expected = %current.status(),
                    found = %latest.status(),
                    "Collection status changed concurrently"
                );
                Err(CatalogError::transition(latest.status(), next))
            }
        }
    }

    async fn patch_beneficiary(&self, id: &str, patch: Value) -> CatalogResult<Beneficiary> {
        let updated = self
            .gateway
            .update(tables::BENEFICIARIES, &[Filter::eq("id", id)], patch)
            .await?;
        decode_rows::<Beneficiary>(updated)?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(format!("Beneficiary {}", id)))
    }
}
