use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{CatalogError, CatalogResult};
use crate::formatter::category_label;
use crate::gateway::{decode_rows, tables, DataGateway, Query};
use crate::services::donations::{normalize_phone, PHONE_DIGITS};
use crate::types::{opaque_id, PaymentRequest, PaymentStatus};

/// Category shown for donations whose beneficiary no longer exists
pub const UNCATEGORIZED: &str = "other";

/// One paid donation, joined with its beneficiary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationEntry {
    pub id: String,
    pub beneficiary_id: String,
    pub name: String,
    pub amount: i64,
    pub category: String,
    pub image: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDonations {
    pub category: String,
    pub category_name: String,
    pub donations: Vec<DonationEntry>,
}

impl CategoryDonations {
    pub fn total(&self) -> i64 {
        self.donations.iter().map(|d| d.amount).sum()
    }
}

/// Paid donations made from one phone number, newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationHistory {
    pub phone: String,
    pub donations: Vec<DonationEntry>,
    pub total: i64,
    /// Groups in order of each category's most recent donation
    pub by_category: Vec<CategoryDonations>,
}

impl DonationHistory {
    /// A donor profile exists once at least one donation has been paid
    pub fn is_activated(&self) -> bool {
        !self.donations.is_empty()
    }

    fn build(phone: String, donations: Vec<DonationEntry>) -> Self {
        let total = donations.iter().map(|d| d.amount).sum();
        let mut by_category: Vec<CategoryDonations> = Vec::new();
        for donation in &donations {
            match by_category
                .iter_mut()
                .find(|group| group.category == donation.category)
            {
                Some(group) => group.donations.push(donation.clone()),
                None => by_category.push(CategoryDonations {
                    category: donation.category.clone(),
                    category_name: category_label(&donation.category).to_string(),
                    donations: vec![donation.clone()],
                }),
            }
        }
        Self {
            phone,
            donations,
            total,
            by_category,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DonatedBeneficiary {
    #[serde(deserialize_with = "opaque_id")]
    id: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
}

impl DonatedBeneficiary {
    fn cover(&self) -> Option<String> {
        self.image_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.images.as_ref().and_then(|images| images.first().cloned()))
    }
}

/// Read side of a donor's profile
#[derive(Clone)]
pub struct DonorService {
    gateway: Arc<dyn DataGateway>,
}

impl DonorService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    #[instrument(skip(self))]
    pub async fn donation_history(&self, phone: &str) -> CatalogResult<DonationHistory> {
        let phone = normalize_phone(phone);
        if phone.len() != PHONE_DIGITS {
            return Err(CatalogError::validation("Enter a valid phone number"));
        }

        let payments_query = Query::table(tables::PAYMENT_REQUESTS)
            .eq("phone", &phone)
            .eq("status", PaymentStatus::Paid.code())
            .order("created_at", false);
        let payments: Vec<PaymentRequest> =
            decode_rows(self.gateway.select(&payments_query).await?)?;
        if payments.is_empty() {
            return Ok(DonationHistory::build(phone, Vec::new()));
        }

        let mut ids: Vec<&str> = Vec::new();
        for payment in &payments {
            if !ids.contains(&payment.beneficiary_id.as_str()) {
                ids.push(&payment.beneficiary_id);
            }
        }
        let beneficiaries_query = Query::table(tables::BENEFICIARIES)
            .select(&["id", "category", "image_url", "images"])
            .in_list("id", &ids);
        let beneficiaries: HashMap<String, DonatedBeneficiary> =
            decode_rows::<DonatedBeneficiary>(self.gateway.select(&beneficiaries_query).await?)?
                .into_iter()
                .map(|b| (b.id.clone(), b))
                .collect();
        debug!(
            payments = payments.len(),
            beneficiaries = beneficiaries.len(),
            "Loaded donation history"
        );

        let donations = payments
            .into_iter()
            .map(|payment| {
                let beneficiary = beneficiaries.get(&payment.beneficiary_id);
                DonationEntry {
                    category: beneficiary
                        .and_then(|b| b.category.clone())
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| UNCATEGORIZED.to_string()),
                    image: beneficiary.and_then(DonatedBeneficiary::cover),
                    id: payment.id,
                    beneficiary_id: payment.beneficiary_id,
                    name: payment.beneficiary_title,
                    amount: payment.amount,
                    date: payment.created_at,
                }
            })
            .collect();
        Ok(DonationHistory::build(phone, donations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Filter, MemoryGateway};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payment(
        id: &str,
        beneficiary: &str,
        phone: &str,
        amount: i64,
        status: &str,
        day: u32,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "beneficiary_id": beneficiary,
            "beneficiary_title": format!("Сбор {}", beneficiary),
            "phone": phone,
            "amount": amount,
            "status": status,
            "created_at": format!("2026-03-{:02}T12:00:00Z", day),
        })
    }

    fn gateway() -> Arc<MemoryGateway> {
        Arc::new(
            MemoryGateway::new()
                .with_rows(
                    tables::PAYMENT_REQUESTS,
                    vec![
                        payment("p-1", "b-1", "87011112233", 2000, "paid", 1),
                        payment("p-2", "b-2", "87011112233", 5000, "paid", 3),
                        payment("p-3", "b-1", "87011112233", 1000, "paid", 5),
                        payment("p-4", "b-1", "87011112233", 9000, "unpaid", 6),
                        payment("p-5", "b-3", "87011112233", 500, "paid", 7),
                        payment("p-6", "b-2", "87019998877", 700, "paid", 8),
                    ],
                )
                .with_rows(
                    tables::BENEFICIARIES,
                    vec![
                        json!({"id": "b-1", "title": "Сбор b-1", "category": "children",
                               "image_url": "https://img/b1.jpg"}),
                        json!({"id": "b-2", "title": "Сбор b-2", "category": "animals",
                               "image_url": "", "images": ["https://img/b2-a.jpg"]}),
                    ],
                ),
        )
    }

    #[tokio::test]
    async fn test_history_lists_paid_donations_newest_first() {
        let service = DonorService::new(gateway());
        let history = service.donation_history("8 (701) 111-22-33").await.unwrap();

        assert_eq!(history.phone, "87011112233");
        assert!(history.is_activated());
        let ids: Vec<_> = history.donations.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["p-5", "p-3", "p-2", "p-1"]);
        assert_eq!(history.total, 8500);
    }

    #[tokio::test]
    async fn test_history_joins_beneficiaries_with_one_in_query() {
        let gateway = gateway();
        let service = DonorService::new(gateway.clone());
        let history = service.donation_history("87011112233").await.unwrap();

        let queries = gateway.executed_queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(
            queries[1].filters,
            vec![Filter::In {
                column: "id".to_string(),
                values: vec!["b-3".to_string(), "b-1".to_string(), "b-2".to_string()],
            }]
        );

        let images: Vec<_> = history.donations.iter().map(|d| d.image.as_deref()).collect();
        assert_eq!(
            images,
            vec![
                None,
                Some("https://img/b1.jpg"),
                Some("https://img/b2-a.jpg"),
                Some("https://img/b1.jpg"),
            ]
        );
    }

    #[tokio::test]
    async fn test_history_groups_by_category() {
        let service = DonorService::new(gateway());
        let history = service.donation_history("87011112233").await.unwrap();

        let groups: Vec<_> = history
            .by_category
            .iter()
            .map(|g| (g.category.as_str(), g.category_name.as_str(), g.donations.len(), g.total()))
            .collect();
        assert_eq!(
            groups,
            vec![
                (UNCATEGORIZED, UNCATEGORIZED, 1, 500),
                ("children", "Дети", 2, 3000),
                ("animals", "Животные", 1, 5000),
            ]
        );
    }

    #[tokio::test]
    async fn test_history_without_paid_donations_is_not_activated() {
        let gateway = gateway();
        let service = DonorService::new(gateway.clone());
        let history = service.donation_history("87000000000").await.unwrap();

        assert!(!history.is_activated());
        assert_eq!(history.total, 0);
        assert!(history.by_category.is_empty());
        assert_eq!(gateway.executed_queries().len(), 1);
    }

    #[tokio::test]
    async fn test_history_rejects_short_phone() {
        let service = DonorService::new(gateway());
        let err = service.donation_history("701").await.unwrap_err();
        assert!(err.is_client_error());
    }
}
