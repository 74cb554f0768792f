use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::gateway::{decode_rows, tables, DataGateway};
use crate::types::{NewPaymentRequest, PaymentRequest, PaymentStatus};

/// Amounts offered as one-tap choices
pub const PRESET_AMOUNTS: [i64; 4] = [500, 1000, 2000, 5000];

/// Local phone numbers are 11 digits, leading country digit included
pub const PHONE_DIGITS: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    Kaspi,
}

/// A donation attempt as collected from the donor
#[derive(Debug, Clone)]
pub struct DonationRequest {
    pub beneficiary_id: String,
    pub beneficiary_title: String,
    pub amount: i64,
    pub phone: String,
    pub method: PaymentMethod,
}

/// Keep only digits, capped at the local number length
pub fn normalize_phone(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(PHONE_DIGITS)
        .collect()
}

/// Render an 11-digit number as `+7 XXX XXX XX XX`; anything shorter is
/// returned unchanged
pub fn format_phone(digits: &str) -> String {
    if digits.len() < PHONE_DIGITS || !digits.is_ascii() {
        return digits.to_string();
    }
    format!(
        "+7 {} {} {} {}",
        &digits[1..4],
        &digits[4..7],
        &digits[7..9],
        &digits[9..]
    )
}

/// Creates payment requests for the external payment provider
#[derive(Clone)]
pub struct DonationService {
    gateway: Arc<dyn DataGateway>,
}

impl DonationService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// Validate the donation and record a payment request in state `new`
    pub async fn submit(&self, request: DonationRequest) -> CatalogResult<PaymentRequest> {
        if request.amount <= 0 {
            return Err(CatalogError::validation("Choose or enter a donation amount"));
        }

        if request.method == PaymentMethod::Card {
            return Err(CatalogError::validation("Card payments are temporarily unavailable"));
        }

        let phone = normalize_phone(&request.phone);
        if phone.len() != PHONE_DIGITS {
            return Err(CatalogError::validation("Enter a valid phone number"));
        }

        let row = NewPaymentRequest {
            beneficiary_id: request.beneficiary_id,
            beneficiary_title: request.beneficiary_title,
            phone,
            amount: request.amount,
            status: PaymentStatus::New,
        };
        let payload: Value = serde_json::to_value(&row)?;

        let stored = self
            .gateway
            .insert(tables::PAYMENT_REQUESTS, vec![payload])
            .await
            .map_err(|e| {
                warn!(beneficiary_id = %row.beneficiary_id, "Failed to create payment request: {}", e);
                e
            })?;

        let created = decode_rows::<PaymentRequest>(stored)?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::InvalidResponse("No payment request returned".to_string()))?;

        info!(
            request_id = %created.id,
            beneficiary_id = %created.beneficiary_id,
            amount = created.amount,
            "Payment request created"
        );
        Ok(created)
    }
}
