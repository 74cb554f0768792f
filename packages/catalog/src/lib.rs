//! Shanyraq catalog core
//!
//! Data access and view models for the Shanyraq charity catalog: beneficiary
//! and partner fund queries over a hosted PostgREST store, view-model
//! formatting, a fetch lifecycle that never publishes stale results, the
//! donation flow and the back-office operations.

pub mod config;
pub mod error;
pub mod formatter;
pub mod gateway;
pub mod import;
pub mod lifecycle;
pub mod services;
pub mod types;

use std::sync::Arc;

// Re-export commonly used types and traits
pub use config::{AppConfig, CatalogSettings, GatewayConfig};
pub use error::{CatalogError, CatalogResult};
pub use formatter::{format_beneficiaries, format_beneficiary, format_report, BeneficiaryView, ReportView};
pub use gateway::{DataGateway, Filter, MemoryGateway, Query, RestGateway};
pub use lifecycle::{BeneficiaryFeed, FetchController, FetchOutcome, FetchPhase, FetchSnapshot, PartnerFundFeed};
pub use services::{
    AdminService, BeneficiaryQueryService, DonationService, DonorService, PartnerFundQueryService,
};
pub use types::*;

/// Open a REST gateway for the configured project
pub fn connect(config: &GatewayConfig) -> CatalogResult<Arc<dyn DataGateway>> {
    config.validate()?;
    Ok(Arc::new(RestGateway::new(config)?))
}
