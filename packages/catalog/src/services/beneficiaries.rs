use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::gateway::{decode_rows, tables, DataGateway, Query};
use crate::types::{
    Beneficiary, CatalogBeneficiary, CatalogFilter, CategoryFilter, CityFilter, CollectionStatus,
};

/// Read-side queries over the beneficiaries collection
#[derive(Clone)]
pub struct BeneficiaryQueryService {
    gateway: Arc<dyn DataGateway>,
}

impl BeneficiaryQueryService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// Build the public catalog query for a filter
    pub fn catalog_query(filter: &CatalogFilter) -> Query {
        let mut query = Query::table(tables::BENEFICIARIES)
            .select(&CatalogBeneficiary::COLUMNS)
            .eq("is_active", true);

        if let CategoryFilter::Only(category) = filter.category {
            query = query.eq("category", category.code());
        }

        if let CityFilter::City(city) = &filter.city {
            query = query.or(&[("city", city.as_str()), ("is_nationwide", "true")]);
        }

        query.order("created_at", false)
    }

    /// Active beneficiaries matching the filter, newest first
    #[instrument(skip(self, filter), fields(category = ?filter.category, city = ?filter.city.city()))]
    pub async fn fetch_beneficiaries(
        &self,
        filter: &CatalogFilter,
    ) -> CatalogResult<Vec<CatalogBeneficiary>> {
        let query = Self::catalog_query(filter);
        let rows = self.gateway.select(&query).await.map_err(|e| {
            warn!("Failed to load beneficiaries: {}", e);
            e
        })?;
        let records: Vec<CatalogBeneficiary> = decode_rows(rows)?;
        debug!(count = records.len(), "Loaded beneficiaries");
        Ok(records)
    }

    /// Single beneficiary by id regardless of city or visibility, as used
    /// when opening a shared link
    pub async fn fetch_beneficiary(&self, id: &str) -> CatalogResult<CatalogBeneficiary> {
        let query = Query::table(tables::BENEFICIARIES)
            .select(&CatalogBeneficiary::COLUMNS)
            .eq("id", id)
            .limit(1);
        let rows = self.gateway.select(&query).await?;
        decode_rows::<CatalogBeneficiary>(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(format!("Beneficiary {}", id)))
    }

    /// Active beneficiaries of one partner fund, newest first
    pub async fn fetch_by_partner_fund(&self, fund_name: &str) -> CatalogResult<Vec<Beneficiary>> {
        let query = Query::table(tables::BENEFICIARIES)
            .eq("partner_fund", fund_name)
            .eq("is_active", true)
            .order("created_at", false);
        decode_rows(self.gateway.select(&query).await?)
    }

    /// Reported collections for the public reports feed, most recently
    /// completed first
    pub async fn fetch_reports(&self) -> CatalogResult<Vec<Beneficiary>> {
        let query = Query::table(tables::BENEFICIARIES)
            .eq("collection_status", CollectionStatus::Reported.code())
            .order("completion_date", false);
        decode_rows(self.gateway.select(&query).await?)
    }
}
