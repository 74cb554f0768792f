use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::gateway::{decode_rows, tables, DataGateway, Query};
use crate::types::PartnerFund;

/// House fund offered when no partner funds are listed
pub const HOUSE_FUND: &str = "Шанырак";

#[derive(Clone)]
pub struct PartnerFundQueryService {
    gateway: Arc<dyn DataGateway>,
}

impl PartnerFundQueryService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// All partner funds, newest first
    pub async fn fetch_partner_funds(&self) -> CatalogResult<Vec<PartnerFund>> {
        let query = Query::table(tables::PARTNER_FUNDS).order("created_at", false);
        let rows = self.gateway.select(&query).await.map_err(|e| {
            warn!("Failed to load partner funds: {}", e);
            e
        })?;
        let funds: Vec<PartnerFund> = decode_rows(rows)?;
        debug!(count = funds.len(), "Loaded partner funds");
        Ok(funds)
    }

    /// Fund by its name, which acts as the natural key in links
    pub async fn fetch_partner_fund(&self, name: &str) -> CatalogResult<PartnerFund> {
        let query = Query::table(tables::PARTNER_FUNDS).eq("name", name).limit(1);
        decode_rows::<PartnerFund>(self.gateway.select(&query).await?)?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(format!("Partner fund {}", name)))
    }

    /// Fund names for pickers, alphabetical
    pub async fn list_fund_names(&self) -> CatalogResult<Vec<String>> {
        #[derive(Deserialize)]
        struct NameRow {
            name: String,
        }

        let query = Query::table(tables::PARTNER_FUNDS)
            .select(&["name"])
            .order("name", true);
        let names: Vec<String> = decode_rows::<NameRow>(self.gateway.select(&query).await?)?
            .into_iter()
            .map(|row| row.name)
            .collect();

        if names.is_empty() {
            return Ok(vec![HOUSE_FUND.to_string()]);
        }
        Ok(names)
    }
}
