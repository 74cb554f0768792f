use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{require_filters, DataGateway, Filter, Query};
use crate::config::GatewayConfig;
use crate::error::{CatalogError, CatalogResult};

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Data gateway backed by the Supabase REST endpoint
#[derive(Clone)]
pub struct RestGateway {
    http_client: Client,
    rest_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl RestGateway {
    /// Create a gateway client. A configured service key becomes the bearer
    /// token; otherwise requests are made with the anonymous key.
    pub fn new(config: &GatewayConfig) -> CatalogResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rest_url: config.rest_url(),
            anon_key: config.anon_key.clone(),
            access_token: config.service_key.clone(),
        })
    }

    /// Set the access token after authentication
    pub fn set_access_token(&mut self, token: String) {
        self.access_token = Some(token);
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Get authorization header value
    fn auth_header(&self) -> String {
        match &self.access_token {
            Some(token) => format!("Bearer {}", token),
            None => format!("Bearer {}", self.anon_key),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.anon_key)
            .header("Authorization", self.auth_header())
    }

    async fn send(&self, request: RequestBuilder) -> CatalogResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!("Gateway request failed: {}", e);
            CatalogError::Network(e.to_string())
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let err = error_from_body(status, &body);
        warn!(%status, "Gateway returned an error: {}", err);
        Err(err)
    }

    async fn rows(response: Response) -> CatalogResult<Vec<Value>> {
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }
}

/// Surface the gateway's own `message`, falling back to the raw body or
/// status line when the body is not a PostgREST error object.
fn error_from_body(status: StatusCode, body: &str) -> CatalogError {
    match serde_json::from_str::<GatewayErrorBody>(body) {
        Ok(err) => {
            debug!(code = ?err.code, details = ?err.details, hint = ?err.hint, "Gateway error detail");
            CatalogError::Gateway(err.message)
        }
        Err(_) if !body.trim().is_empty() => CatalogError::Gateway(body.trim().to_string()),
        Err(_) => CatalogError::Gateway(status.to_string()),
    }
}

/// Parse the total out of a `Content-Range` header such as `0-24/3573` or `*/0`
fn parse_content_range_total(value: &str) -> Option<usize> {
    value.rsplit('/').next()?.trim().parse().ok()
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_param).collect()
}

#[async_trait]
impl DataGateway for RestGateway {
    async fn select(&self, query: &Query) -> CatalogResult<Vec<Value>> {
        let params = query.to_params();
        debug!(table = %query.table, ?params, "select");
        let response = self
            .send(self.request(Method::GET, &query.table).query(&params))
            .await?;
        Self::rows(response).await
    }

    async fn count(&self, query: &Query) -> CatalogResult<usize> {
        let params = filter_params(&query.filters);
        debug!(table = %query.table, ?params, "count");
        let response = self
            .send(
                self.request(Method::HEAD, &query.table)
                    .header("Prefer", "count=exact")
                    .query(&[("select", "*")])
                    .query(&params),
            )
            .await?;

        response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| CatalogError::InvalidResponse("Missing Content-Range total".to_string()))
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> CatalogResult<Vec<Value>> {
        debug!(table, count = rows.len(), "insert");
        let response = self
            .send(
                self.request(Method::POST, table)
                    .header("Prefer", "return=representation")
                    .json(&rows),
            )
            .await?;
        Self::rows(response).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> CatalogResult<Vec<Value>> {
        require_filters(table, filters)?;
        let params = filter_params(filters);
        debug!(table, ?params, "update");
        let response = self
            .send(
                self.request(Method::PATCH, table)
                    .header("Prefer", "return=representation")
                    .query(&params)
                    .json(&patch),
            )
            .await?;
        Self::rows(response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> CatalogResult<()> {
        require_filters(table, filters)?;
        let params = filter_params(filters);
        debug!(table, ?params, "delete");
        self.send(self.request(Method::DELETE, table).query(&params))
            .await?;
        Ok(())
    }
}
