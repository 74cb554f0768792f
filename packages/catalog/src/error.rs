//! Catalog error types
use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by the gateway, the query services and the admin flows
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Error reported by the data gateway itself. The message is the
    /// gateway's own `message` field and is displayed as-is.
    #[error("{0}")]
    Gateway(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("IO error: {0}")]
    Io(String),
}

impl CatalogError {
    /// Create a gateway error carrying the gateway's message verbatim
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Check if this is a network-related error
    pub fn is_network_error(&self) -> bool {
        matches!(self, CatalogError::Network(_))
    }

    /// Check if the caller supplied bad input rather than the gateway failing
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::Validation(_) | CatalogError::InvalidTransition { .. }
        )
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(format!("Invalid config format: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_displays_message_verbatim() {
        let err = CatalogError::gateway("column beneficiaries.foo does not exist");
        assert_eq!(err.to_string(), "column beneficiaries.foo does not exist");
        assert!(!err.is_network_error());
    }

    #[test]
    fn test_error_classification() {
        assert!(CatalogError::Network("timeout".into()).is_network_error());
        assert!(CatalogError::validation("bad phone").is_client_error());
        assert!(CatalogError::transition("paid", "new").is_client_error());
        assert!(!CatalogError::config("missing url").is_client_error());
    }

    #[test]
    fn test_transition_display() {
        let err = CatalogError::transition("reported", "active");
        assert_eq!(err.to_string(), "Invalid status transition: reported -> active");
    }
}
