//! Data-link endpoint and credentials.

use crate::domain::error::LinkError;
use crate::ports::config_port::ConfigPort;
use tracing::warn;

pub const BASE_URL: &str = "https://data.nasdaq.com/api/v3/datatables";

/// A non-blank data-link API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: &str) -> Result<Self, LinkError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LinkError::ConfigMissing {
                section: "data".into(),
                key: "auth_token".into(),
            });
        }
        Ok(ApiKey(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read `[data] auth_token`, falling back to the legacy
    /// `quandl_auth_token` key.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LinkError> {
        if let Some(key) = config.get_string("data", "auth_token") {
            return ApiKey::new(&key);
        }
        if let Some(key) = config.get_string("data", "quandl_auth_token") {
            warn!("[data] quandl_auth_token is deprecated, use auth_token");
            return ApiKey::new(&key);
        }
        Err(LinkError::ConfigMissing {
            section: "data".into(),
            key: "auth_token".into(),
        })
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

pub fn source_url(symbol: &str, key: &ApiKey) -> String {
    format!("{}/{}.csv?api_key={}", BASE_URL, symbol, key.as_str())
}
