//! Environment configuration shared by every endpoint.
//!
//! `NetworkConfiguration` carries the base URL, default headers and default
//! query parameters. Defaults are merged under endpoint values by the request
//! builder: endpoint headers win on collision, and default query parameters
//! always precede endpoint query parameters in the query string.

use url::Url;

use crate::error::ConfigError;
use crate::http::{merge_headers, Headers};

const BASE_URL_VAR: &str = "CATALOG_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfiguration {
    base_url: String,
    headers: Headers,
    query_parameters: Vec<(String, String)>,
}

impl NetworkConfiguration {
    /// Configuration rooted at `base_url`.
    ///
    /// The base URL is stored as given. It is validated when a request is
    /// built so that a bad base surfaces as `MalformedEndpoint` on the
    /// completion path rather than at construction.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Vec::new(),
            query_parameters: Vec::new(),
        }
    }

    /// Read configuration from the process environment.
    ///
    /// - `CATALOG_BASE_URL` (required, absolute URL)
    /// - `CATALOG_API_KEY` (optional, sent as the `api_key` query parameter)
    /// - `CATALOG_LANGUAGE` (optional, sent as `language` and `Accept-Language`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(BASE_URL_VAR).map_err(|_| ConfigError::Missing(BASE_URL_VAR))?;
        Url::parse(&base_url).map_err(|e| ConfigError::InvalidUrl {
            name: BASE_URL_VAR,
            value: base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut config = Self::new(base_url).with_header("Accept", "application/json");
        if let Ok(key) = std::env::var("CATALOG_API_KEY") {
            config = config.with_query_parameter("api_key", key);
        }
        if let Ok(language) = std::env::var("CATALOG_LANGUAGE") {
            config = config
                .with_header("Accept-Language", language.clone())
                .with_query_parameter("language", language);
        }
        tracing::debug!(base_url = %config.base_url, "Loaded network configuration");
        Ok(config)
    }

    /// Add a default header. A repeated key, compared case-insensitively,
    /// replaces the earlier value.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers = merge_headers(&self.headers, &[(key.into(), value.into())]);
        self
    }

    /// Append a default query parameter. Order of insertion is the order on the wire.
    pub fn with_query_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.push((key.into(), value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn query_parameters(&self) -> &[(String, String)] {
        &self.query_parameters
    }
}
