//! Composes an `Endpoint` and a `NetworkConfiguration` into an `HttpRequest`.
//!
//! # Design
//! Pure and synchronous: no I/O, no shared state. The composition rules are
//! observable on the wire and are kept stable so that equal inputs always
//! produce byte-identical URLs:
//! - relative paths are joined to the base URL with exactly one `/`
//! - configuration query parameters precede endpoint query parameters
//! - endpoint headers overwrite configuration headers with the same key
//! - an empty parameter map never produces a body

use url::Url;

use crate::config::NetworkConfiguration;
use crate::encoding::parameter_string;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::http::{merge_headers, HttpRequest};

/// Resolve the absolute URL, including its query string.
pub fn build_url<R>(endpoint: &Endpoint<R>, config: &NetworkConfiguration) -> Result<Url> {
    let endpoint_string = if endpoint.is_full_path() {
        endpoint.path().to_string()
    } else {
        join_path(config.base_url(), endpoint.path())
    };

    let mut url = Url::parse(&endpoint_string)
        .map_err(|e| ApiError::MalformedEndpoint(format!("{endpoint_string}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::MalformedEndpoint(format!(
            "{endpoint_string}: not a hierarchical URL"
        )));
    }

    let endpoint_query = endpoint
        .query_source()
        .resolve()
        .map_err(ApiError::QuerySerializationFailed)?;

    let mut items: Vec<String> = url
        .query()
        .filter(|existing| !existing.is_empty())
        .map(|existing| vec![existing.to_string()])
        .unwrap_or_default();
    items.extend(
        config
            .query_parameters()
            .iter()
            .map(|(key, value)| query_item(key, value)),
    );
    items.extend(
        endpoint_query
            .iter()
            .filter_map(|(key, value)| parameter_string(value).map(|value| query_item(key, &value))),
    );

    if items.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&items.join("&")));
    }
    Ok(url)
}

/// Compose the full wire request.
pub fn build_request<R>(endpoint: &Endpoint<R>, config: &NetworkConfiguration) -> Result<HttpRequest> {
    let url = build_url(endpoint, config)?;
    let headers = merge_headers(config.headers(), endpoint.header_parameters());

    let body_parameters = endpoint
        .body_source()
        .resolve()
        .map_err(ApiError::BodySerializationFailed)?;
    let body = if body_parameters.is_empty() {
        None
    } else {
        endpoint.body_encoder().encode(&body_parameters)
    };

    Ok(HttpRequest {
        method: endpoint.method(),
        url: url.into(),
        headers,
        body,
    })
}

fn join_path(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn query_item(key: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
}
