//! Transport boundary and the data-transfer service built on it.
//!
//! # Design
//! `Transport` is the only seam that touches the network. The host supplies
//! an implementation that moves bytes; this crate never picks an HTTP
//! library. `DataTransferService` wraps a transport with the environment
//! configuration: it builds the request, sends it, maps non-2xx replies to
//! `TransportError::Status`, decodes the body with the endpoint's decoder,
//! and logs failures on the way out. It imposes no timeout and never retries.

use std::sync::Arc;

use async_trait::async_trait;

use crate::builder::build_request;
use crate::config::NetworkConfiguration;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result, TransportError};
use crate::http::{HttpRequest, HttpResponse};

/// Executes a built request and returns the raw response.
///
/// Implementations report non-2xx replies as ordinary `HttpResponse`
/// values; status interpretation happens in `DataTransferService`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

pub struct DataTransferService {
    transport: Arc<dyn Transport>,
    config: NetworkConfiguration,
}

impl DataTransferService {
    pub fn new(transport: Arc<dyn Transport>, config: NetworkConfiguration) -> Self {
        Self { transport, config }
    }

    /// Build the wire request for `endpoint` against this service's configuration.
    pub fn prepare<R>(&self, endpoint: &Endpoint<R>) -> Result<HttpRequest> {
        build_request(endpoint, &self.config)
    }

    /// Send an already prepared request and decode its response.
    pub async fn send<R>(&self, endpoint: &Endpoint<R>, request: HttpRequest) -> Result<R> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(error = %e, "Transport failed");
            ApiError::Transport(e)
        })?;
        tracing::debug!(
            status = response.status,
            bytes = response.body.len(),
            "Received response"
        );

        parse_response(endpoint, &response).inspect_err(|e| {
            tracing::warn!(error = %e, status = response.status, "Response rejected");
        })
    }
}

/// Check the status of `response` and decode its body with the endpoint's decoder.
pub fn parse_response<R>(endpoint: &Endpoint<R>, response: &HttpResponse) -> Result<R> {
    check_status(response)?;
    endpoint.decode(&response.body)
}

/// Map non-2xx status codes to `TransportError::Status`.
pub fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Transport(TransportError::Status {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    }))
}
