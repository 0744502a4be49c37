//! Error types for the catalog client core.
//!
//! # Design
//! Every failure a fetch can produce surfaces through the single terminal
//! completion as an `ApiError`; nothing is thrown across the async boundary.
//! Transport failures are kept opaque in `TransportError` and carried
//! unchanged. Loading configuration from the environment fails with
//! `ConfigError` before any fetch exists. Recent-query persistence has its
//! own `StoreError` because its failures are discarded by the use case and
//! never reach the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors delivered through a fetch completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The endpoint string could not be parsed or reassembled into a URL.
    #[error("malformed endpoint: {0}")]
    MalformedEndpoint(String),

    /// Structured query parameters could not be flattened into key/value pairs.
    #[error("query serialization failed: {0}")]
    QuerySerializationFailed(String),

    /// Structured body parameters could not be flattened into key/value pairs.
    #[error("body serialization failed: {0}")]
    BodySerializationFailed(String),

    /// Failure reported by the transport collaborator.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body did not match the expected shape.
    #[error("decoding failed: {0}")]
    DecodingFailed(String),
}

/// Failures from the byte-level transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// No connection could be established, or no runtime was available to run one.
    #[error("not connected")]
    NotConnected,

    #[error("transport error: {0}")]
    Other(String),
}

/// Environment configuration that cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is not an absolute URL ({value}): {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Failures from the recent-query store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("recent-query store unavailable: {0}")]
    Unavailable(String),

    #[error("query rejected: {0}")]
    Rejected(String),
}
