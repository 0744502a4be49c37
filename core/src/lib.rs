//! Network-access core for a catalog search client.
//!
//! # Overview
//! Describes endpoints declaratively, composes them with environment
//! configuration into wire requests, and runs fetches under a cancellable
//! callback contract. The host supplies the byte-level `Transport`; the core
//! never picks an HTTP library.
//!
//! # Design
//! - `Endpoint<R>` + `NetworkConfiguration` -> `builder::build_request` is
//!   pure and synchronous, so URL composition is deterministic and testable.
//! - Encoders and decoders are strategies chosen when an endpoint is built.
//! - `task` enforces "cached at most once, complete exactly once, nothing
//!   after cancel" with an explicit gate.
//! - `SearchUseCase` composes the repository fetch with a detached save of
//!   the query on success.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod encoding;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod repository;
pub mod store;
pub mod task;
pub mod transport;
pub mod types;
pub mod use_case;

pub use builder::{build_request, build_url};
pub use config::NetworkConfiguration;
pub use encoding::{AsciiBodyEncoder, BodyEncoder, JsonBodyEncoder, JsonResponseDecoder, Parameters, RawResponseDecoder, ResponseDecoder};
pub use endpoint::{Endpoint, ParameterSource};
pub use error::{ApiError, ConfigError, StoreError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use repository::{DefaultSearchRepository, InMemoryResponseStorage, ResponseStorage, SearchRepository};
pub use store::{InMemoryRecentQueryStore, RecentQueryStore};
pub use task::{CachedCallback, CancellationHandle, CompletionCallback};
pub use transport::{DataTransferService, Transport};
pub use types::{CatalogItem, CatalogPage, ResultPage, SearchQuery, SearchRequest};
pub use use_case::SearchUseCase;
