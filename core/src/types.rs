//! Domain values for catalog search.
//!
//! # Design
//! These are the types the use case and its callers see. Wire DTOs live in
//! `catalog` and are mapped into these after decoding, so the service schema
//! can drift without touching callers.

use serde::{Deserialize, Serialize};

/// Raw search text entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One page of a search: what to look for and which page of results.
///
/// Pages are 1-based, as the catalog service counts them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub page: u32,
}

impl SearchRequest {
    pub fn new(query: SearchQuery, page: u32) -> Self {
        Self { query, page }
    }
}

/// A page of results in service order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage<T> {
    pub page: u32,
    pub total_pages: Option<u32>,
    pub total_results: Option<u64>,
    pub items: Vec<T>,
}

impl<T> ResultPage<T> {
    /// Whether the service reported further pages after this one.
    pub fn has_more(&self) -> bool {
        self.total_pages.is_some_and(|total| self.page < total)
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
}

pub type CatalogPage = ResultPage<CatalogItem>;
