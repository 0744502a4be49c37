//! Catalog service endpoints and wire DTOs.
//!
//! # Design
//! DTOs mirror the service's JSON schema and are mapped into the domain types
//! in `types` once decoded. Endpoint factories are the only place that knows
//! the service's paths and parameter names.

use serde::{Deserialize, Serialize};

use crate::encoding::{JsonResponseDecoder, RawResponseDecoder, ResponseDecoder};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::http::{HttpMethod, HttpResponse};
use crate::transport::check_status;
use crate::types::{CatalogItem, CatalogPage, SearchRequest};

pub const SEARCH_PATH: &str = "search";

/// Query parameters of a search call, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequestDto {
    pub query: String,
    pub page: u32,
}

impl From<&SearchRequest> for SearchRequestDto {
    fn from(request: &SearchRequest) -> Self {
        Self {
            query: request.query.text.clone(),
            page: request.page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPageDto {
    pub page: u32,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub results: Vec<CatalogItemDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItemDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl ResultPageDto {
    pub fn into_domain(self) -> CatalogPage {
        CatalogPage {
            page: self.page,
            total_pages: self.total_pages,
            total_results: self.total_results,
            items: self.results.into_iter().map(CatalogItemDto::into_domain).collect(),
        }
    }
}

impl CatalogItemDto {
    pub fn into_domain(self) -> CatalogItem {
        CatalogItem {
            id: self.id,
            title: self.title,
            overview: self.overview.filter(|s| !s.is_empty()),
            release_date: self.release_date.filter(|s| !s.is_empty()),
            poster_path: self.poster_path,
        }
    }
}

/// `GET search?query=..&page=..` relative to the configured base URL.
pub fn search_endpoint(request: &SearchRequest) -> Endpoint<ResultPageDto> {
    Endpoint::new(SEARCH_PATH, HttpMethod::Get).with_query_structured(SearchRequestDto::from(request))
}

/// Parse a search response executed by the host into a domain page.
pub fn parse_search_response(response: &HttpResponse) -> Result<CatalogPage> {
    check_status(response)?;
    let dto = JsonResponseDecoder::<ResultPageDto>::new().decode(&response.body)?;
    Ok(dto.into_domain())
}

/// Poster image bytes, served from a separate image host.
pub fn poster_endpoint(image_base_url: &str, poster_path: &str, width: u32) -> Endpoint<Vec<u8>> {
    let url = format!(
        "{}/w{width}/{}",
        image_base_url.trim_end_matches('/'),
        poster_path.trim_start_matches('/')
    );
    Endpoint::with_decoder(url, HttpMethod::Get, RawResponseDecoder).with_full_path(true)
}
