use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

pub use axum::Router;

pub const PAGE_SIZE: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: u64,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub poster_path: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResultPage {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
    pub results: Vec<CatalogItem>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub page: Option<u32>,
    pub api_key: Option<String>,
}

#[derive(Clone)]
struct AppState {
    items: Arc<Vec<CatalogItem>>,
    api_key: Option<String>,
}

/// Router over the built-in catalog, accepting any API key.
pub fn app() -> Router {
    app_with(default_catalog(), None)
}

/// Router over `items`. When `api_key` is set, searches must carry it.
pub fn app_with(items: Vec<CatalogItem>, api_key: Option<String>) -> Router {
    let state = AppState {
        items: Arc::new(items),
        api_key,
    };
    Router::new()
        .route("/search", get(search))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

pub fn default_catalog() -> Vec<CatalogItem> {
    [
        (268, "Batman", "1989-06-23"),
        (414906, "The Batman", "2022-03-01"),
        (272, "Batman Begins", "2005-06-10"),
        (155, "The Dark Knight", "2008-07-16"),
        (949, "Heat", "1995-12-15"),
    ]
    .into_iter()
    .map(|(id, title, release_date)| CatalogItem {
        id,
        title: title.to_string(),
        overview: String::new(),
        release_date: release_date.to_string(),
        poster_path: Some(format!("/{id}.jpg")),
    })
    .collect()
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ResultPage>, (StatusCode, Json<serde_json::Value>)> {
    if let Some(expected) = &state.api_key {
        if params.api_key.as_ref() != Some(expected) {
            tracing::debug!("Rejected search with invalid API key");
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"status_message": "Invalid API key"})),
            ));
        }
    }

    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"status_message": "page must be at least 1"})),
        ));
    }

    let needle = params.query.to_lowercase();
    let matches: Vec<&CatalogItem> = state
        .items
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .collect();
    let total_results = matches.len() as u64;
    let total_pages = matches.len().div_ceil(PAGE_SIZE) as u32;
    let results = matches
        .into_iter()
        .skip((page as usize - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect::<Vec<_>>();

    tracing::debug!(query = %params.query, page, count = results.len(), "Served search page");
    Ok(Json(ResultPage {
        page,
        total_pages,
        total_results,
        results,
    }))
}
