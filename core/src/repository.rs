//! Search repository: the cancellable fetch of one result page.
//!
//! # Design
//! `DefaultSearchRepository` builds the search endpoint, optionally replays a
//! stored snapshot through `on_cached`, then performs the round trip through
//! `DataTransferService` and reports through `on_complete`. The callback
//! contract itself is enforced by `task::spawn_fetch`.
//!
//! Request-build failures are reported synchronously and no handle is
//! returned: nothing was started, so there is nothing to cancel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::catalog::search_endpoint;
use crate::task::{spawn_fetch, CachedCallback, CancellationHandle, CompletionCallback};
use crate::transport::DataTransferService;
use crate::types::{CatalogPage, SearchRequest};

#[cfg_attr(test, mockall::automock)]
pub trait SearchRepository: Send + Sync {
    fn fetch_page(
        &self,
        request: SearchRequest,
        on_cached: CachedCallback<CatalogPage>,
        on_complete: CompletionCallback<CatalogPage>,
    ) -> Option<CancellationHandle>;
}

/// Source of the cached snapshot replayed before a fresh fetch.
#[async_trait]
pub trait ResponseStorage: Send + Sync {
    async fn cached_page(&self, request: &SearchRequest) -> Option<CatalogPage>;
    async fn save_page(&self, request: &SearchRequest, page: &CatalogPage);
}

/// Keeps the latest page per request in memory.
#[derive(Default)]
pub struct InMemoryResponseStorage {
    pages: RwLock<HashMap<SearchRequest, CatalogPage>>,
}

impl InMemoryResponseStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseStorage for InMemoryResponseStorage {
    async fn cached_page(&self, request: &SearchRequest) -> Option<CatalogPage> {
        self.pages.read().await.get(request).cloned()
    }

    async fn save_page(&self, request: &SearchRequest, page: &CatalogPage) {
        self.pages.write().await.insert(request.clone(), page.clone());
    }
}

pub struct DefaultSearchRepository {
    service: Arc<DataTransferService>,
    storage: Option<Arc<dyn ResponseStorage>>,
}

impl DefaultSearchRepository {
    pub fn new(service: Arc<DataTransferService>) -> Self {
        Self {
            service,
            storage: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn ResponseStorage>) -> Self {
        self.storage = Some(storage);
        self
    }
}

impl SearchRepository for DefaultSearchRepository {
    fn fetch_page(
        &self,
        request: SearchRequest,
        on_cached: CachedCallback<CatalogPage>,
        on_complete: CompletionCallback<CatalogPage>,
    ) -> Option<CancellationHandle> {
        let endpoint = search_endpoint(&request);
        let wire_request = match self.service.prepare(&endpoint) {
            Ok(wire_request) => wire_request,
            Err(e) => {
                tracing::warn!(error = %e, query = %request.query.text, "Search request could not be built");
                on_complete(Err(e));
                return None;
            }
        };

        let service = Arc::clone(&self.service);
        let storage = self.storage.clone();
        spawn_fetch(on_cached, on_complete, move |cached| async move {
            if let Some(storage) = &storage {
                if let Some(page) = storage.cached_page(&request).await {
                    tracing::debug!(page = page.page, "Replaying stored page");
                    cached.send(page);
                }
            }

            let page = service.send(&endpoint, wire_request).await?.into_domain();
            if let Some(storage) = &storage {
                storage.save_page(&request, &page).await;
            }
            tracing::info!(
                query = %request.query.text,
                page = page.page,
                count = page.items.len(),
                "Fetched search page"
            );
            Ok(page)
        })
    }
}
