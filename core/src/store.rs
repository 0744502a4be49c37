//! Recent search queries.
//!
//! The use case only ever writes here; listing saved queries belongs to
//! whoever renders suggestions, through `InMemoryRecentQueryStore::recent`.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::types::SearchQuery;

pub const DEFAULT_MAX_QUERIES: usize = 10;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecentQueryStore: Send + Sync {
    /// Record `query` as the most recent one. Returns the stored value.
    async fn save(&self, query: SearchQuery) -> Result<SearchQuery, StoreError>;
}

/// Most-recent-first, de-duplicated list with a fixed capacity.
pub struct InMemoryRecentQueryStore {
    max_queries: usize,
    queries: RwLock<Vec<SearchQuery>>,
}

impl InMemoryRecentQueryStore {
    pub fn new(max_queries: usize) -> Self {
        Self {
            max_queries,
            queries: RwLock::new(Vec::new()),
        }
    }

    /// Up to `limit` queries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<SearchQuery> {
        self.queries.read().await.iter().take(limit).cloned().collect()
    }
}

impl Default for InMemoryRecentQueryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUERIES)
    }
}

#[async_trait]
impl RecentQueryStore for InMemoryRecentQueryStore {
    async fn save(&self, query: SearchQuery) -> Result<SearchQuery, StoreError> {
        if query.text.trim().is_empty() {
            return Err(StoreError::Rejected("empty query".to_string()));
        }
        if self.max_queries == 0 {
            return Err(StoreError::Unavailable("store has no capacity".to_string()));
        }

        let mut queries = self.queries.write().await;
        queries.retain(|existing| *existing != query);
        queries.insert(0, query.clone());
        queries.truncate(self.max_queries);
        Ok(query)
    }
}
