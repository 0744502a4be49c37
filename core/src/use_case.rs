//! Search use case - fetches a result page and remembers successful queries.

use std::sync::Arc;

use tokio::runtime::Handle;

use crate::repository::SearchRepository;
use crate::store::RecentQueryStore;
use crate::task::{CachedCallback, CancellationHandle, CompletionCallback};
use crate::types::{CatalogPage, SearchQuery, SearchRequest};

/// Composes a repository fetch with a best-effort write of the query.
///
/// The result is passed to the caller untouched. On success the query is
/// saved in a detached task whose outcome is intentionally discarded: it
/// can neither delay nor fail the caller's completion.
pub struct SearchUseCase {
    repository: Arc<dyn SearchRepository>,
    query_store: Arc<dyn RecentQueryStore>,
}

impl SearchUseCase {
    pub fn new(repository: Arc<dyn SearchRepository>, query_store: Arc<dyn RecentQueryStore>) -> Self {
        Self {
            repository,
            query_store,
        }
    }

    /// Fetch one page of results for `request`.
    ///
    /// `on_cached` is forwarded unchanged. The returned handle is the
    /// repository's own.
    pub fn execute(
        &self,
        request: SearchRequest,
        on_cached: CachedCallback<CatalogPage>,
        on_complete: CompletionCallback<CatalogPage>,
    ) -> Option<CancellationHandle> {
        let query_store = Arc::clone(&self.query_store);
        let query = request.query.clone();
        let runtime = Handle::try_current().ok();

        self.repository.fetch_page(
            request,
            on_cached,
            Box::new(move |result| {
                if result.is_ok() {
                    save_detached(runtime, query_store, query);
                }
                on_complete(result);
            }),
        )
    }
}

/// Fire-and-forget save. Nothing awaits the spawned task.
fn save_detached(fallback: Option<Handle>, store: Arc<dyn RecentQueryStore>, query: SearchQuery) {
    let Some(runtime) = Handle::try_current().ok().or(fallback) else {
        tracing::debug!(query = %query.text, "No async runtime, recent query not saved");
        return;
    };
    runtime.spawn(async move {
        if let Err(e) = store.save(query).await {
            tracing::debug!(error = %e, "Discarded recent-query save failure");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, Result, StoreError, TransportError};
    use crate::repository::MockSearchRepository;
    use crate::store::MockRecentQueryStore;
    use crate::task::channel;
    use crate::types::CatalogItem;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn page() -> CatalogPage {
        CatalogPage {
            page: 1,
            total_pages: Some(1),
            total_results: Some(1),
            items: vec![CatalogItem {
                id: 268,
                title: "Batman".to_string(),
                overview: None,
                release_date: None,
                poster_path: None,
            }],
        }
    }

    fn request() -> SearchRequest {
        SearchRequest::new(SearchQuery::new("batman"), 1)
    }

    /// Store that reports every save on a channel.
    fn reporting_store(times: usize) -> (MockRecentQueryStore, mpsc::UnboundedReceiver<SearchQuery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut store = MockRecentQueryStore::new();
        store.expect_save().times(times).returning(move |query| {
            let _ = tx.send(query.clone());
            Ok(query)
        });
        (store, rx)
    }

    fn completions() -> (Arc<Mutex<Vec<Result<CatalogPage>>>>, CompletionCallback<CatalogPage>) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&results);
        (results, Box::new(move |r| sink.lock().unwrap().push(r)))
    }

    #[tokio::test]
    async fn success_saves_query_once() {
        let mut repository = MockSearchRepository::new();
        repository
            .expect_fetch_page()
            .times(1)
            .returning(|_, on_cached, on_complete| {
                on_cached(page());
                on_complete(Ok(page()));
                None
            });
        let (store, mut saved) = reporting_store(1);
        let use_case = SearchUseCase::new(Arc::new(repository), Arc::new(store));

        let cached = Arc::new(Mutex::new(0));
        let cached_count = Arc::clone(&cached);
        let (results, on_complete) = completions();
        use_case.execute(
            request(),
            Box::new(move |_| *cached_count.lock().unwrap() += 1),
            on_complete,
        );

        assert_eq!(saved.recv().await, Some(SearchQuery::new("batman")));
        assert_eq!(*cached.lock().unwrap(), 1);
        assert_eq!(results.lock().unwrap().len(), 1);
        assert_eq!(results.lock().unwrap()[0], Ok(page()));
    }

    #[tokio::test]
    async fn failure_saves_nothing() {
        let mut repository = MockSearchRepository::new();
        repository.expect_fetch_page().returning(|_, _, on_complete| {
            on_complete(Err(ApiError::Transport(TransportError::NotConnected)));
            None
        });
        let (store, mut saved) = reporting_store(0);
        let use_case = SearchUseCase::new(Arc::new(repository), Arc::new(store));

        let (results, on_complete) = completions();
        use_case.execute(request(), Box::new(|_| {}), on_complete);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(saved.try_recv().is_err());
        assert!(results.lock().unwrap()[0].is_err());
    }

    #[tokio::test]
    async fn store_failure_does_not_reach_caller() {
        let mut repository = MockSearchRepository::new();
        repository.expect_fetch_page().returning(|_, _, on_complete| {
            on_complete(Ok(page()));
            None
        });
        let (tx, mut attempted) = mpsc::unbounded_channel();
        let mut store = MockRecentQueryStore::new();
        store.expect_save().times(1).returning(move |_| {
            let _ = tx.send(());
            Err(StoreError::Unavailable("disk full".to_string()))
        });
        let use_case = SearchUseCase::new(Arc::new(repository), Arc::new(store));

        let (results, on_complete) = completions();
        use_case.execute(request(), Box::new(|_| {}), on_complete);

        assert_eq!(attempted.recv().await, Some(()));
        assert_eq!(*results.lock().unwrap(), vec![Ok(page())]);
    }

    #[tokio::test]
    async fn returns_the_repository_handle() {
        let (_cached, _completion, handle) = channel::<CatalogPage>(Box::new(|_| {}), Box::new(|_| {}));
        let repository_handle = handle.clone();
        let mut repository = MockSearchRepository::new();
        repository
            .expect_fetch_page()
            .return_once(move |_, _, _| Some(handle));
        let use_case = SearchUseCase::new(Arc::new(repository), Arc::new(MockRecentQueryStore::new()));

        let returned = use_case
            .execute(request(), Box::new(|_| {}), Box::new(|_| {}))
            .unwrap();
        returned.cancel();
        assert!(repository_handle.is_cancelled());
    }
}
