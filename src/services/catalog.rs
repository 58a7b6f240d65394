// src/services/catalog.rs

//! Catalog fetcher service.
//!
//! Walks the store's cursor pagination to produce the complete entry list.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Entry;
use crate::store::DocumentStore;

/// Default number of entries requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Service for listing every entry of a source.
pub struct CatalogFetcher {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
}

impl CatalogFetcher {
    /// Create a fetcher with the default page size.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_page_size(store, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(store: Arc<dyn DocumentStore>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    /// Fetch all entries of `source_id` in store order.
    ///
    /// Any failed page aborts the whole listing; a partial list is never
    /// returned.
    pub async fn fetch_all(&self, source_id: &str) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .query(source_id, cursor.as_deref(), self.page_size)
                .await?;
            pages += 1;

            log::debug!(
                "Catalog page {}: {} entries (has_more: {})",
                pages,
                page.results.len(),
                page.has_more
            );
            entries.extend(page.results);

            if !page.has_more {
                break;
            }
            // Restarting without a cursor would loop over the first page forever
            cursor = Some(page.next_cursor.ok_or_else(|| {
                AppError::upstream(
                    format!("query {source_id}"),
                    format!("page {pages} reports more results but no next cursor"),
                )
            })?);
        }

        log::info!(
            "Fetched {} entries from {} in {} page(s)",
            entries.len(),
            source_id,
            pages
        );
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{Block, EntryPage};
    use crate::store::MemoryStore;

    /// Serves pre-built pages in order and records the cursors it was asked for.
    struct ScriptedStore {
        pages: Mutex<Vec<Result<EntryPage>>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedStore {
        fn new(pages: Vec<Result<EntryPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().rev().collect()),
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for ScriptedStore {
        async fn query(
            &self,
            _source_id: &str,
            cursor: Option<&str>,
            _page_size: usize,
        ) -> Result<EntryPage> {
            self.cursors.lock().unwrap().push(cursor.map(String::from));
            self.pages
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AppError::upstream("query", "no more pages scripted")))
        }

        async fn list_blocks(&self, _entry_id: &str) -> Result<Vec<Block>> {
            Ok(Vec::new())
        }
    }

    fn page(range: std::ops::Range<usize>, next: Option<&str>) -> Result<EntryPage> {
        Ok(EntryPage {
            results: range.map(|i| Entry::new(format!("e{i}"), "")).collect(),
            has_more: next.is_some(),
            next_cursor: next.map(String::from),
        })
    }

    #[tokio::test]
    async fn test_fetches_every_page_in_order() {
        let entries: Vec<Entry> = (0..250)
            .map(|i| Entry::new(format!("e{i}"), format!("Entry {i}")))
            .collect();
        let store = Arc::new(MemoryStore::new(entries));
        let fetcher = CatalogFetcher::new(store.clone());

        let fetched = fetcher.fetch_all("db").await.unwrap();

        assert_eq!(fetched.len(), 250);
        assert_eq!(store.query_count(), 3);
        let unique: HashSet<&str> = fetched.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(unique.len(), 250);
        assert!(
            fetched
                .iter()
                .enumerate()
                .all(|(i, e)| e.id == format!("e{i}"))
        );
    }

    #[tokio::test]
    async fn test_passes_server_cursors() {
        let store = Arc::new(ScriptedStore::new(vec![
            page(0..100, Some("c1")),
            page(100..200, Some("c2")),
            page(200..250, None),
        ]));
        let fetcher = CatalogFetcher::new(store.clone());

        let fetched = fetcher.fetch_all("db").await.unwrap();

        assert_eq!(fetched.len(), 250);
        assert_eq!(
            *store.cursors.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_page_aborts() {
        let store = Arc::new(ScriptedStore::new(vec![
            page(0..100, Some("c1")),
            Err(AppError::upstream("query", "503 Service Unavailable")),
            page(200..250, None),
        ]));
        let fetcher = CatalogFetcher::new(store);

        let err = fetcher.fetch_all("db").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_missing_cursor_is_an_error() {
        let store = Arc::new(ScriptedStore::new(vec![Ok(EntryPage {
            results: vec![Entry::new("a", "")],
            has_more: true,
            next_cursor: None,
        })]));
        let fetcher = CatalogFetcher::new(store);

        assert!(fetcher.fetch_all("db").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_source() {
        let fetcher = CatalogFetcher::new(Arc::new(MemoryStore::default()));
        assert!(fetcher.fetch_all("db").await.unwrap().is_empty());
    }
}
