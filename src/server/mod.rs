//! HTTP boundary for the archive.
//!
//! Serves body content straight from the store and search/facets from the
//! current [`Snapshot`]. Syncs replace the snapshot wholesale; readers hold an
//! `Arc` to whichever snapshot was current when they started.
//!
//! | route                         | response                          |
//! |-------------------------------|-----------------------------------|
//! | `GET /content?pageId=<id>`    | `{content}`                       |
//! | `GET /search?query=&month=`   | `{total, count, month, results}`  |
//! | `GET /facets`                 | `{total, buckets}`                |
//! | `GET /status`                 | `{entries, ready, syncing, ...}`  |
//! | `POST /sync`                  | `202` / `409`                     |

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::pipeline::Snapshot;
use crate::pipeline::sync::{fetch_catalog, warm};
use crate::store::DocumentStore;

pub use handlers::{ApiError, EntrySummary};

/// Shared server state.
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    config: Config,
    snapshot: RwLock<Arc<Snapshot>>,
    syncing: AtomicBool,
}

/// Clears the sync flag when the owning sync finishes, however it finishes.
struct SyncGuard(Arc<AppState>);

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.0.syncing.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self {
            store,
            config,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            syncing: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// The snapshot current at the time of the call.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    fn try_begin_sync(self: &Arc<Self>) -> Option<SyncGuard> {
        self.syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SyncGuard(Arc::clone(self)))
    }

    /// Run a full sync and wait for it.
    pub async fn sync(self: &Arc<Self>) -> Result<()> {
        let _guard = self
            .try_begin_sync()
            .ok_or_else(|| AppError::validation("a sync is already running"))?;
        self.rebuild().await
    }

    /// Start a full sync in the background. Returns `false` if one is running.
    pub fn start_sync(self: &Arc<Self>) -> bool {
        let Some(guard) = self.try_begin_sync() else {
            return false;
        };

        let state = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = state.rebuild().await {
                error!("Sync failed, keeping previous snapshot: {}", e);
            }
        });
        true
    }

    async fn rebuild(&self) -> Result<()> {
        let snapshot = fetch_catalog(Arc::clone(&self.store), &self.config).await?;
        info!(
            "Catalog listed: {} entries, warming content cache",
            snapshot.entries().len()
        );
        self.publish(snapshot.clone()).await;

        let snapshot = warm(snapshot, self.store.as_ref(), &self.config).await;
        info!(
            "Content cache ready: {} entries, {} bodies failed",
            snapshot.entries().len(),
            snapshot.cache().failed_count()
        );
        self.publish(snapshot).await;
        Ok(())
    }

    async fn publish(&self, snapshot: Snapshot) {
        *self.snapshot.write().await = Arc::new(snapshot);
    }
}

/// Build the router.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/content", get(handlers::content_handler))
        .route("/search", get(handlers::search_handler))
        .route("/facets", get(handlers::facets_handler))
        .route("/status", get(handlers::status_handler))
        .route("/sync", post(handlers::sync_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Archive server listening on {}", addr);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use super::*;
    use crate::models::{Block, BlockKind, Entry};
    use crate::store::MemoryStore;

    fn state() -> Arc<AppState> {
        let entries = vec![
            Entry::new("a", "Shopping").with_date("2024-01-05"),
            Entry::new("b", "Keiko").with_date("2024-01-20"),
            Entry::new("c", "Shiai").with_date("2024-03-01"),
        ];
        let store = MemoryStore::new(entries)
            .with_blocks(
                "a",
                vec![
                    Block::new(BlockKind::Heading2, ["List"]),
                    Block::new(BlockKind::BulletedListItem, ["buy milk"]),
                ],
            )
            .failing("c");

        let mut config = Config::default();
        config.store.database_id = "db".into();
        Arc::new(AppState::new(Arc::new(store), config))
    }

    async fn call(state: Arc<AppState>, method: Method, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = create_app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_content_returns_flattened_body() {
        let (status, body) = call(state(), Method::GET, "/content?pageId=a").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "## List\n\n- buy milk");
    }

    #[tokio::test]
    async fn test_content_requires_page_id() {
        let (status, body) = call(state(), Method::GET, "/content").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("pageId"));

        let (status, _) = call(state(), Method::GET, "/content?pageId=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_content_malformed_query_is_json_error() {
        let (status, body) = call(state(), Method::GET, "/content?pageId=a&pageId=b").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_content_upstream_failure_is_generic() {
        let (status, body) = call(state(), Method::GET, "/content?pageId=c").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_search_waits_for_ready_cache() {
        let (status, _) = call(state(), Method::GET, "/search?query=milk").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_search_after_sync() {
        let state = state();
        state.sync().await.unwrap();
        assert!(!state.is_syncing());

        let (status, body) = call(Arc::clone(&state), Method::GET, "/search?query=MILK").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["total"], 3);
        assert_eq!(body["results"][0]["id"], "a");

        let (_, body) = call(Arc::clone(&state), Method::GET, "/search?month=2024-01").await;
        let ids: Vec<&str> = body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[tokio::test]
    async fn test_facets_and_status() {
        let state = state();
        state.sync().await.unwrap();

        let (status, body) = call(Arc::clone(&state), Method::GET, "/facets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["buckets"][0]["monthKey"], "2024-03");
        assert_eq!(body["buckets"][1]["count"], 2);

        let (_, body) = call(state, Method::GET, "/status").await;
        assert_eq!(body["ready"], true);
        assert_eq!(body["entries"], 3);
        assert_eq!(body["failed"], 1);
    }

    #[tokio::test]
    async fn test_sync_endpoint_accepts_then_conflicts() {
        let state = state();
        let guard = state.try_begin_sync().unwrap();

        let (status, _) = call(Arc::clone(&state), Method::POST, "/sync").await;
        assert_eq!(status, StatusCode::CONFLICT);

        drop(guard);
        let (status, _) = call(state, Method::POST, "/sync").await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_background_sync_becomes_ready() {
        let state = state();
        let (status, _) = call(Arc::clone(&state), Method::POST, "/sync").await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let mut ready = false;
        for _ in 0..200 {
            let (_, body) = call(Arc::clone(&state), Method::GET, "/status").await;
            if body["ready"] == true {
                ready = true;
                assert_eq!(body["entries"], 3);
                assert_eq!(body["failed"], 1);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(ready, "background sync never published a ready snapshot");

        let (status, body) = call(state, Method::GET, "/search?query=milk").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["id"], "a");
    }
}
