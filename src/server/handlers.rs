//! Route handlers and their wire types.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};

use super::AppState;
use crate::error::AppError;
use crate::models::{Entry, FacetBucket};
use crate::pipeline::MonthFilter;
use crate::services::fetch_entry_text;

/// Error returned by handlers.
///
/// Upstream details are logged, never sent to the client.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    BadQuery(QueryRejection),
    NotReady,
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::App(e @ AppError::MissingParameter(_)) => {
                warn!("Rejected request: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Self::App(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            Self::BadQuery(rejection) => {
                warn!("Rejected query string: {}", rejection);
                (StatusCode::BAD_REQUEST, rejection.body_text())
            }
            Self::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Archive is still syncing".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentParams {
    #[serde(rename = "pageId")]
    page_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    content: String,
}

/// GET /content?pageId=<id> - Flattened body of one entry
///
/// # Errors
/// - 400 Bad Request: `pageId` missing, empty or malformed
/// - 500 Internal Server Error: the store failed
pub async fn content_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ContentParams>, QueryRejection>,
) -> Result<Json<ContentResponse>, ApiError> {
    let Query(params) = params.map_err(ApiError::BadQuery)?;
    let page_id = params
        .page_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::missing("pageId"))?;

    debug!("Content request for {}", page_id);
    let content = fetch_entry_text(state.store(), &page_id).await?;
    Ok(Json(ContentResponse { content }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    month: Option<String>,
}

/// Entry fields sent to the presentation layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl From<&Entry> for EntrySummary {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            date: entry.date.clone(),
            media_ref: entry.media_ref.clone(),
            thumbnail_url: entry.thumbnail_url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    total: usize,
    count: usize,
    month: String,
    results: Vec<EntrySummary>,
}

/// GET /search?query=<q>&month=<YYYY-MM|all> - Filtered, date-ordered entries
///
/// # Errors
/// - 503 Service Unavailable: the content cache is not ready yet
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let snapshot = state.snapshot().await;
    if !snapshot.is_ready() {
        return Err(ApiError::NotReady);
    }

    let month = MonthFilter::parse(params.month.as_deref().unwrap_or("all"));
    let results: Vec<EntrySummary> = snapshot
        .search(&params.query, &month)
        .into_iter()
        .map(EntrySummary::from)
        .collect();

    Ok(Json(SearchResponse {
        total: snapshot.entries().len(),
        count: results.len(),
        month: month.to_string(),
        results,
    }))
}

#[derive(Debug, Serialize)]
pub struct FacetsResponse {
    total: usize,
    buckets: Vec<FacetBucket>,
}

/// GET /facets - Month buckets, newest first
pub async fn facets_handler(State(state): State<Arc<AppState>>) -> Json<FacetsResponse> {
    let snapshot = state.snapshot().await;
    Json(FacetsResponse {
        total: snapshot.entries().len(),
        buckets: snapshot.facets().to_vec(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    entries: usize,
    ready: bool,
    syncing: bool,
    failed: usize,
    synced_at: Option<DateTime<Utc>>,
}

/// GET /status - Snapshot readiness
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.snapshot().await;
    Json(StatusResponse {
        entries: snapshot.entries().len(),
        ready: snapshot.is_ready(),
        syncing: state.is_syncing(),
        failed: snapshot.cache().failed_count(),
        synced_at: snapshot.synced_at(),
    })
}

/// POST /sync - Start a full rebuild in the background
pub async fn sync_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.start_sync() {
        (StatusCode::ACCEPTED, Json(json!({ "status": "started" })))
    } else {
        (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Sync already in progress" })),
        )
    }
}
