//! Catalog query API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use kuckmal_core::store::{EntryKey, SearchQuery, ThemeQuery, TitleQuery};
use kuckmal_core::{ChannelItem, MediaEntry, StoreError};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
pub struct ThemeParams {
    #[serde(default)]
    pub channel: Option<String>,
    /// Only themes with an entry newer than this many hours.
    #[serde(default)]
    pub since_hours: Option<u32>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    /// Return one representative entry per theme instead of plain names.
    #[serde(default)]
    pub entries: bool,
}

#[derive(Debug, Deserialize)]
pub struct TitleParams {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub since_hours: Option<u32>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub entries: bool,
}

#[derive(Debug, Deserialize)]
pub struct EntryParams {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    #[serde(default = "default_recent_hours")]
    pub since_hours: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_recent_hours() -> u32 {
    24
}

#[derive(Debug, Serialize)]
pub struct ChannelsResponse {
    pub channels: Vec<ChannelItem>,
}

#[derive(Debug, Serialize)]
pub struct NamesResponse {
    pub values: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<MediaEntry>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_entries: u64,
    pub ingest_active: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn store_error(e: StoreError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn min_timestamp(since_hours: Option<u32>) -> Option<i64> {
    since_hours.map(|hours| Utc::now().timestamp() - hours as i64 * 3600)
}

fn names_response(values: Vec<String>) -> Response {
    let total = values.len();
    Json(NamesResponse { values, total }).into_response()
}

fn entries_response(entries: Vec<MediaEntry>) -> Response {
    let total = entries.len();
    Json(EntriesResponse { entries, total }).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/catalog/channels
///
/// Channel facet, enriched with broadcaster display metadata.
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChannelsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let channels = state.engine().channel_items().map_err(store_error)?;
    Ok(Json(ChannelsResponse { channels }))
}

/// GET /api/v1/catalog/themes
///
/// Theme facet, optionally scoped to a channel and a recency window.
pub async fn list_themes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ThemeParams>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let query = ThemeQuery {
        channel: params.channel,
        min_timestamp: min_timestamp(params.since_hours),
        limit: params.limit,
        offset: params.offset,
    };

    if params.entries {
        let entries = state.engine().theme_entries(&query).map_err(store_error)?;
        Ok(entries_response(entries))
    } else {
        let themes = state.engine().themes(&query).map_err(store_error)?;
        Ok(names_response(themes.as_ref().clone()))
    }
}

/// GET /api/v1/catalog/titles
///
/// Title facet, scoped to theme and/or channel.
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TitleParams>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let query = TitleQuery {
        channel: params.channel,
        theme: params.theme,
        min_timestamp: min_timestamp(params.since_hours),
        limit: params.limit,
        offset: params.offset,
    };

    if params.entries {
        let entries = state.engine().title_entries(&query).map_err(store_error)?;
        Ok(entries_response(entries))
    } else {
        let titles = state.engine().titles(&query).map_err(store_error)?;
        Ok(names_response(titles.as_ref().clone()))
    }
}

/// GET /api/v1/catalog/entry
///
/// Point lookup by the most specific key the caller has.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EntryParams>,
) -> Result<Json<MediaEntry>, (StatusCode, Json<ErrorResponse>)> {
    let key = EntryKey {
        channel: params.channel,
        theme: params.theme,
        title: params.title,
    };
    let entry = state.engine().entry(&key).map_err(store_error)?;
    Ok(Json(entry))
}

/// GET /api/v1/catalog/search
///
/// Case-insensitive substring search over title, theme and description.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<EntriesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let query = SearchQuery {
        text: params.q,
        channel: params.channel,
        theme: params.theme,
        limit: params.limit,
        offset: params.offset,
    };
    let entries = state.engine().search(&query).map_err(store_error)?;
    let total = entries.len();
    Ok(Json(EntriesResponse { entries, total }))
}

/// GET /api/v1/catalog/recent
///
/// Most recent entries within the given window, newest first.
pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentParams>,
) -> Result<Json<EntriesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let cutoff = Utc::now().timestamp() - params.since_hours as i64 * 3600;
    let entries = state
        .engine()
        .recent(cutoff, params.limit)
        .map_err(store_error)?;
    let total = entries.len();
    Ok(Json(EntriesResponse { entries, total }))
}

/// GET /api/v1/catalog/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let total_entries = state.engine().count().map_err(store_error)?;
    Ok(Json(StatsResponse {
        total_entries,
        ingest_active: state.ingestor().is_active(),
    }))
}
