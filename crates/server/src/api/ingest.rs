//! Ingestion control API handlers.
//!
//! Runs execute in background tasks; these handlers only start, observe and
//! cancel them. The coordinator enforces that at most one run is active.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use kuckmal_core::{CancelFlag, IngestEvent, IngestMode};

use crate::state::AppState;

use super::catalog::ErrorResponse;

/// Buffered events between a running ingestion and the status tracker.
const EVENT_BUFFER_SIZE: usize = 64;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct IngestStatusResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<IngestMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event: Option<IngestEvent>,
}

/// POST /api/v1/catalog/refresh
///
/// Start a full load (clear-then-insert) in the background.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SuccessResponse>), (StatusCode, Json<ErrorResponse>)> {
    start_run(state, IngestMode::FullLoad)
}

/// POST /api/v1/catalog/update
///
/// Start a diff apply (merge, no deletion) in the background.
pub async fn update(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SuccessResponse>), (StatusCode, Json<ErrorResponse>)> {
    start_run(state, IngestMode::Diff)
}

fn start_run(
    state: Arc<AppState>,
    mode: IngestMode,
) -> Result<(StatusCode, Json<SuccessResponse>), (StatusCode, Json<ErrorResponse>)> {
    if state.ingestor().is_active() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "an ingestion run is already active".to_string(),
            }),
        ));
    }

    let (tx, mut rx) = mpsc::channel::<IngestEvent>(EVENT_BUFFER_SIZE);
    let cancel = CancelFlag::new();
    state.begin_ingest(mode, cancel.clone());

    // Mirror run events into shared state; drop cached facets once the
    // store has been written.
    let tracker = Arc::clone(&state);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let terminal = event.is_terminal();
            tracker.record_ingest_event(event);
            if terminal {
                tracker.engine().invalidate();
            }
        }
    });

    let runner = Arc::clone(&state);
    tokio::spawn(async move {
        let result = match mode {
            IngestMode::FullLoad => runner.ingestor().full_load(tx, cancel).await,
            IngestMode::Diff => runner.ingestor().apply_diff(tx, cancel).await,
        };
        if let Err(e) = result {
            warn!(mode = mode.as_str(), error = %e, "Background ingestion run failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(SuccessResponse {
            message: format!("{} started", mode.as_str()),
        }),
    ))
}

/// POST /api/v1/catalog/cancel
///
/// Cancel the active run. Already-committed batches are kept.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !state.ingestor().is_active() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "no ingestion run is active".to_string(),
            }),
        ));
    }

    match state.cancel_flag() {
        Some(flag) => {
            flag.cancel();
            Ok(Json(SuccessResponse {
                message: "cancellation requested".to_string(),
            }))
        }
        None => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "no ingestion run is active".to_string(),
            }),
        )),
    }
}

/// GET /api/v1/catalog/ingest
///
/// Snapshot of the current/last ingestion run.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<IngestStatusResponse> {
    let (active, mode, last_event) = state.ingest_snapshot();
    Json(IngestStatusResponse {
        active,
        mode,
        last_event,
    })
}
