//! Types for the ingestion coordinator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::feed::FeedError;
use crate::store::StoreError;

/// Which feed an ingestion run consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Clear the store, then stream the complete catalog in.
    FullLoad,
    /// Merge the incremental feed into the existing catalog.
    Diff,
}

impl IngestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestMode::FullLoad => "full_load",
            IngestMode::Diff => "diff",
        }
    }
}

/// Progress and terminal events emitted during an ingestion run.
///
/// `Committed.records` is cumulative and monotonically non-decreasing;
/// exactly one terminal event (`Completed` or `Failed`) ends every run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IngestEvent {
    Downloading {
        bytes: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
    },
    Decompressing,
    Committed {
        records: u64,
    },
    Completed {
        records: u64,
    },
    Failed {
        error: String,
        records: u64,
    },
}

impl IngestEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestEvent::Completed { .. } | IngestEvent::Failed { .. })
    }
}

/// Errors terminating an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Another run is active on this coordinator.
    #[error("an ingestion run is already active")]
    AlreadyRunning,

    /// Transport, decompression or parse failure.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Store failure; committed batches before it stay committed.
    #[error("store error after {records} records: {source}")]
    Store { source: StoreError, records: u64 },
}

/// Shared cancellation flag for a download or ingestion run.
///
/// Cancellation stops further batch inserts; already-committed batches are
/// kept (re-running the ingestion is the recovery path).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
