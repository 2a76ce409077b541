//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ingestion (runs, records, durations)
//! - Query engine (operations, facet cache effectiveness)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Ingestion
// =============================================================================

/// Ingestion runs by mode and result.
pub static INGEST_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("kuckmal_ingest_runs_total", "Total ingestion runs"),
        &["mode", "result"], // mode: "full_load"/"diff", result: "completed"/"failed"
    )
    .unwrap()
});

/// Records committed to the store across all runs.
pub static INGEST_RECORDS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "kuckmal_ingest_records_total",
        "Total records committed by ingestion",
    )
    .unwrap()
});

/// Ingestion run duration in seconds.
pub static INGEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "kuckmal_ingest_duration_seconds",
            "Duration of an ingestion run",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["mode"],
    )
    .unwrap()
});

// =============================================================================
// Query engine
// =============================================================================

/// Query operations by kind.
pub static QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("kuckmal_queries_total", "Total catalog queries"),
        &["operation"], // "channels", "themes", "titles", "entry", "search", "recent"
    )
    .unwrap()
});

/// Facet cache lookups by outcome.
pub static FACET_CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kuckmal_facet_cache_lookups_total",
            "Facet cache lookups by outcome",
        ),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(INGEST_RUNS.clone()),
        Box::new(INGEST_RECORDS.clone()),
        Box::new(INGEST_DURATION.clone()),
        Box::new(QUERIES.clone()),
        Box::new(FACET_CACHE_LOOKUPS.clone()),
    ]
}
