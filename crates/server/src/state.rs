use std::sync::{Arc, RwLock};

use kuckmal_core::{
    CancelFlag, CatalogIngestor, Config, IngestEvent, IngestMode, QueryEngine, SanitizedConfig,
};

/// Snapshot of the most recent ingestion activity, kept for the status
/// endpoint. The coordinator itself owns the at-most-one-run invariant; this
/// only mirrors what it last reported.
#[derive(Default)]
pub struct IngestTracker {
    pub mode: Option<IngestMode>,
    pub last_event: Option<IngestEvent>,
    pub cancel: Option<CancelFlag>,
}

/// Shared application state
pub struct AppState {
    config: Config,
    engine: QueryEngine,
    ingestor: Arc<CatalogIngestor>,
    ingest: RwLock<IngestTracker>,
}

impl AppState {
    pub fn new(config: Config, engine: QueryEngine, ingestor: Arc<CatalogIngestor>) -> Self {
        Self {
            config,
            engine,
            ingestor,
            ingest: RwLock::new(IngestTracker::default()),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn ingestor(&self) -> &Arc<CatalogIngestor> {
        &self.ingestor
    }

    pub fn begin_ingest(&self, mode: IngestMode, cancel: CancelFlag) {
        let mut tracker = self.ingest.write().unwrap();
        tracker.mode = Some(mode);
        tracker.last_event = None;
        tracker.cancel = Some(cancel);
    }

    pub fn record_ingest_event(&self, event: IngestEvent) {
        let mut tracker = self.ingest.write().unwrap();
        tracker.last_event = Some(event);
    }

    pub fn ingest_snapshot(&self) -> (bool, Option<IngestMode>, Option<IngestEvent>) {
        let tracker = self.ingest.read().unwrap();
        (
            self.ingestor.is_active(),
            tracker.mode,
            tracker.last_event.clone(),
        )
    }

    pub fn cancel_flag(&self) -> Option<CancelFlag> {
        self.ingest.read().unwrap().cancel.clone()
    }
}
