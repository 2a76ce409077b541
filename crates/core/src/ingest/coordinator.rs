//! The ingestion coordinator - chunked streaming of the catalog feed into
//! the persistent store.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{FeedConfig, IngestConfig};
use crate::entry::MediaEntry;
use crate::feed::{
    open_catalog, CatalogPaths, FeedError, FeedFetcher, Normalizer, ProgressFn, RecordScanner,
};
use crate::metrics::{INGEST_DURATION, INGEST_RECORDS, INGEST_RUNS};
use crate::store::MediaStore;

use super::{CancelFlag, IngestError, IngestEvent, IngestMode};

/// Read granularity of the decompressed stream.
const CHUNK_SIZE: usize = 64 * 1024;

/// Batches buffered between the parse task and the insert loop. Keeps the
/// parser one batch ahead of the store without unbounded queueing.
const BATCH_PIPELINE_DEPTH: usize = 2;

/// Drives fetch -> decompress -> parse -> normalize -> batch-upsert.
///
/// The coordinator is the only writer to the store. Batch inserts are
/// serialized; parse/normalize of the next batch overlaps the insert of the
/// previous one through a bounded channel. At most one run is active per
/// coordinator - a second invocation fails with
/// [`IngestError::AlreadyRunning`].
pub struct CatalogIngestor {
    store: Arc<dyn MediaStore>,
    fetcher: Arc<dyn FeedFetcher>,
    paths: CatalogPaths,
    feed: FeedConfig,
    batch_size: usize,
    active: AtomicBool,
}

impl CatalogIngestor {
    pub fn new(
        store: Arc<dyn MediaStore>,
        fetcher: Arc<dyn FeedFetcher>,
        feed: FeedConfig,
        ingest: IngestConfig,
    ) -> Self {
        let paths = CatalogPaths::new(feed.data_dir.clone());
        Self {
            store,
            fetcher,
            paths,
            feed,
            batch_size: ingest.batch_size,
            active: AtomicBool::new(false),
        }
    }

    /// Whether a run is currently active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Replace the whole catalog from the full feed.
    ///
    /// Clears the store before the first insert; the clear must succeed
    /// before any batch is written so old and new data never mix.
    pub async fn full_load(
        &self,
        events: mpsc::Sender<IngestEvent>,
        cancel: CancelFlag,
    ) -> Result<u64, IngestError> {
        self.run(IngestMode::FullLoad, events, cancel).await
    }

    /// Merge the incremental diff feed into the existing catalog.
    ///
    /// No clearing step: every record upserts on the (channel, theme, title)
    /// key, so changed records update in place and new ones are added. Rows
    /// absent from the diff are never deleted.
    pub async fn apply_diff(
        &self,
        events: mpsc::Sender<IngestEvent>,
        cancel: CancelFlag,
    ) -> Result<u64, IngestError> {
        self.run(IngestMode::Diff, events, cancel).await
    }

    async fn run(
        &self,
        mode: IngestMode,
        events: mpsc::Sender<IngestEvent>,
        cancel: CancelFlag,
    ) -> Result<u64, IngestError> {
        let _guard = RunGuard::acquire(&self.active)?;
        let start = Instant::now();
        let mut committed: u64 = 0;

        let result = self
            .run_inner(mode, &events, &cancel, &mut committed)
            .await;

        INGEST_DURATION
            .with_label_values(&[mode.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(records) => {
                INGEST_RUNS
                    .with_label_values(&[mode.as_str(), "completed"])
                    .inc();
                INGEST_RECORDS.inc_by(*records);
                info!(mode = mode.as_str(), records, "Ingestion completed");
                let _ = events.send(IngestEvent::Completed { records: *records }).await;
            }
            Err(e) => {
                INGEST_RUNS
                    .with_label_values(&[mode.as_str(), "failed"])
                    .inc();
                INGEST_RECORDS.inc_by(committed);
                warn!(mode = mode.as_str(), records = committed, error = %e, "Ingestion failed");
                let _ = events
                    .send(IngestEvent::Failed {
                        error: e.to_string(),
                        records: committed,
                    })
                    .await;
            }
        }

        result
    }

    async fn run_inner(
        &self,
        mode: IngestMode,
        events: &mpsc::Sender<IngestEvent>,
        cancel: &CancelFlag,
        committed: &mut u64,
    ) -> Result<u64, IngestError> {
        self.paths.prepare().await.map_err(IngestError::Feed)?;

        let (url, target) = match mode {
            IngestMode::FullLoad => (self.feed.full_url.as_str(), self.paths.catalog_file()),
            IngestMode::Diff => (self.feed.diff_url.as_str(), self.paths.diff_file()),
        };

        // A full catalog downloaded within the staleness window is reused;
        // diffs are always fetched fresh.
        let reuse_local = mode == IngestMode::FullLoad
            && CatalogPaths::is_current(&target, self.feed.stale_after_hours);

        if reuse_local {
            debug!(path = %target.display(), "Reusing current local catalog file");
        } else {
            let partial = self.paths.partial_for(&target);
            let progress_events = events.clone();
            let progress: ProgressFn = Arc::new(move |bytes, total| {
                // Lossy on purpose - byte progress is advisory
                let _ = progress_events.try_send(IngestEvent::Downloading { bytes, total });
            });
            let bytes = self
                .fetcher
                .fetch(url, &partial, cancel, Some(progress))
                .await?;
            tokio::fs::rename(&partial, &target)
                .await
                .map_err(|e| IngestError::Feed(e.into()))?;
            debug!(url, bytes, "Catalog archive downloaded");
        }

        if mode == IngestMode::FullLoad {
            let store = Arc::clone(&self.store);
            tokio::task::spawn_blocking(move || store.delete_all())
                .await
                .map_err(|e| IngestError::Store {
                    source: crate::store::StoreError::Database(e.to_string()),
                    records: 0,
                })?
                .map_err(|e| IngestError::Store {
                    source: e,
                    records: 0,
                })?;
            debug!("Store cleared for full load");
        }

        let _ = events.send(IngestEvent::Decompressing).await;

        let (batch_tx, mut batch_rx) = mpsc::channel::<Vec<MediaEntry>>(BATCH_PIPELINE_DEPTH);
        let parse_path = target.clone();
        let batch_size = self.batch_size;
        let parse_cancel = cancel.clone();

        let parser = tokio::task::spawn_blocking(move || -> Result<u64, FeedError> {
            let mut stream = open_catalog(&parse_path)?;
            let mut scanner = RecordScanner::new();
            let mut normalizer = Normalizer::new();
            let mut raw = Vec::new();
            let mut batch: Vec<MediaEntry> = Vec::with_capacity(batch_size);
            let mut parsed: u64 = 0;
            let mut buf = vec![0u8; CHUNK_SIZE];

            loop {
                if parse_cancel.is_cancelled() {
                    return Err(FeedError::Cancelled);
                }
                let read = stream
                    .read(&mut buf)
                    .map_err(|e| FeedError::Decompression(e.to_string()))?;
                if read == 0 {
                    break;
                }
                scanner.push(&buf[..read], &mut raw)?;
                for record in raw.drain(..) {
                    batch.push(normalizer.normalize(&record));
                    parsed += 1;
                    if batch.len() >= batch_size {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                        if batch_tx.blocking_send(full).is_err() {
                            // Insert side went away; it knows why.
                            return Ok(parsed);
                        }
                    }
                }
            }

            scanner.finish()?;
            if !batch.is_empty() {
                let _ = batch_tx.blocking_send(batch);
            }
            Ok(parsed)
        });

        // Serialized insert loop: one batch commits at a time, and the next
        // batch is already being parsed while this one is in the store.
        let mut store_failure: Option<IngestError> = None;
        while let Some(batch) = batch_rx.recv().await {
            if cancel.is_cancelled() {
                break;
            }
            let store = Arc::clone(&self.store);
            let batch_len = batch.len() as u64;
            let insert = tokio::task::spawn_blocking(move || store.insert_batch(&batch))
                .await
                .unwrap_or_else(|e| {
                    Err(crate::store::StoreError::Database(e.to_string()))
                });

            match insert {
                Ok(()) => {
                    *committed += batch_len;
                    let _ = events
                        .send(IngestEvent::Committed {
                            records: *committed,
                        })
                        .await;
                }
                Err(e) => {
                    store_failure = Some(IngestError::Store {
                        source: e,
                        records: *committed,
                    });
                    break;
                }
            }
        }

        // Unblock the parser if it is still producing; the run is over.
        drop(batch_rx);

        if let Some(failure) = store_failure {
            return Err(failure);
        }

        // All inserts have drained; now require the parse to have finished
        // cleanly before declaring the run complete.
        let parsed = parser
            .await
            .map_err(|e| IngestError::Feed(FeedError::Parse(e.to_string())))??;

        if cancel.is_cancelled() {
            return Err(IngestError::Feed(FeedError::Cancelled));
        }

        debug_assert_eq!(parsed, *committed);
        Ok(*committed)
    }
}

/// Holds the at-most-one-run invariant; released on drop.
struct RunGuard<'a> {
    active: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(active: &'a AtomicBool) -> Result<Self, IngestError> {
        if active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(IngestError::AlreadyRunning);
        }
        Ok(Self { active })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
