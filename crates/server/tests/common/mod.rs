//! Common test utilities for in-process API testing.
//!
//! Builds the full router over an in-memory store and a stub feed fetcher,
//! so tests exercise the real handlers without network or disk state.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use kuckmal_core::feed::ProgressFn;
use kuckmal_core::{
    CancelFlag, CatalogIngestor, Config, FeedError, FeedFetcher, MediaEntry, MediaStore,
    QueryEngine, SqliteStore,
};
use kuckmal_server::api::create_router;
use kuckmal_server::state::AppState;

/// Catalog document the stub fetcher serves: 3 records, one inheriting
/// channel and theme.
pub const TEST_DOC: &str = r#"{
    "Filmliste": ["07.08.2026, 09:00", "3"],
    "X": ["ARD", "News", "Tagesschau", "", "", "", "", "The evening news", "https://h/v.mp4", "", "", "", "", "", "", "", "1700000000", "", "", "false"],
    "X": ["", "", "Tagesthemen"],
    "X": ["ZDF", "heute", "heute journal", "", "", "", "", "", "", "", "", "", "", "", "", "", "1700000100", "", "", "true"]
}"#;

/// Serves a fixed document as the remote feed.
struct StubFetcher {
    content: Vec<u8>,
}

#[async_trait::async_trait]
impl FeedFetcher for StubFetcher {
    async fn fetch(
        &self,
        _url: &str,
        dest: &Path,
        _cancel: &CancelFlag,
        _progress: Option<ProgressFn>,
    ) -> Result<u64, FeedError> {
        tokio::fs::write(dest, &self.content).await?;
        Ok(self.content.len() as u64)
    }
}

/// In-process server fixture.
pub struct TestFixture {
    pub router: Router,
    pub store: Arc<SqliteStore>,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture whose feed fetcher serves [`TEST_DOC`].
    pub fn new() -> Self {
        Self::with_document(TEST_DOC)
    }

    pub fn with_document(document: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(SqliteStore::in_memory().expect("Failed to create store"));

        let mut config = Config::default();
        config.feed.data_dir = temp_dir.path().to_path_buf();

        let ingestor = Arc::new(CatalogIngestor::new(
            Arc::clone(&store) as Arc<dyn MediaStore>,
            Arc::new(StubFetcher {
                content: document.as_bytes().to_vec(),
            }),
            config.feed.clone(),
            config.ingest.clone(),
        ));
        let engine = QueryEngine::new(Arc::clone(&store) as Arc<dyn MediaStore>, &config.query);

        let state = Arc::new(AppState::new(config, engine, ingestor));
        let router = create_router(state);

        Self {
            router,
            store,
            temp_dir,
        }
    }

    /// Seed entries directly into the store, bypassing ingestion.
    pub fn seed(&self, entries: &[MediaEntry]) {
        self.store.insert_batch(entries).expect("Failed to seed store");
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request (handlers here take no body).
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };

        TestResponse { status, body }
    }

    /// Poll the ingest status endpoint until a terminal event is recorded.
    pub async fn wait_for_ingest_idle(&self) {
        for _ in 0..500 {
            let response = self.get("/api/v1/catalog/ingest").await;
            let state = response.body["last_event"]["state"].as_str();
            if response.body["active"] == Value::Bool(false)
                && matches!(state, Some("completed") | Some("failed"))
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("ingestion did not finish in time");
    }
}

/// Convenience entry constructor for seeding.
pub fn entry(channel: &str, theme: &str, title: &str) -> MediaEntry {
    MediaEntry {
        channel: channel.to_string(),
        theme: theme.to_string(),
        title: title.to_string(),
        ..MediaEntry::default()
    }
}
