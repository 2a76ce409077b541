//! Streaming catalog download.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::ingest::CancelFlag;

use super::FeedError;

/// Progress callback: (bytes downloaded so far, total bytes if known).
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Capability trait for streaming a remote catalog archive to a local file.
///
/// Implementations must remove the partial destination file when the
/// download fails or is cancelled.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Download `url` to `dest`, reporting progress along the way.
    ///
    /// Returns the number of bytes written.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelFlag,
        progress: Option<ProgressFn>,
    ) -> Result<u64, FeedError>;
}

/// HTTP implementation of [`FeedFetcher`] backed by reqwest.
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(timeout_secs: u32) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs as u64))
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    async fn stream_to_file(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelFlag,
        progress: Option<&ProgressFn>,
    ) -> Result<u64, FeedError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout
            } else {
                FeedError::Transport(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        let total = response.content_length();
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            if cancel.is_cancelled() {
                return Err(FeedError::Cancelled);
            }
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout
                } else {
                    FeedError::Transport(e.to_string())
                }
            })?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            if let Some(progress) = progress {
                progress(downloaded, total);
            }
        }

        file.flush().await?;
        debug!(url = url, bytes = downloaded, "Catalog download finished");
        Ok(downloaded)
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelFlag,
        progress: Option<ProgressFn>,
    ) -> Result<u64, FeedError> {
        match self
            .stream_to_file(url, dest, cancel, progress.as_ref())
            .await
        {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                // Partial downloads are never left behind.
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!(dest = %dest.display(), error = %rm, "Failed to remove partial download");
                    }
                }
                Err(e)
            }
        }
    }
}
