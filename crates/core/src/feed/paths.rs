//! Local catalog file locations and the staleness check.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::FeedError;

const CATALOG_FILE: &str = "Filmliste-akt.xz";
const DIFF_FILE: &str = "Filmliste-diff.xz";
const PARTIAL_SUFFIX: &str = ".part";

/// Resolved locations of the downloaded catalog artifacts inside the
/// app-local data directory.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    data_dir: PathBuf,
}

impl CatalogPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Ensure the data directory exists.
    pub async fn prepare(&self) -> Result<(), FeedError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    /// Path of the full catalog archive.
    pub fn catalog_file(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }

    /// Path of the diff archive.
    pub fn diff_file(&self) -> PathBuf {
        self.data_dir.join(DIFF_FILE)
    }

    /// In-progress download destination for `target`.
    pub fn partial_for(&self, target: &Path) -> PathBuf {
        let mut name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| CATALOG_FILE.to_string());
        name.push_str(PARTIAL_SUFFIX);
        self.data_dir.join(name)
    }

    /// Whether `path` exists and was modified within the last
    /// `max_age_hours` hours.
    pub fn is_current(path: &Path, max_age_hours: u32) -> bool {
        let Ok(metadata) = std::fs::metadata(path) else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age <= Duration::from_secs(max_age_hours as u64 * 3600),
            // Modified in the future: clock skew, treat as current
            Err(_) => true,
        }
    }
}
