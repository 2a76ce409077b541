use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("kuckmal.db")
}

/// Remote catalog feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// URL of the complete catalog archive.
    #[serde(default = "default_full_url")]
    pub full_url: String,
    /// URL of the incremental diff archive.
    #[serde(default = "default_diff_url")]
    pub diff_url: String,
    /// Directory for the downloaded catalog file and temp artifacts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Request timeout in seconds.
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u32,
    /// A local catalog file younger than this is considered current.
    #[serde(default = "default_stale_after")]
    pub stale_after_hours: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            full_url: default_full_url(),
            diff_url: default_diff_url(),
            data_dir: default_data_dir(),
            timeout_secs: default_feed_timeout(),
            stale_after_hours: default_stale_after(),
        }
    }
}

fn default_full_url() -> String {
    "https://liste.mediathekview.de/Filmliste-akt.xz".to_string()
}

fn default_diff_url() -> String {
    "https://liste.mediathekview.de/Filmliste-diff.xz".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_feed_timeout() -> u32 {
    120
}

fn default_stale_after() -> u32 {
    24
}

/// Ingestion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Records per store batch. Bounds peak memory during ingestion.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    4000
}

/// Query engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Maximum cached facet lists.
    #[serde(default = "default_cache_entries")]
    pub cache_entries: usize,
    /// Cache entry lifetime in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Hard cap on text-search result size.
    #[serde(default = "default_search_cap")]
    pub max_search_results: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            cache_entries: default_cache_entries(),
            cache_ttl_secs: default_cache_ttl(),
            max_search_results: default_search_cap(),
        }
    }
}

fn default_cache_entries() -> usize {
    64
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_search_cap() -> u32 {
    250
}

/// Sanitized config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub feed: FeedConfig,
    pub ingest: IngestConfig,
    pub query: QueryConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            feed: config.feed.clone(),
            ingest: config.ingest.clone(),
            query: config.query.clone(),
        }
    }
}
