pub mod config;
pub mod entry;
pub mod feed;
pub mod ingest;
pub mod metrics;
pub mod query;
pub mod store;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    FeedConfig, IngestConfig, QueryConfig, SanitizedConfig, ServerConfig,
};
pub use entry::{broadcaster_for, resolve_quality_url, Broadcaster, MediaEntry};
pub use feed::{CatalogPaths, FeedError, FeedFetcher, HttpFeedFetcher};
pub use ingest::{CancelFlag, CatalogIngestor, IngestError, IngestEvent, IngestMode};
pub use query::{ChannelItem, QueryEngine};
pub use store::{
    EntryKey, MediaStore, SearchQuery, SqliteStore, StoreError, ThemeQuery, TitleQuery,
};
