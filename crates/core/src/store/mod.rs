//! Persistent media catalog - the durable store behind ingestion and queries.
//!
//! Entries are keyed by (channel, theme, title); both full loads and diff
//! applies write through `insert_batch`, which replaces on conflict. That is
//! what lets a diff record silently update an existing row's other fields
//! without creating a duplicate or needing a separate update path.

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::*;

use crate::entry::MediaEntry;

/// Trait for durable media catalog storage.
pub trait MediaStore: Send + Sync {
    /// Insert-or-replace a batch of entries, transactionally.
    ///
    /// Idempotent under identical input: inserting the same batch twice
    /// leaves the row count unchanged and the stored values equal to the
    /// second insertion's values.
    fn insert_batch(&self, entries: &[MediaEntry]) -> Result<(), StoreError>;

    /// Unconditional truncate.
    fn delete_all(&self) -> Result<(), StoreError>;

    /// Total row count.
    fn count(&self) -> Result<u64, StoreError>;

    /// Distinct channel names, sorted ascending.
    fn channels(&self) -> Result<Vec<String>, StoreError>;

    /// Distinct theme names matching the query, sorted ascending.
    fn themes(&self, query: &ThemeQuery) -> Result<Vec<String>, StoreError>;

    /// One representative entry per distinct theme matching the query.
    fn theme_entries(&self, query: &ThemeQuery) -> Result<Vec<MediaEntry>, StoreError>;

    /// Distinct titles matching the query, sorted ascending.
    fn titles(&self, query: &TitleQuery) -> Result<Vec<String>, StoreError>;

    /// One representative entry per distinct title matching the query.
    fn title_entries(&self, query: &TitleQuery) -> Result<Vec<MediaEntry>, StoreError>;

    /// Point lookup by the most specific key the caller has.
    fn get(&self, key: &EntryKey) -> Result<MediaEntry, StoreError>;

    /// Case-insensitive substring search over title, theme and description.
    ///
    /// Results come back in match (insertion) order.
    fn search(&self, query: &SearchQuery) -> Result<Vec<MediaEntry>, StoreError>;

    /// Entries with `timestamp >= min_timestamp`, most recent first.
    fn recent(&self, min_timestamp: i64, limit: u32) -> Result<Vec<MediaEntry>, StoreError>;
}
