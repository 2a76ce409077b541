//! Thin composition layer translating navigation state into store calls.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::QueryConfig;
use crate::entry::{broadcaster_for, MediaEntry};
use crate::metrics::QUERIES;
use crate::store::{EntryKey, MediaStore, SearchQuery, StoreError, ThemeQuery, TitleQuery};

use super::FacetCache;

/// A channel facet row enriched with broadcaster display metadata, so
/// callers can render listing rows without a second round-trip.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Read-only query surface over the media store.
///
/// Stateless apart from its facet cache; safe to share and to run
/// concurrently with an ingestion run (the store serializes access).
pub struct QueryEngine {
    store: Arc<dyn MediaStore>,
    cache: FacetCache,
    max_search_results: u32,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn MediaStore>, config: &QueryConfig) -> Self {
        Self {
            store,
            cache: FacetCache::new(
                config.cache_entries,
                Duration::from_secs(config.cache_ttl_secs),
            ),
            max_search_results: config.max_search_results,
        }
    }

    /// Drop cached facet lists. Called after ingestion writes.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        self.store.count()
    }

    /// Distinct channels, cached.
    pub fn channels(&self) -> Result<Arc<Vec<String>>, StoreError> {
        QUERIES.with_label_values(&["channels"]).inc();
        if let Some(cached) = self.cache.get("channels") {
            return Ok(cached);
        }
        let channels = self.store.channels()?;
        Ok(self.cache.put("channels".to_string(), channels))
    }

    /// Channel facet with broadcaster display metadata.
    pub fn channel_items(&self) -> Result<Vec<ChannelItem>, StoreError> {
        let channels = self.channels()?;
        Ok(channels
            .iter()
            .map(|name| {
                let broadcaster = broadcaster_for(name);
                ChannelItem {
                    name: name.clone(),
                    abbreviation: broadcaster.map(|b| b.abbreviation.to_string()),
                    color: broadcaster.map(|b| b.color.to_string()),
                }
            })
            .collect())
    }

    /// Distinct themes, cached per query shape.
    pub fn themes(&self, query: &ThemeQuery) -> Result<Arc<Vec<String>>, StoreError> {
        QUERIES.with_label_values(&["themes"]).inc();
        let key = format!(
            "themes|{}|{}|{}|{}",
            query.channel.as_deref().unwrap_or(""),
            query.min_timestamp.unwrap_or(0),
            query.limit,
            query.offset
        );
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let themes = self.store.themes(query)?;
        Ok(self.cache.put(key, themes))
    }

    /// One representative entry per theme.
    pub fn theme_entries(&self, query: &ThemeQuery) -> Result<Vec<MediaEntry>, StoreError> {
        QUERIES.with_label_values(&["themes"]).inc();
        self.store.theme_entries(query)
    }

    /// Distinct titles, cached per query shape.
    pub fn titles(&self, query: &TitleQuery) -> Result<Arc<Vec<String>>, StoreError> {
        QUERIES.with_label_values(&["titles"]).inc();
        let key = format!(
            "titles|{}|{}|{}|{}|{}",
            query.channel.as_deref().unwrap_or(""),
            query.theme.as_deref().unwrap_or(""),
            query.min_timestamp.unwrap_or(0),
            query.limit,
            query.offset
        );
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let titles = self.store.titles(query)?;
        Ok(self.cache.put(key, titles))
    }

    /// One representative entry per title.
    pub fn title_entries(&self, query: &TitleQuery) -> Result<Vec<MediaEntry>, StoreError> {
        QUERIES.with_label_values(&["titles"]).inc();
        self.store.title_entries(query)
    }

    /// Point lookup by the most specific key available.
    pub fn entry(&self, key: &EntryKey) -> Result<MediaEntry, StoreError> {
        QUERIES.with_label_values(&["entry"]).inc();
        self.store.get(key)
    }

    /// Substring search, capped at the configured result limit.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<MediaEntry>, StoreError> {
        QUERIES.with_label_values(&["search"]).inc();
        let capped = SearchQuery {
            limit: query.limit.min(self.max_search_results),
            ..query.clone()
        };
        self.store.search(&capped)
    }

    /// Most recent entries at or after `min_timestamp`.
    pub fn recent(&self, min_timestamp: i64, limit: u32) -> Result<Vec<MediaEntry>, StoreError> {
        QUERIES.with_label_values(&["recent"]).inc();
        self.store.recent(min_timestamp, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn engine_with_entries(entries: &[MediaEntry]) -> (Arc<SqliteStore>, QueryEngine) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.insert_batch(entries).unwrap();
        let engine = QueryEngine::new(
            Arc::clone(&store) as Arc<dyn MediaStore>,
            &QueryConfig::default(),
        );
        (store, engine)
    }

    fn entry(channel: &str, theme: &str, title: &str) -> MediaEntry {
        MediaEntry {
            channel: channel.to_string(),
            theme: theme.to_string(),
            title: title.to_string(),
            ..MediaEntry::default()
        }
    }

    #[test]
    fn test_channels_are_cached_until_invalidated() {
        let (store, engine) = engine_with_entries(&[entry("ARD", "News", "A")]);

        assert_eq!(*engine.channels().unwrap(), vec!["ARD".to_string()]);

        // A write bypassing the engine is not visible until invalidation
        store.insert_batch(&[entry("ZDF", "heute", "B")]).unwrap();
        assert_eq!(engine.channels().unwrap().len(), 1);

        engine.invalidate();
        assert_eq!(engine.channels().unwrap().len(), 2);
    }

    #[test]
    fn test_channel_items_carry_broadcaster_metadata() {
        let (_store, engine) = engine_with_entries(&[
            entry("ZDF", "heute", "A"),
            entry("Kanal Unbekannt", "X", "B"),
        ]);

        let items = engine.channel_items().unwrap();
        let zdf = items.iter().find(|i| i.name == "ZDF").unwrap();
        assert_eq!(zdf.abbreviation.as_deref(), Some("ZDF"));
        assert_eq!(zdf.color.as_deref(), Some("#fa7d19"));

        let unknown = items.iter().find(|i| i.name == "Kanal Unbekannt").unwrap();
        assert!(unknown.abbreviation.is_none());
    }

    #[test]
    fn test_themes_cache_is_keyed_by_query() {
        let (_store, engine) = engine_with_entries(&[
            entry("ARD", "News", "A"),
            entry("ZDF", "heute", "B"),
        ]);

        let ard = engine
            .themes(&ThemeQuery {
                channel: Some("ARD".to_string()),
                ..Default::default()
            })
            .unwrap();
        let zdf = engine
            .themes(&ThemeQuery {
                channel: Some("ZDF".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(*ard, vec!["News".to_string()]);
        assert_eq!(*zdf, vec!["heute".to_string()]);
    }

    #[test]
    fn test_search_is_capped() {
        let entries: Vec<MediaEntry> = (0..20)
            .map(|i| entry("ARD", "News", &format!("Wahl {}", i)))
            .collect();
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.insert_batch(&entries).unwrap();

        let config = QueryConfig {
            max_search_results: 5,
            ..QueryConfig::default()
        };
        let engine = QueryEngine::new(Arc::clone(&store) as Arc<dyn MediaStore>, &config);

        let results = engine
            .search(&SearchQuery {
                limit: 100,
                ..SearchQuery::new("Wahl")
            })
            .unwrap();
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn test_entry_lookup() {
        let (_store, engine) = engine_with_entries(&[entry("ARD", "News", "A")]);
        assert!(engine.entry(&EntryKey::new("ARD", "News", "A")).is_ok());
        assert!(matches!(
            engine.entry(&EntryKey::new("ARD", "News", "missing")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_recent_passthrough() {
        let mut old = entry("ARD", "News", "Old");
        old.timestamp = 10;
        let mut new = entry("ARD", "News", "New");
        new.timestamp = 100;
        let (_store, engine) = engine_with_entries(&[old, new]);

        let recent = engine.recent(50, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "New");
    }
}
