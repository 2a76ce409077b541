//! SQLite-backed media store implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ToSql;
use rusqlite::{params_from_iter, Connection};

use super::{EntryKey, MediaStore, SearchQuery, StoreError, ThemeQuery, TitleQuery};
use crate::entry::MediaEntry;

const ENTRY_COLUMNS: &str = "channel, theme, title, date, time, duration, size_mb, description, \
     url, website, subtitle_url, url_small, url_hd, timestamp, geo, is_new";

/// SQLite-backed media store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store, creating the database file and tables if
    /// needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            -- One row per catalog item; (channel, theme, title) is the
            -- logical identity enforced by the primary key.
            CREATE TABLE IF NOT EXISTS media_entries (
                channel TEXT NOT NULL,
                theme TEXT NOT NULL,
                title TEXT NOT NULL,
                date TEXT NOT NULL DEFAULT '',
                time TEXT NOT NULL DEFAULT '',
                duration TEXT NOT NULL DEFAULT '',
                size_mb TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                website TEXT NOT NULL DEFAULT '',
                subtitle_url TEXT NOT NULL DEFAULT '',
                url_small TEXT NOT NULL DEFAULT '',
                url_hd TEXT NOT NULL DEFAULT '',
                timestamp INTEGER NOT NULL DEFAULT 0,
                geo TEXT NOT NULL DEFAULT '',
                is_new INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (channel, theme, title)
            );

            CREATE INDEX IF NOT EXISTS idx_media_entries_theme ON media_entries(theme);
            CREATE INDEX IF NOT EXISTS idx_media_entries_title ON media_entries(title);
            CREATE INDEX IF NOT EXISTS idx_media_entries_timestamp ON media_entries(timestamp);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<MediaEntry> {
        Ok(MediaEntry {
            channel: row.get(0)?,
            theme: row.get(1)?,
            title: row.get(2)?,
            date: row.get(3)?,
            time: row.get(4)?,
            duration: row.get(5)?,
            size_mb: row.get(6)?,
            description: row.get(7)?,
            url: row.get(8)?,
            website: row.get(9)?,
            subtitle_url: row.get(10)?,
            url_small: row.get(11)?,
            url_hd: row.get(12)?,
            timestamp: row.get(13)?,
            geo: row.get(14)?,
            is_new: row.get(15)?,
        })
    }

    fn query_entries(
        conn: &Connection,
        sql: &str,
        params: Vec<Box<dyn ToSql>>,
    ) -> Result<Vec<MediaEntry>, StoreError> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(params.iter()), Self::row_to_entry)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(entries)
    }

    fn query_strings(
        conn: &Connection,
        sql: &str,
        params: Vec<Box<dyn ToSql>>,
    ) -> Result<Vec<String>, StoreError> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut values = Vec::new();
        for row in rows {
            values.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(values)
    }

    /// Shared WHERE clause for theme facet queries.
    fn theme_conditions(query: &ThemeQuery) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(channel) = &query.channel {
            conditions.push("channel = ?");
            params.push(Box::new(channel.clone()));
        }
        if let Some(min_timestamp) = query.min_timestamp {
            conditions.push("timestamp >= ?");
            params.push(Box::new(min_timestamp));
        }

        (join_conditions(&conditions), params)
    }

    /// Shared WHERE clause for title facet queries.
    fn title_conditions(query: &TitleQuery) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(channel) = &query.channel {
            conditions.push("channel = ?");
            params.push(Box::new(channel.clone()));
        }
        if let Some(theme) = &query.theme {
            conditions.push("theme = ?");
            params.push(Box::new(theme.clone()));
        }
        if let Some(min_timestamp) = query.min_timestamp {
            conditions.push("timestamp >= ?");
            params.push(Box::new(min_timestamp));
        }

        (join_conditions(&conditions), params)
    }
}

fn join_conditions(conditions: &[&str]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

impl MediaStore for SqliteStore {
    fn insert_batch(&self, entries: &[MediaEntry]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare_cached(&format!(
                    "INSERT OR REPLACE INTO media_entries ({})
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    ENTRY_COLUMNS
                ))
                .map_err(|e| StoreError::Database(e.to_string()))?;

            for entry in entries {
                stmt.execute(rusqlite::params![
                    entry.channel,
                    entry.theme,
                    entry.title,
                    entry.date,
                    entry.time,
                    entry.duration,
                    entry.size_mb,
                    entry.description,
                    entry.url,
                    entry.website,
                    entry.subtitle_url,
                    entry.url_small,
                    entry.url_hd,
                    entry.timestamp,
                    entry.geo,
                    entry.is_new,
                ])
                .map_err(|e| StoreError::Database(e.to_string()))?;
            }
        }

        tx.commit().map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM media_entries", [])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM media_entries", [], |row| row.get(0))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn channels(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::query_strings(
            &conn,
            "SELECT DISTINCT channel FROM media_entries ORDER BY channel COLLATE NOCASE ASC",
            Vec::new(),
        )
    }

    fn themes(&self, query: &ThemeQuery) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let (where_clause, mut params) = Self::theme_conditions(query);
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let sql = format!(
            "SELECT DISTINCT theme FROM media_entries {}
             ORDER BY theme COLLATE NOCASE ASC LIMIT ? OFFSET ?",
            where_clause
        );
        Self::query_strings(&conn, &sql, params)
    }

    fn theme_entries(&self, query: &ThemeQuery) -> Result<Vec<MediaEntry>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let (where_clause, mut params) = Self::theme_conditions(query);
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let sql = format!(
            "SELECT {} FROM media_entries
             WHERE rowid IN (
                 SELECT MIN(rowid) FROM media_entries {} GROUP BY theme
             )
             ORDER BY theme COLLATE NOCASE ASC LIMIT ? OFFSET ?",
            ENTRY_COLUMNS, where_clause
        );
        Self::query_entries(&conn, &sql, params)
    }

    fn titles(&self, query: &TitleQuery) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let (where_clause, mut params) = Self::title_conditions(query);
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let sql = format!(
            "SELECT DISTINCT title FROM media_entries {}
             ORDER BY title COLLATE NOCASE ASC LIMIT ? OFFSET ?",
            where_clause
        );
        Self::query_strings(&conn, &sql, params)
    }

    fn title_entries(&self, query: &TitleQuery) -> Result<Vec<MediaEntry>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let (where_clause, mut params) = Self::title_conditions(query);
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let sql = format!(
            "SELECT {} FROM media_entries
             WHERE rowid IN (
                 SELECT MIN(rowid) FROM media_entries {} GROUP BY title
             )
             ORDER BY title COLLATE NOCASE ASC LIMIT ? OFFSET ?",
            ENTRY_COLUMNS, where_clause
        );
        Self::query_entries(&conn, &sql, params)
    }

    fn get(&self, key: &EntryKey) -> Result<MediaEntry, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut conditions: Vec<&str> = vec!["title = ?"];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(key.title.clone())];

        if let Some(theme) = &key.theme {
            conditions.push("theme = ?");
            params.push(Box::new(theme.clone()));
        }
        if let Some(channel) = &key.channel {
            conditions.push("channel = ?");
            params.push(Box::new(channel.clone()));
        }

        let sql = format!(
            "SELECT {} FROM media_entries {} LIMIT 1",
            ENTRY_COLUMNS,
            join_conditions(&conditions)
        );

        Self::query_entries(&conn, &sql, params)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(key.title.clone()))
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<MediaEntry>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("%{}%", query.text);

        let mut conditions: Vec<&str> =
            vec!["(title LIKE ?1 OR theme LIKE ?1 OR description LIKE ?1)"];
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(pattern)];

        if let Some(channel) = &query.channel {
            conditions.push("channel = ?");
            params.push(Box::new(channel.clone()));
        }
        if let Some(theme) = &query.theme {
            conditions.push("theme = ?");
            params.push(Box::new(theme.clone()));
        }
        params.push(Box::new(query.limit));
        params.push(Box::new(query.offset));

        let sql = format!(
            "SELECT {} FROM media_entries {} LIMIT ? OFFSET ?",
            ENTRY_COLUMNS,
            join_conditions(&conditions)
        );
        Self::query_entries(&conn, &sql, params)
    }

    fn recent(&self, min_timestamp: i64, limit: u32) -> Result<Vec<MediaEntry>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM media_entries WHERE timestamp >= ?
             ORDER BY timestamp DESC LIMIT ?",
            ENTRY_COLUMNS
        );
        Self::query_entries(
            &conn,
            &sql,
            vec![Box::new(min_timestamp), Box::new(limit)],
        )
    }
}
