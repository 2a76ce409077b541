//! Query parameter types and errors for the media store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_limit() -> u32 {
    100
}

/// Theme facet query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeQuery {
    /// Restrict to one channel.
    #[serde(default)]
    pub channel: Option<String>,
    /// Exclude entries older than this epoch timestamp.
    #[serde(default)]
    pub min_timestamp: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl Default for ThemeQuery {
    fn default() -> Self {
        Self {
            channel: None,
            min_timestamp: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Title facet query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleQuery {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub min_timestamp: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl Default for TitleQuery {
    fn default() -> Self {
        Self {
            channel: None,
            theme: None,
            min_timestamp: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Key for a point lookup. `title` is always required; callers lacking full
/// navigation context may omit theme and/or channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryKey {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    pub title: String,
}

impl EntryKey {
    pub fn new(channel: &str, theme: &str, title: &str) -> Self {
        Self {
            channel: Some(channel.to_string()),
            theme: Some(theme.to_string()),
            title: title.to_string(),
        }
    }
}

/// Text search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Substring matched case-insensitively against title, theme and
    /// description.
    pub text: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl SearchQuery {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            channel: None,
            theme: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
