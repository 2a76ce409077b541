//! The `MediaEntry` catalog record and the positional feed schema.

use serde::{Deserialize, Serialize};

/// Positional slots of a raw feed record array.
///
/// Slots 11, 13, 15 and 17 are reserved by the feed format and never read.
pub mod slot {
    pub const CHANNEL: usize = 0;
    pub const THEME: usize = 1;
    pub const TITLE: usize = 2;
    pub const DATE: usize = 3;
    pub const TIME: usize = 4;
    pub const DURATION: usize = 5;
    pub const SIZE_MB: usize = 6;
    pub const DESCRIPTION: usize = 7;
    pub const URL: usize = 8;
    pub const WEBSITE: usize = 9;
    pub const SUBTITLE_URL: usize = 10;
    pub const URL_SMALL: usize = 12;
    pub const URL_HD: usize = 14;
    pub const TIMESTAMP: usize = 16;
    pub const GEO: usize = 18;
    pub const IS_NEW: usize = 19;
}

/// One broadcast catalog item.
///
/// The triple (channel, theme, title) is the logical identity of an entry;
/// the store enforces it as a unique key and ingestion replaces on conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub channel: String,
    pub theme: String,
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    /// Duration as HH:MM:SS display string.
    #[serde(default)]
    pub duration: String,
    /// String-encoded size in megabytes, as delivered by the feed.
    #[serde(default)]
    pub size_mb: String,
    #[serde(default)]
    pub description: String,
    /// Absolute video URL (normal quality).
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub subtitle_url: String,
    /// Absolute low-quality URL, resolved from its pipe encoding at
    /// normalization time.
    #[serde(default)]
    pub url_small: String,
    /// Absolute HD URL, resolved from its pipe encoding at normalization time.
    #[serde(default)]
    pub url_hd: String,
    /// Seconds since epoch; 0 when the feed value was unparseable.
    #[serde(default)]
    pub timestamp: i64,
    /// Geo-restriction code, e.g. "DE-AT-CH".
    #[serde(default)]
    pub geo: String,
    #[serde(default)]
    pub is_new: bool,
}

impl MediaEntry {
    /// The unique key of this entry.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.channel, &self.theme, &self.title)
    }
}

/// Resolve a pipe-encoded quality URL against the entry's base URL.
///
/// The feed encodes alternate-quality URLs as `"<offset>|<suffix>"`: the
/// first `offset` characters of the base URL followed by the suffix. An
/// empty field, a non-numeric offset or an offset past the end of the base
/// falls back to the base URL unresolved. An already-absolute value is
/// returned unchanged, so the resolution is idempotent.
pub fn resolve_quality_url(base: &str, encoded: &str) -> String {
    if encoded.is_empty() {
        return base.to_string();
    }
    let Some((offset, suffix)) = encoded.split_once('|') else {
        return encoded.to_string();
    };
    let Ok(offset) = offset.parse::<usize>() else {
        return base.to_string();
    };
    match base.get(..offset) {
        Some(prefix) => format!("{}{}", prefix, suffix),
        None => base.to_string(),
    }
}
