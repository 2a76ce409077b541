//! Mapping raw field arrays to canonical [`MediaEntry`] records.

use crate::entry::{resolve_quality_url, slot, MediaEntry};

use super::RawRecord;

/// Stateful record normalizer.
///
/// Carries the previous record's channel and theme so that records omitting
/// them (empty string in the source slot) inherit the values of the
/// immediately preceding record. The state survives chunk boundaries because
/// one normalizer instance lives for the whole parse stream.
pub struct Normalizer {
    last_channel: String,
    last_theme: String,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            last_channel: String::new(),
            last_theme: String::new(),
        }
    }

    /// Normalize one raw field array.
    ///
    /// Missing positional fields default to empty string / 0 / false;
    /// numeric and boolean parse failures never error.
    pub fn normalize(&mut self, record: &RawRecord) -> MediaEntry {
        let channel = match field(record, slot::CHANNEL) {
            "" if has_slot(record, slot::CHANNEL) => self.last_channel.clone(),
            value => value.to_string(),
        };
        let theme = match field(record, slot::THEME) {
            "" if has_slot(record, slot::THEME) => self.last_theme.clone(),
            value => value.to_string(),
        };
        self.last_channel = channel.clone();
        self.last_theme = theme.clone();

        let url = field(record, slot::URL).to_string();
        let url_small = resolve_quality_url(&url, field(record, slot::URL_SMALL));
        let url_hd = resolve_quality_url(&url, field(record, slot::URL_HD));

        MediaEntry {
            channel,
            theme,
            title: field(record, slot::TITLE).to_string(),
            date: field(record, slot::DATE).to_string(),
            time: field(record, slot::TIME).to_string(),
            duration: field(record, slot::DURATION).to_string(),
            size_mb: field(record, slot::SIZE_MB).to_string(),
            description: field(record, slot::DESCRIPTION).to_string(),
            url,
            website: field(record, slot::WEBSITE).to_string(),
            subtitle_url: field(record, slot::SUBTITLE_URL).to_string(),
            url_small,
            url_hd,
            timestamp: field(record, slot::TIMESTAMP).parse().unwrap_or(0),
            geo: field(record, slot::GEO).to_string(),
            is_new: field(record, slot::IS_NEW).eq_ignore_ascii_case("true"),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn field(record: &RawRecord, index: usize) -> &str {
    record.get(index).map(String::as_str).unwrap_or("")
}

fn has_slot(record: &RawRecord, index: usize) -> bool {
    index < record.len()
}
