//! Static broadcaster lookup table.
//!
//! Maps a feed channel name to display metadata (abbreviation and brand
//! color). Immutable reference data; entries are matched case-insensitively
//! on the channel prefix so "ARTE.DE" and "ARTE.FR" both resolve to ARTE.

use once_cell::sync::Lazy;
use serde::Serialize;

/// Display metadata for a known broadcaster.
#[derive(Debug, Clone, Serialize)]
pub struct Broadcaster {
    /// Channel name as it appears in the feed.
    pub name: &'static str,
    /// Short label for compact listings.
    pub abbreviation: &'static str,
    /// Brand color as a `#rrggbb` hex string.
    pub color: &'static str,
}

/// All known broadcasters, in feed channel-name order.
pub static BROADCASTERS: Lazy<Vec<Broadcaster>> = Lazy::new(|| {
    vec![
        Broadcaster { name: "3Sat", abbreviation: "3sat", color: "#c42333" },
        Broadcaster { name: "ARD", abbreviation: "ARD", color: "#0d3d8c" },
        Broadcaster { name: "ARTE.DE", abbreviation: "ARTE", color: "#f04e23" },
        Broadcaster { name: "ARTE.FR", abbreviation: "ARTE", color: "#f04e23" },
        Broadcaster { name: "BR", abbreviation: "BR", color: "#1a62a5" },
        Broadcaster { name: "DW", abbreviation: "DW", color: "#00a5ff" },
        Broadcaster { name: "HR", abbreviation: "HR", color: "#0080a5" },
        Broadcaster { name: "KiKA", abbreviation: "KiKA", color: "#59b434" },
        Broadcaster { name: "MDR", abbreviation: "MDR", color: "#005da8" },
        Broadcaster { name: "NDR", abbreviation: "NDR", color: "#003480" },
        Broadcaster { name: "ORF", abbreviation: "ORF", color: "#e4002b" },
        Broadcaster { name: "PHOENIX", abbreviation: "phx", color: "#ffb400" },
        Broadcaster { name: "RBB", abbreviation: "rbb", color: "#d5001e" },
        Broadcaster { name: "SR", abbreviation: "SR", color: "#0f5a94" },
        Broadcaster { name: "SRF", abbreviation: "SRF", color: "#af001e" },
        Broadcaster { name: "SWR", abbreviation: "SWR", color: "#054f9f" },
        Broadcaster { name: "WDR", abbreviation: "WDR", color: "#00345e" },
        Broadcaster { name: "ZDF", abbreviation: "ZDF", color: "#fa7d19" },
    ]
});

/// Look up the broadcaster for a feed channel name.
pub fn broadcaster_for(channel: &str) -> Option<&'static Broadcaster> {
    BROADCASTERS
        .iter()
        .find(|b| channel.eq_ignore_ascii_case(b.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_channel() {
        let b = broadcaster_for("ZDF").unwrap();
        assert_eq!(b.abbreviation, "ZDF");
        assert_eq!(b.color, "#fa7d19");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(broadcaster_for("zdf").is_some());
        assert!(broadcaster_for("KIKA").is_some());
    }

    #[test]
    fn test_lookup_unknown_channel() {
        assert!(broadcaster_for("Kanal Unbekannt").is_none());
    }

    #[test]
    fn test_table_has_no_duplicate_names() {
        let mut names: Vec<&str> = BROADCASTERS.iter().map(|b| b.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BROADCASTERS.len());
    }
}
