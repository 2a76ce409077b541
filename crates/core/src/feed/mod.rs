//! Remote catalog feed handling - transport, decompression, parsing and
//! normalization of the compact positional record format.

mod decompress;
mod fetch;
mod normalize;
mod parser;
mod paths;

pub use decompress::{detect_format, open_catalog, ArchiveFormat};
pub use fetch::{FeedFetcher, HttpFeedFetcher, ProgressFn};
pub use normalize::Normalizer;
pub use parser::{RawRecord, RecordScanner, RECORD_KEY};
pub use paths::CatalogPaths;

use thiserror::Error;

/// Errors for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("decompression error: {0}")]
    Decompression(String),

    #[error("malformed catalog document: {0}")]
    Parse(String),

    #[error("download cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
