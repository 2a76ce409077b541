//! Catalog ingestion - drives fetch, decompress, parse, normalize and
//! batch-upsert for full loads and incremental diff applies.

mod coordinator;
mod types;

pub use coordinator::CatalogIngestor;
pub use types::*;
