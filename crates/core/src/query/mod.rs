//! Read-side query engine layered on the persistent store.

mod cache;
mod engine;

pub use cache::FacetCache;
pub use engine::{ChannelItem, QueryEngine};
