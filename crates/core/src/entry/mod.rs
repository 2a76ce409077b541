//! Catalog data model - broadcast entries and static broadcaster metadata.

mod broadcaster;
mod types;

pub use broadcaster::{broadcaster_for, Broadcaster, BROADCASTERS};
pub use types::*;
