//! Keeps the local item list consistent with the remote store and layers
//! transient visual phases on top of it.

mod cache;
mod engine;
mod overlay;
mod presenter;

pub use cache::ItemCache;
pub use engine::{SyncEngine, SyncError, SyncEvent, CREATED_FLASH, DELETE_DELAY};
pub use overlay::{OverlayState, Phase};
pub use presenter::{present, Emphasis, ListView, RowView};
