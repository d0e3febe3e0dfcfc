//! Access to the remote todo collection.

mod api_types;
mod client;
mod error;
mod types;

pub use client::HttpStore;
pub use error::StoreError;
pub use types::{Item, ItemPatch, NewItem};

use async_trait::async_trait;

/// The four operations the remote store supports.
///
/// Each is a single round trip with no retries; retry policy, if any,
/// belongs to the caller.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
  /// Fetch the whole collection. An absent collection is an empty list.
  async fn fetch_all(&self) -> Result<Vec<Item>, StoreError>;

  /// Create an item, returning the key the store assigned to it.
  ///
  /// Creation allocates a new identity on every call, so repeating a failed
  /// create can leave a duplicate behind if the store partially applied the
  /// first attempt. A 2xx response without a generated key yields `Ok(None)`.
  async fn create(&self, item: &NewItem) -> Result<Option<String>, StoreError>;

  /// Partially update an item; only the fields present in the patch change.
  async fn update(&self, key: &str, patch: &ItemPatch) -> Result<(), StoreError>;

  /// Delete an item by key.
  async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
