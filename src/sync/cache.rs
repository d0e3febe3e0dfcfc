use crate::store::Item;

/// Local snapshot of the remote collection.
///
/// The cache only ever changes by whole-snapshot replacement: the store
/// offers no change notifications, so a full re-fetch after every mutation
/// is the one way to stay consistent with fields changed by other clients.
/// Partial merges are deliberately unsupported.
#[derive(Debug, Default)]
pub struct ItemCache {
  items: Vec<Item>,
}

impl ItemCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Swap in a fresh snapshot, in remote enumeration order.
  pub fn replace(&mut self, items: Vec<Item>) {
    self.items = items;
  }

  pub fn all(&self) -> &[Item] {
    &self.items
  }

  pub fn find(&self, key: &str) -> Option<&Item> {
    self.items.iter().find(|item| item.key == key)
  }
}
