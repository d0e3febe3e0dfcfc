use std::collections::HashMap;

/// A transient visual phase layered on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// The item was just created and is flashed briefly in the list.
  Created,
  /// The item is queued for deletion and flashed until the delete resolves.
  Deleting,
}

/// Ephemeral per-item visual states.
///
/// Keyed independently of cache membership: a `Created` entry can exist
/// before its item shows up in a reload. Entries never outlive their
/// scheduled expiry or explicit clear, so the overlay cannot turn into a
/// second source of truth.
#[derive(Debug, Default)]
pub struct OverlayState {
  phases: HashMap<String, Phase>,
}

impl OverlayState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, key: impl Into<String>, phase: Phase) {
    self.phases.insert(key.into(), phase);
  }

  pub fn clear(&mut self, key: &str) {
    self.phases.remove(key);
  }

  /// Absent key means no overlay.
  pub fn get(&self, key: &str) -> Option<Phase> {
    self.phases.get(key).copied()
  }

  /// Clear `key` only if it still holds `phase`.
  ///
  /// Expiry timers are not coalesced, so a timer scheduled for an old phase
  /// can fire after that phase has been replaced; the equality check keeps
  /// it from clobbering the newer one.
  pub fn clear_if(&mut self, key: &str, phase: Phase) -> bool {
    if self.phases.get(key) == Some(&phase) {
      self.phases.remove(key);
      true
    } else {
      false
    }
  }
}
