use crate::store::Item;

use super::cache::ItemCache;
use super::overlay::{OverlayState, Phase};

/// How a row should be emphasized, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
  Created,
  Deleting,
  Checked,
  Plain,
}

/// One renderable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
  pub key: String,
  pub text: String,
  pub checked: bool,
  pub emphasis: Emphasis,
}

/// The renderable list plus aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
  pub rows: Vec<RowView>,
  pub total: usize,
  pub unchecked: usize,
}

/// Derive the view from the current cache and overlay.
///
/// Counts are recomputed from scratch on every call rather than maintained
/// incrementally, so they can never drift from the snapshot.
pub fn present(cache: &ItemCache, overlay: &OverlayState) -> ListView {
  let rows: Vec<RowView> = cache
    .all()
    .iter()
    .map(|item| row(item, overlay))
    .collect();
  let total = rows.len();
  let unchecked = cache.all().iter().filter(|item| !item.checked).count();

  ListView {
    rows,
    total,
    unchecked,
  }
}

fn row(item: &Item, overlay: &OverlayState) -> RowView {
  let emphasis = match overlay.get(&item.key) {
    Some(Phase::Created) => Emphasis::Created,
    Some(Phase::Deleting) => Emphasis::Deleting,
    None if item.checked => Emphasis::Checked,
    None => Emphasis::Plain,
  };

  RowView {
    key: item.key.clone(),
    text: item.text.clone(),
    checked: item.checked,
    emphasis,
  }
}
