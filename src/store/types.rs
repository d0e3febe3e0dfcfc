use serde::Serialize;

/// A task entry, as last fetched from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
  /// Opaque key assigned by the store on creation.
  pub key: String,
  pub text: String,
  pub checked: bool,
}

/// Payload for creating an item.
#[derive(Debug, Clone, Serialize)]
pub struct NewItem {
  pub text: String,
  pub checked: bool,
}

impl NewItem {
  /// A fresh, unchecked item.
  pub fn new(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      checked: false,
    }
  }
}

/// Partial update; only the supplied fields reach the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub checked: Option<bool>,
}

impl ItemPatch {
  /// Patch that replaces the text.
  pub fn text(text: impl Into<String>) -> Self {
    Self {
      text: Some(text.into()),
      ..Self::default()
    }
  }

  /// Patch that sets the checked flag.
  pub fn checked(checked: bool) -> Self {
    Self {
      checked: Some(checked),
      ..Self::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_patch_serializes_only_supplied_fields() {
    let patch = ItemPatch::checked(true);
    let json = serde_json::to_string(&patch).unwrap();
    assert_eq!(json, r#"{"checked":true}"#);

    let patch = ItemPatch::text("buy milk");
    let json = serde_json::to_string(&patch).unwrap();
    assert_eq!(json, r#"{"text":"buy milk"}"#);
  }
}
