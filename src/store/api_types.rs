//! Serde-deserializable types matching the store's REST responses.
//!
//! These are separate from the domain types so deserialization quirks
//! (null collections, missing fields) stay out of application code.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::types::Item;

/// One stored item as it appears on the wire, without its key.
#[derive(Debug, Deserialize)]
pub struct ApiItem {
  #[serde(default)]
  pub text: String,
  #[serde(default)]
  pub checked: bool,
}

/// The whole collection: a key-to-item map, or `null` when empty.
#[derive(Debug, Deserialize)]
pub struct ApiCollection(pub Option<BTreeMap<String, ApiItem>>);

impl ApiCollection {
  /// Flatten into domain items, in key order.
  ///
  /// Store keys are chronologically sortable push ids, so key order is
  /// creation order.
  pub fn into_items(self) -> Vec<Item> {
    self
      .0
      .unwrap_or_default()
      .into_iter()
      .map(|(key, item)| Item {
        key,
        text: item.text,
        checked: item.checked,
      })
      .collect()
  }
}

/// Response to a create: the store echoes the generated key as `name`.
#[derive(Debug, Deserialize)]
pub struct ApiCreated {
  pub name: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_null_collection_is_empty() {
    let collection: ApiCollection = serde_json::from_str("null").unwrap();
    assert!(collection.into_items().is_empty());
  }

  #[test]
  fn test_collection_decodes_in_key_order() {
    let body = r#"{
      "-Nb2": {"text": "second", "checked": true},
      "-Na1": {"text": "first", "checked": false}
    }"#;
    let collection: ApiCollection = serde_json::from_str(body).unwrap();
    let items = collection.into_items();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].key, "-Na1");
    assert_eq!(items[0].text, "first");
    assert!(!items[0].checked);
    assert_eq!(items[1].key, "-Nb2");
    assert!(items[1].checked);
  }

  #[test]
  fn test_item_missing_fields_default() {
    let collection: ApiCollection = serde_json::from_str(r#"{"k": {}}"#).unwrap();
    let items = collection.into_items();
    assert_eq!(items[0].text, "");
    assert!(!items[0].checked);
  }

  #[test]
  fn test_created_without_name() {
    let created: ApiCreated = serde_json::from_str("{}").unwrap();
    assert!(created.name.is_none());

    let created: ApiCreated = serde_json::from_str(r#"{"name": "x1"}"#).unwrap();
    assert_eq!(created.name.as_deref(), Some("x1"));
  }
}
