//! Data models for tido
//!
//! Defines the core data structures: TodoItem, ItemId, Snapshot, and the
//! wire-level RemoteRecord used when talking to a remote collection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a todo item
///
/// Locally created items get a client-generated key. When a remote
/// collection is attached, the store-assigned record key becomes the
/// authoritative id and is stable across sync cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ItemId(pub String);

impl ItemId {
    /// Generate a fresh client-side id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single todo list entry
///
/// `text` is set at creation and never changes; `done` is the only field
/// mutated in place afterwards. Empty text is permitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    /// Item identity
    pub id: ItemId,
    /// Display text
    pub text: String,
    /// Completion flag
    pub done: bool,
}

impl TodoItem {
    /// Create a new item with a generated id and `done = false`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ItemId::generate(),
            text: text.into(),
            done: false,
        }
    }

    /// Create an item with a specific id (for loading from a remote record)
    pub fn with_id(id: ItemId, text: impl Into<String>, done: bool) -> Self {
        Self {
            id,
            text: text.into(),
            done,
        }
    }
}

/// The full ordered item list at a point in time
///
/// Consumers receive snapshots as shared read-only views; all mutations flow
/// back through the store's operations.
pub type Snapshot = Arc<Vec<TodoItem>>;

/// Wire shape of a record in the remote collection
///
/// Fields other than the key are optional so that a malformed record can be
/// skipped during snapshot translation instead of failing the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Store-assigned record key
    pub id: String,
    /// Display text
    #[serde(default)]
    pub text: Option<String>,
    /// Completion flag
    #[serde(default, rename = "isDone")]
    pub is_done: Option<bool>,
}

impl RemoteRecord {
    /// Translate into a TodoItem
    ///
    /// Returns `None` for records missing the text field; a missing `isDone`
    /// defaults to false, matching item creation.
    pub fn into_item(self) -> Option<TodoItem> {
        let text = self.text?;
        Some(TodoItem::with_id(
            ItemId(self.id),
            text,
            self.is_done.unwrap_or(false),
        ))
    }
}

/// Translate a full remote record set into items, dropping malformed records
pub fn items_from_records(records: Vec<RemoteRecord>) -> Vec<TodoItem> {
    records
        .into_iter()
        .filter_map(RemoteRecord::into_item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_new_defaults() {
        let item = TodoItem::new("buy milk");
        assert_eq!(item.text, "buy milk");
        assert!(!item.done);
        assert!(!item.id.as_str().is_empty());
    }

    #[test]
    fn test_item_empty_text_permitted() {
        let item = TodoItem::new("");
        assert_eq!(item.text, "");
    }

    #[test]
    fn test_item_with_id() {
        let item = TodoItem::with_id(ItemId::from("r-1"), "x", true);
        assert_eq!(item.id, ItemId::from("r-1"));
        assert!(item.done);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ItemId::generate(), ItemId::generate());
    }

    #[test]
    fn test_record_into_item() {
        let record = RemoteRecord {
            id: "abc".to_string(),
            text: Some("x".to_string()),
            is_done: Some(true),
        };
        let item = record.into_item().unwrap();
        assert_eq!(item.id.as_str(), "abc");
        assert_eq!(item.text, "x");
        assert!(item.done);
    }

    #[test]
    fn test_record_missing_done_defaults_false() {
        let record = RemoteRecord {
            id: "abc".to_string(),
            text: Some("x".to_string()),
            is_done: None,
        };
        assert!(!record.into_item().unwrap().done);
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let records = vec![
            RemoteRecord {
                id: "good".to_string(),
                text: Some("keep".to_string()),
                is_done: None,
            },
            RemoteRecord {
                id: "bad".to_string(),
                text: None,
                is_done: Some(true),
            },
        ];
        let items = items_from_records(records);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "keep");
    }

    #[test]
    fn test_record_serialization_field_names() {
        let record = RemoteRecord {
            id: "abc".to_string(),
            text: Some("x".to_string()),
            is_done: Some(true),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"isDone\":true"));

        let parsed: RemoteRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_item_serialization() {
        let item = TodoItem::new("roundtrip");
        let json = serde_json::to_string(&item).unwrap();
        let parsed: TodoItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
    }
}
