//! Core data types for the Memoria memory manager
//!
//! Defines the memory record persisted by the store, its identifier, and
//! the partial-update structure used by the `update_memory` operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for memory records
///
/// Wraps the store-assigned row id to keep memory ids from mixing with
/// other integers in the system. Ids are positive and immutable once
/// assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(pub i64);

impl MemoryId {
    /// Parse a memory id from a string
    pub fn from_string(s: &str) -> Result<Self, std::num::ParseIntError> {
        Ok(Self(s.parse()?))
    }

    /// The raw integer value
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MemoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MemoryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A persisted memory record
///
/// The sole entity the system manages: a titled note with free-form
/// content. Titles are unique across all records; ids are assigned by the
/// store at creation and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique identifier, assigned on creation
    pub id: MemoryId,

    /// Non-empty title, unique across all records (case-sensitive)
    pub title: String,

    /// Full content; may be empty
    pub content: String,

    /// Creation timestamp, set once
    pub created_at: DateTime<Utc>,

    /// Last update timestamp; refreshed on every successful update
    pub updated_at: DateTime<Utc>,
}

/// Updates to apply to an existing memory
///
/// Unset fields are left unchanged. At least one field must be set for an
/// update request to be valid.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryUpdates {
    /// New title (must not collide with a different record's title)
    pub title: Option<String>,

    /// New content (replaces existing; empty allowed)
    pub content: Option<String>,
}

impl MemoryUpdates {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_id_parsing() {
        let id = MemoryId::from_string("42").unwrap();
        assert_eq!(id, MemoryId(42));
        assert_eq!(id.to_string(), "42");

        assert!(MemoryId::from_string("not-a-number").is_err());
    }

    #[test]
    fn test_memory_id_serializes_transparently() {
        let json = serde_json::to_string(&MemoryId(7)).unwrap();
        assert_eq!(json, "7");

        let id: MemoryId = serde_json::from_str("7").unwrap();
        assert_eq!(id, MemoryId(7));
    }

    #[test]
    fn test_updates_emptiness() {
        assert!(MemoryUpdates::default().is_empty());
        assert!(!MemoryUpdates {
            title: Some("New".to_string()),
            content: None,
        }
        .is_empty());
        assert!(!MemoryUpdates {
            title: None,
            content: Some(String::new()),
        }
        .is_empty());
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let record = MemoryRecord {
            id: MemoryId(1),
            title: "Meeting Notes".to_string(),
            content: "Discussed timeline".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Meeting Notes");

        let back: MemoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
