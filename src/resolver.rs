//! Lookup resolver
//!
//! Unifies id-based and title-based retrieval into one resolution path
//! for operations that accept either. Exactly one selector must be
//! supplied; supplying both or neither is a caller error, not a silent
//! precedence rule.

use crate::error::{MemoriaError, Result};
use crate::storage::MemoryStore;
use crate::types::{MemoryId, MemoryRecord};

/// Resolve a memory record by id or by exact title match
pub async fn resolve(
    store: &dyn MemoryStore,
    id: Option<MemoryId>,
    title: Option<&str>,
) -> Result<MemoryRecord> {
    match (id, title) {
        (Some(id), None) => store.get_by_id(id).await,
        (None, Some(title)) => store.get_by_title(title).await,
        (Some(_), Some(_)) => Err(MemoriaError::InvalidArguments(
            "supply either memory_id or title, not both".to_string(),
        )),
        (None, None) => Err(MemoriaError::InvalidArguments(
            "supply either memory_id or title".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::libsql::LibsqlStorage;

    #[tokio::test]
    async fn test_resolve_by_id_and_title() {
        let store = LibsqlStorage::in_memory().await.unwrap();
        let created = store.create("Meeting Notes", "Discussed timeline").await.unwrap();

        let by_id = resolve(&store, Some(created.id), None).await.unwrap();
        assert_eq!(by_id, created);

        let by_title = resolve(&store, None, Some("Meeting Notes")).await.unwrap();
        assert_eq!(by_title, created);
    }

    #[tokio::test]
    async fn test_resolve_rejects_both_and_neither() {
        let store = LibsqlStorage::in_memory().await.unwrap();
        store.create("X", "").await.unwrap();

        let err = resolve(&store, Some(MemoryId(1)), Some("X")).await.unwrap_err();
        assert!(matches!(err, MemoriaError::InvalidArguments(_)));

        let err = resolve(&store, None, None).await.unwrap_err();
        assert!(matches!(err, MemoriaError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let store = LibsqlStorage::in_memory().await.unwrap();

        let err = resolve(&store, Some(MemoryId(99)), None).await.unwrap_err();
        assert!(matches!(err, MemoriaError::NotFound(_)));

        let err = resolve(&store, None, Some("missing")).await.unwrap_err();
        assert!(matches!(err, MemoriaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_title_is_exact_match() {
        let store = LibsqlStorage::in_memory().await.unwrap();
        store.create("Meeting Notes", "x").await.unwrap();

        // No fuzzy or case-insensitive matching.
        let err = resolve(&store, None, Some("meeting notes")).await.unwrap_err();
        assert!(matches!(err, MemoriaError::NotFound(_)));
    }
}
