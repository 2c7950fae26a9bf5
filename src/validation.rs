//! Request validation for write operations
//!
//! Pure functions that turn per-operation parameter structs (optional
//! fields, produced by the dispatcher's typed deserialization) into
//! validated requests. Validation never touches the store; the store
//! re-checks its own invariants as the final authority.

use crate::error::{MemoriaError, Result};
use crate::types::MemoryUpdates;

/// A validated request to create a memory record
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub title: String,
    pub content: String,
}

/// Validate a `remember` request
///
/// Both fields are required; a missing field is reported by name. The
/// title must be non-empty after trimming surrounding whitespace; content
/// may be empty. Values are passed through as supplied (no trimming on
/// write).
pub fn validate_remember(title: Option<String>, content: Option<String>) -> Result<NewMemory> {
    let title = title.ok_or_else(|| missing_field("title"))?;
    let content = content.ok_or_else(|| missing_field("content"))?;

    ensure_title(&title)?;

    Ok(NewMemory { title, content })
}

/// Validate an `update_memory` request
///
/// At least one of title/content must be present; a supplied title must
/// be non-empty after trimming.
pub fn validate_update(updates: MemoryUpdates) -> Result<MemoryUpdates> {
    if updates.is_empty() {
        return Err(MemoriaError::Validation(
            "provide at least one field to update (title or content)".to_string(),
        ));
    }

    if let Some(title) = &updates.title {
        ensure_title(title)?;
    }

    Ok(updates)
}

/// Reject blank titles
fn ensure_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(MemoriaError::Validation(
            "title must be a non-empty string".to_string(),
        ));
    }
    Ok(())
}

fn missing_field(field: &str) -> MemoriaError {
    MemoriaError::Validation(format!("missing required field: {}", field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_requires_title_and_content() {
        let err = validate_remember(None, Some("content".to_string())).unwrap_err();
        assert!(err.to_string().contains("title"));

        let err = validate_remember(Some("Title".to_string()), None).unwrap_err();
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn test_remember_rejects_blank_title() {
        let err = validate_remember(Some("   ".to_string()), Some("x".to_string())).unwrap_err();
        assert!(matches!(err, MemoriaError::Validation(_)));
    }

    #[test]
    fn test_remember_allows_empty_content() {
        let request =
            validate_remember(Some("Title".to_string()), Some(String::new())).unwrap();
        assert_eq!(request.title, "Title");
        assert_eq!(request.content, "");
    }

    #[test]
    fn test_remember_preserves_surrounding_whitespace() {
        // Trimming applies to the check only; values are stored as given.
        let request =
            validate_remember(Some("  Title  ".to_string()), Some("x".to_string())).unwrap();
        assert_eq!(request.title, "  Title  ");
    }

    #[test]
    fn test_update_requires_at_least_one_field() {
        let err = validate_update(MemoryUpdates::default()).unwrap_err();
        assert!(matches!(err, MemoriaError::Validation(_)));
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let err = validate_update(MemoryUpdates {
            title: Some(String::new()),
            content: None,
        })
        .unwrap_err();
        assert!(matches!(err, MemoriaError::Validation(_)));
    }

    #[test]
    fn test_update_accepts_content_only() {
        let updates = validate_update(MemoryUpdates {
            title: None,
            content: Some("new content".to_string()),
        })
        .unwrap();
        assert_eq!(updates.content.as_deref(), Some("new content"));
    }
}
