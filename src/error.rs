//! Error types for the Memoria memory manager
//!
//! This module provides structured error handling using thiserror, with one
//! variant per application error kind plus conversions from the ambient
//! libraries (database, config, I/O, serialization).

use thiserror::Error;

/// Main error type for Memoria operations
#[derive(Error, Debug)]
pub enum MemoriaError {
    /// Malformed input, recoverable by the caller fixing the request
    #[error("Validation error: {0}")]
    Validation(String),

    /// A record with the same title already exists
    #[error("A memory titled '{0}' already exists")]
    DuplicateTitle(String),

    /// No record matches the given id or title
    #[error("Memory not found: {0}")]
    NotFound(String),

    /// Caller supplied both or neither of id/title to a lookup
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Underlying storage engine failure, surfaced as-is
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// MCP protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl MemoriaError {
    /// Stable machine-readable kind, carried in structured error payloads
    /// so callers can distinguish the taxonomy without parsing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MemoriaError::Validation(_) => "validation",
            MemoriaError::DuplicateTitle(_) => "duplicate_title",
            MemoriaError::NotFound(_) => "not_found",
            MemoriaError::InvalidArguments(_) => "invalid_arguments",
            MemoriaError::Database(_) => "storage",
            MemoriaError::Config(_) => "config",
            MemoriaError::Io(_) => "io",
            MemoriaError::Serialization(_) => "serialization",
            MemoriaError::Protocol(_) => "protocol",
            MemoriaError::Other(_) => "internal",
        }
    }
}

/// Result type alias for Memoria operations
pub type Result<T> = std::result::Result<T, MemoriaError>;

impl From<libsql::Error> for MemoriaError {
    fn from(err: libsql::Error) -> Self {
        MemoriaError::Database(err.to_string())
    }
}

/// Convert anyhow::Error to MemoriaError
impl From<anyhow::Error> for MemoriaError {
    fn from(err: anyhow::Error) -> Self {
        MemoriaError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoriaError::NotFound("id 42".to_string());
        assert_eq!(err.to_string(), "Memory not found: id 42");

        let err = MemoriaError::DuplicateTitle("Meeting Notes".to_string());
        assert_eq!(
            err.to_string(),
            "A memory titled 'Meeting Notes' already exists"
        );
    }

    #[test]
    fn test_error_kinds_are_stable() {
        assert_eq!(MemoriaError::Validation(String::new()).kind(), "validation");
        assert_eq!(
            MemoriaError::DuplicateTitle(String::new()).kind(),
            "duplicate_title"
        );
        assert_eq!(MemoriaError::NotFound(String::new()).kind(), "not_found");
        assert_eq!(
            MemoriaError::InvalidArguments(String::new()).kind(),
            "invalid_arguments"
        );
        assert_eq!(MemoriaError::Database(String::new()).kind(), "storage");
    }

    #[test]
    fn test_serde_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: MemoriaError = serde_err.into();
        assert!(matches!(err, MemoriaError::Serialization(_)));
    }
}
