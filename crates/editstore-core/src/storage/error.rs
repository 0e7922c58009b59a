//! Storage error handling
//!
//! Typed errors for engine operations. Errors are never retried
//! internally; the caller decides what to do with them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::counters::EntityKind;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Update or reference to a record that does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// The database could not be opened or upgraded
    #[error("Store unavailable at '{path}': {details}")]
    StoreUnavailable { path: PathBuf, details: String },

    /// Snapshot or backup payload is malformed
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite transaction or statement failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        StoreError::NotFound { kind, id }
    }

    /// Check if this error is a missing-record error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::not_found(EntityKind::Asset, 10042);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "asset 10042 not found");
    }

    #[test]
    fn test_unavailable_display() {
        let err = StoreError::StoreUnavailable {
            path: PathBuf::from("/data/editstore.db"),
            details: "unable to open database file".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("unavailable"));
        assert!(msg.contains("/data/editstore.db"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
