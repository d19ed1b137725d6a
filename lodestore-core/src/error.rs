//! Error types for the core crate.

use thiserror::Error;

/// Result alias for datastore operations.
pub type DatastoreResult<T> = Result<T, DatastoreError>;

/// Errors that can occur when talking to a datastore.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatastoreError {
    /// No entity exists for the given key.
    #[error("no such entity: {0}")]
    NoSuchEntity(String),

    /// A key is malformed for the requested operation.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A stored value does not have the entity type the caller expected.
    #[error("invalid entity type: expected {expected}, got {actual}")]
    InvalidEntityType {
        /// The expected type.
        expected: String,
        /// The actual type.
        actual: String,
    },

    /// A cursor has been advanced past its last result.
    #[error("no more results")]
    NoMoreResults,

    /// The caller supplied inconsistent arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
