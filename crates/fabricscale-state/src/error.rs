//! Error types for the record store.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("version conflict on {key}: expected {expected}, found {found}")]
    Conflict {
        key: String,
        expected: u64,
        found: u64,
    },
}

impl StateError {
    /// True when the record does not exist. Callers use this to take a
    /// create path instead of treating the fetch as a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateError::NotFound(_))
    }

    /// True when a concurrent writer got there first: either the version
    /// token moved or a create raced with another create.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StateError::Conflict { .. } | StateError::AlreadyExists(_))
    }
}
