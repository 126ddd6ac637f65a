//! Status reporting error types.

use fabricscale_state::StateError;
use thiserror::Error;

pub type StatusResult<T> = Result<T, StatusError>;

#[derive(Debug, Error)]
pub enum StatusError {
    /// The payload could not be rendered; no store call was made.
    #[error("failed to marshal status record: {0}")]
    Serialize(String),

    #[error("failed to retrieve status record {name} for update: {source}")]
    Fetch {
        name: String,
        #[source]
        source: StateError,
    },

    #[error("failed to write status record {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: StateError,
    },

    #[error("status record {name} changed concurrently on each of {attempts} attempts")]
    ConflictRetriesExhausted { name: String, attempts: u32 },
}
