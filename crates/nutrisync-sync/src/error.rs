//! Sync error types.

use thiserror::Error;

/// Errors returned by a remote upsert service.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The requested record does not exist. Not a failure: there is no prior state.
    #[error("Record not found")]
    NotFound,

    /// The service could not be reached
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// The service answered with an error status
    #[error("Remote returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Failed to decode remote response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Unavailable(e.to_string())
        }
    }
}

/// Errors from the local durable cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cached snapshot failed structural parsing
    #[error("Corrupt cache snapshot: {0}")]
    Corrupt(String),

    /// The snapshot could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors from state store entry points.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Mutation attempted before the first load completed
    #[error("State not loaded yet")]
    NotReady,

    /// Profile rejected by validation
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// The background sync worker has shut down
    #[error("Sync worker stopped")]
    WorkerStopped,
}

impl From<nutrisync_core::CoreError> for StoreError {
    fn from(e: nutrisync_core::CoreError) -> Self {
        match e {
            nutrisync_core::CoreError::InvalidProfile(msg) => StoreError::InvalidProfile(msg),
            other => StoreError::InvalidProfile(other.to_string()),
        }
    }
}
