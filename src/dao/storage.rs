use std::error::Error;

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record could not be decoded into a game.
    #[error("stored record is corrupted: {message}")]
    Corrupted { message: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Construct a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        StorageError::Corrupted {
            message: message.into(),
        }
    }

    /// Whether retrying after a reconnect may help.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}
