use thiserror::Error;

/// Errors that can occur when talking to the lock service backend.
#[derive(Debug, Error)]
pub enum LockError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for lock service operations.
pub type Result<T> = std::result::Result<T, LockError>;
