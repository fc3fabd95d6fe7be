//! Coordinator error taxonomy.

use lock::LockError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the sale coordinator.
///
/// Business failures (`Validation`, `Conflict`, `NotFound`) carry
/// human-readable messages and are never retried internally. Transient
/// infrastructure failures propagate through `Store` and `Lock` without
/// being masked as business errors.
#[derive(Debug, Error)]
pub enum SaleError {
    /// Empty cart, malformed quantity, missing product, or insufficient
    /// stock. Not retryable.
    #[error("{0}")]
    Validation(String),

    /// A lock could not be acquired because another sale currently holds
    /// it. Retryable by the caller.
    #[error("{0}")]
    Conflict(String),

    /// A sale lookup miss on the read path.
    #[error("{0}")]
    NotFound(String),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An error occurred in the lock service.
    #[error("Lock service error: {0}")]
    Lock(#[from] LockError),
}
