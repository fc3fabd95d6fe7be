//! Lock service trait and key derivation.

use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;

use crate::error::Result;

/// Default TTL for a per-product lock.
///
/// Long enough to cover one sale transaction, short enough that a
/// crashed holder cannot indefinitely block a product.
pub const DEFAULT_PRODUCT_LOCK_TTL: Duration = Duration::from_secs(10);

/// Derives the lock key for a product.
pub fn product_lock_key(product_id: ProductId) -> String {
    format!("product-lock:{product_id}")
}

/// Trait for cooperative mutual exclusion across concurrent processes.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait LockService: Send + Sync {
    /// Attempts to atomically create `key` with the given TTL if and only
    /// if it does not already exist (or has expired).
    ///
    /// Returns true iff this caller now holds the lock. Never blocks
    /// waiting for a contended key: contention is reported as `Ok(false)`
    /// and left to the caller's retry policy.
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Removes `key` unconditionally.
    ///
    /// Safe to call even if the lock already expired (idempotent no-op).
    async fn release(&self, key: &str) -> Result<()>;
}
