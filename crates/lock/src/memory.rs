//! In-memory lock service for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::service::LockService;

/// In-memory lock service implementation.
///
/// Provides the same acquire/release semantics as the shared backend,
/// with TTL expiry simulated against the process clock.
#[derive(Clone, Default)]
pub struct InMemoryLockService {
    held: Arc<Mutex<HashMap<String, Instant>>>,
}

impl InMemoryLockService {
    /// Creates a new empty in-memory lock service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `key` is currently held and unexpired.
    pub async fn is_held(&self, key: &str) -> bool {
        let held = self.held.lock().await;
        held.get(key).is_some_and(|expires| *expires > Instant::now())
    }

    /// Returns the number of held, unexpired keys.
    pub async fn held_count(&self) -> usize {
        let now = Instant::now();
        let held = self.held.lock().await;
        held.values().filter(|expires| **expires > now).count()
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut held = self.held.lock().await;

        if held.get(key).is_some_and(|expires| *expires > now) {
            return Ok(false);
        }

        held.insert(key.to_string(), now + ttl);
        Ok(true)
    }

    async fn release(&self, key: &str) -> Result<()> {
        let mut held = self.held.lock().await;
        held.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_then_contend_then_release() {
        let locks = InMemoryLockService::new();
        let ttl = Duration::from_secs(10);

        assert!(locks.acquire("k", ttl).await.unwrap());
        assert!(!locks.acquire("k", ttl).await.unwrap());
        assert!(locks.is_held("k").await);

        locks.release("k").await.unwrap();
        assert!(!locks.is_held("k").await);
        assert!(locks.acquire("k", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn expired_lock_can_be_reacquired() {
        let locks = InMemoryLockService::new();

        assert!(locks.acquire("k", Duration::ZERO).await.unwrap());
        // TTL of zero expires immediately
        assert!(!locks.is_held("k").await);
        assert!(locks.acquire("k", Duration::from_secs(10)).await.unwrap());
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let locks = InMemoryLockService::new();

        locks.release("never-held").await.unwrap();
        assert!(locks.acquire("never-held", Duration::from_secs(10)).await.unwrap());
        locks.release("never-held").await.unwrap();
        locks.release("never-held").await.unwrap();
    }

    #[tokio::test]
    async fn independent_keys_do_not_contend() {
        let locks = InMemoryLockService::new();
        let ttl = Duration::from_secs(10);

        assert!(locks.acquire("a", ttl).await.unwrap());
        assert!(locks.acquire("b", ttl).await.unwrap());
        assert_eq!(locks.held_count().await, 2);
    }
}
