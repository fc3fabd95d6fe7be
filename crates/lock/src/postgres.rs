//! PostgreSQL-backed lock service.
//!
//! Locks live in a `locks` table keyed by lock key. Acquisition is a
//! single atomic statement: an insert that, on key conflict, only
//! succeeds if the existing row has expired. There is no separate
//! check-then-set, so two concurrent acquirers cannot both win.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::service::LockService;

/// Lock service backed by a shared PostgreSQL table.
#[derive(Clone)]
pub struct PostgresLockService {
    pool: PgPool,
}

impl PostgresLockService {
    /// Creates a new PostgreSQL lock service.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LockService for PostgresLockService {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO locks (key, acquired_at, expires_at)
            VALUES ($1, now(), now() + make_interval(secs => $2))
            ON CONFLICT (key) DO UPDATE
                SET acquired_at = now(),
                    expires_at = now() + make_interval(secs => $2)
                WHERE locks.expires_at <= now()
            "#,
        )
        .bind(key)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;

        let acquired = result.rows_affected() == 1;
        if !acquired {
            tracing::debug!(key, "lock contended");
        }
        Ok(acquired)
    }

    async fn release(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM locks WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
