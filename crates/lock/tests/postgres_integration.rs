//! PostgreSQL lock service integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p lock --test postgres_integration
//! ```

use std::sync::Arc;
use std::time::Duration;

use lock::{LockService, PostgresLockService};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_locks() -> PostgresLockService {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    PostgresLockService::new(pool)
}

/// Each test uses its own keys, so tests can share the table without
/// truncating between runs.
fn unique_key(prefix: &str) -> String {
    format!("{}:{}", prefix, uuid::Uuid::new_v4())
}

#[tokio::test]
async fn acquire_is_exclusive_until_released() {
    let locks = get_test_locks().await;
    let key = unique_key("excl");
    let ttl = Duration::from_secs(10);

    assert!(locks.acquire(&key, ttl).await.unwrap());
    assert!(!locks.acquire(&key, ttl).await.unwrap());

    locks.release(&key).await.unwrap();
    assert!(locks.acquire(&key, ttl).await.unwrap());

    locks.release(&key).await.unwrap();
}

#[tokio::test]
async fn expired_lock_is_reacquirable() {
    let locks = get_test_locks().await;
    let key = unique_key("ttl");

    assert!(locks.acquire(&key, Duration::from_millis(200)).await.unwrap());
    assert!(!locks.acquire(&key, Duration::from_secs(10)).await.unwrap());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(locks.acquire(&key, Duration::from_secs(10)).await.unwrap());
    locks.release(&key).await.unwrap();
}

#[tokio::test]
async fn release_of_unheld_key_is_noop() {
    let locks = get_test_locks().await;
    let key = unique_key("noop");

    locks.release(&key).await.unwrap();
    assert!(locks.acquire(&key, Duration::from_secs(10)).await.unwrap());
    locks.release(&key).await.unwrap();
    locks.release(&key).await.unwrap();
}

#[tokio::test]
async fn concurrent_acquire_admits_exactly_one_winner() {
    let locks = Arc::new(get_test_locks().await);
    let key = unique_key("race");
    let ttl = Duration::from_secs(10);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let locks = locks.clone();
        let key = key.clone();
        handles.push(tokio::spawn(
            async move { locks.acquire(&key, ttl).await.unwrap() },
        ));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    locks.release(&key).await.unwrap();
}
