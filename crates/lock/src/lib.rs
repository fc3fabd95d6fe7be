//! Distributed lock service client.
//!
//! Provides cooperative mutual exclusion across concurrent processes via
//! an atomic "set if absent, with expiry" primitive. The TTL is a
//! crash-safety bound, not a correctness mechanism: callers must release
//! every lock on every exit path.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod service;

pub use error::{LockError, Result};
pub use memory::InMemoryLockService;
pub use postgres::PostgresLockService;
pub use service::{DEFAULT_PRODUCT_LOCK_TTL, LockService, product_lock_key};
