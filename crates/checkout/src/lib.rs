//! Sale transaction coordinator.
//!
//! Turns a cart of product/quantity pairs into a durable sale while
//! guaranteeing that concurrent sales never oversell stock: per-product
//! mutual exclusion through the lock service, layered on top of a
//! multi-row transactional stock decrement in the store.

pub mod coordinator;
pub mod error;

pub use coordinator::{SaleCoordinator, SaleItemRequest};
pub use error::SaleError;
