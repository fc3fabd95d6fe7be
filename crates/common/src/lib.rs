//! Shared types for the POS backend.

pub mod types;

pub use types::{Money, ProductId, SaleId, UserId};
