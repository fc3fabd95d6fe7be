//! Transactional inventory and sale store.
//!
//! Products, users, and immutable sale records live in one relational
//! store. The [`SaleStore`] trait is the seam between the sale
//! coordinator and the backend; [`PostgresSaleStore`] is the production
//! implementation and [`InMemorySaleStore`] backs the test suites.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemorySaleStore, InMemorySaleTx};
pub use postgres::{PostgresSaleStore, PostgresSaleTx};
pub use record::{
    NewLineItem, NewProduct, NewSale, NewUser, Product, ProductSummary, SaleLineItem, SaleRecord,
    UserRecord, UserSummary,
};
pub use store::{SaleStore, SaleTx};
