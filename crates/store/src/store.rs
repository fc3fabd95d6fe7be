//! Core traits for store implementations.

use async_trait::async_trait;
use common::{ProductId, SaleId, UserId};

use crate::record::{NewProduct, NewSale, NewUser, Product, SaleRecord, UserRecord};
use crate::Result;

/// A store transaction in progress.
///
/// All reads and writes through a transaction observe earlier writes of
/// the same transaction. Dropping a transaction without calling
/// [`commit`](SaleTx::commit) rolls back every write it made.
#[async_trait]
pub trait SaleTx: Send {
    /// Reads the current product row inside the transaction.
    ///
    /// Returns None if no such product exists.
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Decrements a product's stock by `quantity` iff at least that much
    /// stock remains.
    ///
    /// Returns false (and writes nothing) when stock is insufficient or
    /// the product does not exist. This is a single conditional statement
    /// at the store, never a read-then-write.
    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<bool>;

    /// Inserts a sale row together with all of its line items.
    ///
    /// Returns the persisted record with product summaries attached.
    async fn insert_sale(&mut self, sale: NewSale) -> Result<SaleRecord>;

    /// Commits every write made through this transaction.
    async fn commit(self) -> Result<()>;
}

/// Core trait for inventory/sale store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// The transaction type produced by [`begin`](SaleStore::begin).
    type Tx: SaleTx;

    /// Begins a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Creates a product, rejecting duplicate SKUs.
    async fn create_product(&self, new: NewProduct) -> Result<Product>;

    /// Reads a product row. Returns None if absent.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists all products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Creates a user account.
    async fn create_user(&self, new: NewUser) -> Result<UserRecord>;

    /// Reads a sale with line items, product summaries, and the owning
    /// user summary. Returns None if absent.
    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleRecord>>;

    /// Lists sales, optionally filtered by owner, newest first.
    async fn list_sales(&self, user_id: Option<UserId>) -> Result<Vec<SaleRecord>>;
}
