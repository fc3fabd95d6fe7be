//! Orchestration of lock acquisition, stock validation, atomic
//! decrement, and sale persistence.

use std::collections::HashSet;
use std::time::Duration;

use common::{Money, ProductId, SaleId, UserId};
use lock::{DEFAULT_PRODUCT_LOCK_TTL, LockService, product_lock_key};
use store::{NewLineItem, NewSale, SaleRecord, SaleStore, SaleTx};

use crate::error::SaleError;

/// One product/quantity entry of a sale request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Coordinates the sale-commit protocol.
///
/// For each `create_sale` call the coordinator acquires one lock per
/// distinct product, runs the validate/decrement/persist sequence in a
/// single store transaction, and releases every acquired lock on every
/// exit path. Lock acquisition is fail-fast; contention is reported as
/// [`SaleError::Conflict`] and left to the caller's retry policy.
pub struct SaleCoordinator<S, L>
where
    S: SaleStore,
    L: LockService,
{
    store: S,
    locks: L,
    lock_ttl: Duration,
}

impl<S, L> SaleCoordinator<S, L>
where
    S: SaleStore,
    L: LockService,
{
    /// Creates a coordinator with the default product-lock TTL.
    pub fn new(store: S, locks: L) -> Self {
        Self::with_lock_ttl(store, locks, DEFAULT_PRODUCT_LOCK_TTL)
    }

    /// Creates a coordinator with an explicit product-lock TTL.
    ///
    /// The TTL is a crash-safety bound only and must be configured
    /// strictly longer than the expected transaction time.
    pub fn with_lock_ttl(store: S, locks: L, lock_ttl: Duration) -> Self {
        Self {
            store,
            locks,
            lock_ttl,
        }
    }

    /// Gets a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a sale for `user_id` from the given line items.
    ///
    /// Stock is validated and decremented per line, in input order,
    /// inside one transaction; every line snapshots the product's unit
    /// price at decrement time. Duplicate product ids across lines share
    /// one lock but are validated and decremented independently, each
    /// against the row as left by the previous line.
    #[tracing::instrument(skip(self, items), fields(user_id = %user_id, lines = items.len()))]
    pub async fn create_sale(
        &self,
        user_id: UserId,
        items: &[SaleItemRequest],
    ) -> Result<SaleRecord, SaleError> {
        metrics::counter!("sales_attempted_total").increment(1);
        let start = std::time::Instant::now();

        if items.is_empty() {
            return Err(SaleError::Validation(
                "Sale must contain at least one item".to_string(),
            ));
        }
        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(SaleError::Validation(format!(
                "Quantity must be at least 1 for product {}",
                item.product_id
            )));
        }

        // Distinct product ids, in the order they first appear.
        let mut seen = HashSet::new();
        let distinct: Vec<ProductId> = items
            .iter()
            .map(|item| item.product_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let mut acquired = Vec::with_capacity(distinct.len());
        let result = match self.acquire_all(&distinct, &mut acquired).await {
            Ok(()) => self.run_sale_transaction(user_id, items).await,
            Err(err) => Err(err),
        };

        // Locks are released on every exit path: success, validation
        // failure, transaction failure, lock backend failure.
        let mut release_err = None;
        for key in &acquired {
            if let Err(err) = self.locks.release(key).await {
                tracing::error!(key, error = %err, "failed to release product lock");
                release_err.get_or_insert(err);
            }
        }

        let sale = result?;
        if let Some(err) = release_err {
            return Err(err.into());
        }

        metrics::counter!("sales_committed_total").increment(1);
        metrics::histogram!("sale_duration_seconds").record(start.elapsed().as_secs_f64());
        tracing::info!(sale_id = %sale.id, total = %sale.total, "sale committed");
        Ok(sale)
    }

    /// Acquires the lock for every product id, pushing each acquired key
    /// into `acquired` so the caller can release the partial set when an
    /// acquisition fails partway.
    async fn acquire_all(
        &self,
        product_ids: &[ProductId],
        acquired: &mut Vec<String>,
    ) -> Result<(), SaleError> {
        for id in product_ids {
            let key = product_lock_key(*id);
            if !self.locks.acquire(&key, self.lock_ttl).await? {
                metrics::counter!("sale_lock_conflicts_total").increment(1);
                tracing::debug!(key, "product lock contended, failing fast");
                return Err(SaleError::Conflict(
                    "Products are currently being processed. Please try again.".to_string(),
                ));
            }
            acquired.push(key);
        }
        Ok(())
    }

    /// Runs the validate/decrement/persist sequence inside one store
    /// transaction. Any error drops the transaction, rolling back every
    /// decrement and leaving no partial sale rows.
    async fn run_sale_transaction(
        &self,
        user_id: UserId,
        items: &[SaleItemRequest],
    ) -> Result<SaleRecord, SaleError> {
        let mut tx = self.store.begin().await?;

        let mut total = Money::zero();
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            let product = tx.get_product(item.product_id).await?.ok_or_else(|| {
                SaleError::Validation(format!("Product not found: {}", item.product_id))
            })?;

            let insufficient = || {
                SaleError::Validation(format!(
                    "Insufficient stock for product \"{}\". Available: {}, Requested: {}",
                    product.name, product.stock_quantity, item.quantity
                ))
            };

            if product.stock_quantity < item.quantity {
                return Err(insufficient());
            }

            // Conditional decrement at the store; with the product lock
            // held this cannot lose to a concurrent writer.
            if !tx.decrement_stock(item.product_id, item.quantity).await? {
                return Err(insufficient());
            }

            // Price snapshot is taken per line, at decrement time.
            total += product.price.multiply(item.quantity);
            lines.push(NewLineItem {
                product_id: item.product_id,
                quantity: item.quantity,
                price: product.price,
            });
        }

        let sale = tx
            .insert_sale(NewSale {
                user_id,
                total,
                items: lines,
            })
            .await?;
        tx.commit().await?;

        Ok(sale)
    }

    /// Lists sales, optionally filtered by owner, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_sales(&self, user_id: Option<UserId>) -> Result<Vec<SaleRecord>, SaleError> {
        Ok(self.store.list_sales(user_id).await?)
    }

    /// Reads a single sale by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_sale(&self, id: SaleId) -> Result<SaleRecord, SaleError> {
        self.store
            .get_sale(id)
            .await?
            .ok_or_else(|| SaleError::NotFound("Sale not found".to_string()))
    }
}
