//! In-memory store implementation for testing.
//!
//! Provides the same interface as the PostgreSQL implementation. A
//! transaction takes the state write lock for its whole lifetime and
//! mutates a staged copy, so concurrent transactions serialize exactly
//! like they would against a single database row set.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{ProductId, SaleId, UserId};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::record::{
    NewProduct, NewSale, NewUser, Product, ProductSummary, SaleLineItem, SaleRecord, UserRecord,
    UserSummary,
};
use crate::store::{SaleStore, SaleTx};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: HashMap<ProductId, Product>,
    users: HashMap<UserId, UserRecord>,
    /// Sales in commit order (oldest first).
    sales: Vec<SaleRecord>,
}

impl MemoryState {
    fn hydrate(&self, sale: &SaleRecord) -> SaleRecord {
        let mut sale = sale.clone();
        sale.user = self.users.get(&sale.user_id).map(UserSummary::from);
        for item in &mut sale.items {
            item.product = self.products.get(&item.product_id).map(ProductSummary::from);
        }
        sale
    }
}

/// In-memory inventory/sale store.
#[derive(Clone, Default)]
pub struct InMemorySaleStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemorySaleStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed sales.
    pub async fn sale_count(&self) -> usize {
        self.state.read().await.sales.len()
    }

    /// Returns the current stock counter for a product, if it exists.
    pub async fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(&id)
            .map(|p| p.stock_quantity)
    }

    /// Clears all products, users, and sales.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = MemoryState::default();
    }
}

#[async_trait]
impl SaleStore for InMemorySaleStore {
    type Tx = InMemorySaleTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().write_owned().await;
        let staged = guard.clone();
        Ok(InMemorySaleTx { guard, staged })
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;

        if state.products.values().any(|p| p.sku == new.sku) {
            return Err(StoreError::DuplicateSku { sku: new.sku });
        }

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            sku: new.sku,
            name: new.name,
            description: new.description,
            price: new.price,
            stock_quantity: new.stock_quantity,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn create_user(&self, new: NewUser) -> Result<UserRecord> {
        let mut state = self.state.write().await;
        let user = UserRecord {
            id: UserId::new(),
            email: new.email,
            name: new.name,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleRecord>> {
        let state = self.state.read().await;
        Ok(state
            .sales
            .iter()
            .find(|s| s.id == id)
            .map(|s| state.hydrate(s)))
    }

    async fn list_sales(&self, user_id: Option<UserId>) -> Result<Vec<SaleRecord>> {
        let state = self.state.read().await;
        Ok(state
            .sales
            .iter()
            .rev()
            .filter(|s| user_id.is_none_or(|u| s.user_id == u))
            .map(|s| state.hydrate(s))
            .collect())
    }
}

/// An in-memory transaction.
///
/// Holds the state write lock until commit or drop; dropping without
/// commit discards every staged write.
pub struct InMemorySaleTx {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl SaleTx for InMemorySaleTx {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<bool> {
        match self.staged.products.get_mut(&id) {
            Some(product) if product.stock_quantity >= quantity => {
                product.stock_quantity -= quantity;
                product.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_sale(&mut self, sale: NewSale) -> Result<SaleRecord> {
        let record = SaleRecord {
            id: SaleId::new(),
            user_id: sale.user_id,
            total: sale.total,
            created_at: Utc::now(),
            items: sale
                .items
                .into_iter()
                .map(|item| SaleLineItem {
                    id: Uuid::new_v4(),
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                    product: None,
                })
                .collect(),
            user: None,
        };
        self.staged.sales.push(record.clone());
        Ok(self.staged.hydrate(&record))
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = self.staged;
        Ok(())
    }
}
