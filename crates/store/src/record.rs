//! Persisted record shapes.

use chrono::{DateTime, Utc};
use common::{Money, ProductId, SaleId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product row: unique SKU, display name, unit price, and the
/// non-negative stock counter the sale coordinator decrements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_quantity: u32,
}

/// The product fields attached to sale line items on the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
        }
    }
}

/// A user account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
}

/// The user fields attached to sales on the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// One line of a committed sale, carrying the unit price snapshot taken
/// at decrement time. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineItem {
    pub id: Uuid,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
    /// Present on the read path when the product row still exists.
    pub product: Option<ProductSummary>,
}

/// A committed sale with its line items. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub user_id: UserId,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleLineItem>,
    /// Present on the read path when the user row exists.
    pub user: Option<UserSummary>,
}

/// One line of a sale being assembled by the coordinator.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// A sale ready to be inserted, with all line prices already snapshotted.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub user_id: UserId,
    pub total: Money,
    pub items: Vec<NewLineItem>,
}
