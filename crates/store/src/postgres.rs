//! PostgreSQL-backed store implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{Money, ProductId, SaleId, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::record::{
    NewProduct, NewSale, NewUser, Product, ProductSummary, SaleLineItem, SaleRecord, UserRecord,
    UserSummary,
};
use crate::store::{SaleStore, SaleTx};

/// PostgreSQL-backed inventory/sale store.
#[derive(Clone)]
pub struct PostgresSaleStore {
    pool: PgPool,
}

impl PostgresSaleStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get::<i64, _>("price_cents")?),
            stock_quantity: row.try_get::<i32, _>("stock_quantity")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Loads line items (with product summaries) for a set of sales,
    /// grouped by sale id.
    async fn load_items(&self, sale_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<SaleLineItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.sale_id, i.product_id, i.quantity, i.price_cents,
                   p.name AS product_name, p.sku AS product_sku
            FROM sale_items i
            LEFT JOIN products p ON p.id = i.product_id
            WHERE i.sale_id = ANY($1)
            ORDER BY i.line_no
            "#,
        )
        .bind(sale_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<Uuid, Vec<SaleLineItem>> = HashMap::new();
        for row in rows {
            let sale_id: Uuid = row.try_get("sale_id")?;
            by_sale.entry(sale_id).or_default().push(row_to_item(&row)?);
        }
        Ok(by_sale)
    }

    /// Loads user summaries for a set of user ids.
    async fn load_users(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, UserSummary>> {
        let rows = sqlx::query("SELECT id, email, name FROM users WHERE id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_id = HashMap::new();
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            by_id.insert(
                id,
                UserSummary {
                    id: UserId::from_uuid(id),
                    email: row.try_get("email")?,
                    name: row.try_get("name")?,
                },
            );
        }
        Ok(by_id)
    }

    async fn hydrate_sales(&self, rows: Vec<PgRow>) -> Result<Vec<SaleRecord>> {
        let sale_ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;
        let user_ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("user_id"))
            .collect::<std::result::Result<_, _>>()?;

        let mut items = self.load_items(&sale_ids).await?;
        let users = self.load_users(&user_ids).await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            let user_id: Uuid = row.try_get("user_id")?;
            sales.push(SaleRecord {
                id: SaleId::from_uuid(id),
                user_id: UserId::from_uuid(user_id),
                total: Money::from_cents(row.try_get::<i64, _>("total_cents")?),
                created_at: row.try_get("created_at")?,
                items: items.remove(&id).unwrap_or_default(),
                user: users.get(&user_id).cloned(),
            });
        }
        Ok(sales)
    }
}

fn row_to_item(row: &PgRow) -> Result<SaleLineItem> {
    let product_id: Uuid = row.try_get("product_id")?;
    let product_name: Option<String> = row.try_get("product_name")?;
    let product_sku: Option<String> = row.try_get("product_sku")?;

    let product = match (product_name, product_sku) {
        (Some(name), Some(sku)) => Some(ProductSummary {
            id: ProductId::from_uuid(product_id),
            name,
            sku,
        }),
        _ => None,
    };

    Ok(SaleLineItem {
        id: row.try_get("id")?,
        product_id: ProductId::from_uuid(product_id),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        price: Money::from_cents(row.try_get::<i64, _>("price_cents")?),
        product,
    })
}

#[async_trait]
impl SaleStore for PostgresSaleStore {
    type Tx = PostgresSaleTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresSaleTx { tx })
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let existing = sqlx::query("SELECT id FROM products WHERE sku = $1")
            .bind(&new.sku)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(StoreError::DuplicateSku { sku: new.sku });
        }

        let row = sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, description, price_cents, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sku, name, description, price_cents, stock_quantity,
                      created_at, updated_at
            "#,
        )
        .bind(ProductId::new().as_uuid())
        .bind(&new.sku)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.cents())
        .bind(new.stock_quantity as i32)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(&row)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, sku, name, description, price_cents, stock_quantity,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, sku, name, description, price_cents, stock_quantity,
                   created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    async fn create_user(&self, new: NewUser) -> Result<UserRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, email, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, created_at
            "#,
        )
        .bind(UserId::new().as_uuid())
        .bind(&new.email)
        .bind(&new.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserRecord {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleRecord>> {
        let rows =
            sqlx::query("SELECT id, user_id, total_cents, created_at FROM sales WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_all(&self.pool)
                .await?;

        Ok(self.hydrate_sales(rows).await?.into_iter().next())
    }

    async fn list_sales(&self, user_id: Option<UserId>) -> Result<Vec<SaleRecord>> {
        let rows = match user_id {
            Some(user_id) => {
                sqlx::query(
                    r#"
                    SELECT id, user_id, total_cents, created_at
                    FROM sales
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id.as_uuid())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, user_id, total_cents, created_at
                    FROM sales
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.hydrate_sales(rows).await
    }
}

/// A PostgreSQL transaction. Rolls back on drop unless committed.
pub struct PostgresSaleTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SaleTx for PostgresSaleTx {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, sku, name, description, price_cents, stock_quantity,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(PostgresSaleStore::row_to_product).transpose()
    }

    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - $2,
                updated_at = now()
            WHERE id = $1 AND stock_quantity >= $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity as i32)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_sale(&mut self, sale: NewSale) -> Result<SaleRecord> {
        let sale_id = SaleId::new();
        let row = sqlx::query(
            r#"
            INSERT INTO sales (id, user_id, total_cents)
            VALUES ($1, $2, $3)
            RETURNING created_at
            "#,
        )
        .bind(sale_id.as_uuid())
        .bind(sale.user_id.as_uuid())
        .bind(sale.total.cents())
        .fetch_one(&mut *self.tx)
        .await?;
        let created_at = row.try_get("created_at")?;

        for (line_no, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (id, sale_id, line_no, product_id, quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(sale_id.as_uuid())
            .bind(line_no as i32)
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i32)
            .bind(item.price.cents())
            .execute(&mut *self.tx)
            .await?;
        }

        // Re-read the items inside the transaction so the returned record
        // carries product summaries.
        let item_rows = sqlx::query(
            r#"
            SELECT i.id, i.sale_id, i.product_id, i.quantity, i.price_cents,
                   p.name AS product_name, p.sku AS product_sku
            FROM sale_items i
            LEFT JOIN products p ON p.id = i.product_id
            WHERE i.sale_id = $1
            ORDER BY i.line_no
            "#,
        )
        .bind(sale_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;
        let items = item_rows
            .iter()
            .map(row_to_item)
            .collect::<Result<Vec<_>>>()?;

        let user = sqlx::query("SELECT id, email, name FROM users WHERE id = $1")
            .bind(sale.user_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| -> Result<UserSummary> {
                Ok(UserSummary {
                    id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    email: row.try_get("email")?,
                    name: row.try_get("name")?,
                })
            })
            .transpose()?;

        Ok(SaleRecord {
            id: sale_id,
            user_id: sale.user_id,
            total: sale.total,
            created_at,
            items,
            user,
        })
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
