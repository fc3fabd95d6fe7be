//! PostgreSQL store integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{Money, ProductId, SaleId, UserId};
use sqlx::PgPool;
use store::{
    NewLineItem, NewProduct, NewSale, NewUser, PostgresSaleStore, SaleStore, SaleTx, StoreError,
};
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

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresSaleStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE sale_items, sales, products, users, locks")
        .execute(&pool)
        .await
        .unwrap();

    PostgresSaleStore::new(pool)
}

fn widget(sku: &str, stock: u32, cents: i64) -> NewProduct {
    NewProduct {
        sku: sku.to_string(),
        name: "Widget".to_string(),
        description: Some("A widget".to_string()),
        price: Money::from_cents(cents),
        stock_quantity: stock,
    }
}

#[tokio::test]
async fn product_roundtrip_and_duplicate_sku() {
    let store = get_test_store().await;

    let created = store.create_product(widget("SKU-001", 5, 1000)).await.unwrap();
    let fetched = store.get_product(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.sku, "SKU-001");
    assert_eq!(fetched.stock_quantity, 5);
    assert_eq!(fetched.price, Money::from_cents(1000));

    let err = store
        .create_product(widget("SKU-001", 1, 500))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateSku { .. }));

    assert!(store.get_product(ProductId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn conditional_decrement_is_guarded() {
    let store = get_test_store().await;
    let product = store.create_product(widget("SKU-DEC", 3, 1000)).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(tx.decrement_stock(product.id, 2).await.unwrap());
    assert!(!tx.decrement_stock(product.id, 2).await.unwrap());
    assert!(tx.decrement_stock(product.id, 1).await.unwrap());
    tx.commit().await.unwrap();

    let after = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(after.stock_quantity, 0);
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
    let store = get_test_store().await;
    let product = store.create_product(widget("SKU-RB", 5, 1000)).await.unwrap();

    {
        let mut tx = store.begin().await.unwrap();
        assert!(tx.decrement_stock(product.id, 4).await.unwrap());
        tx.insert_sale(NewSale {
            user_id: UserId::new(),
            total: Money::from_cents(4000),
            items: vec![NewLineItem {
                product_id: product.id,
                quantity: 4,
                price: Money::from_cents(1000),
            }],
        })
        .await
        .unwrap();
        // dropped without commit
    }

    let after = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(after.stock_quantity, 5);
    assert!(store.list_sales(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn sale_read_path_attaches_summaries() {
    let store = get_test_store().await;
    let product = store.create_product(widget("SKU-SUM", 5, 1500)).await.unwrap();
    let user = store
        .create_user(NewUser {
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
        })
        .await
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(tx.decrement_stock(product.id, 2).await.unwrap());
    let sale = tx
        .insert_sale(NewSale {
            user_id: user.id,
            total: Money::from_cents(3000),
            items: vec![NewLineItem {
                product_id: product.id,
                quantity: 2,
                price: Money::from_cents(1500),
            }],
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].product.as_ref().unwrap().sku, "SKU-SUM");
    assert_eq!(sale.user.as_ref().unwrap().email, "alice@example.com");

    let fetched = store.get_sale(sale.id).await.unwrap().unwrap();
    assert_eq!(fetched.total, Money::from_cents(3000));
    assert_eq!(fetched.items[0].quantity, 2);
    assert_eq!(fetched.items[0].product.as_ref().unwrap().name, "Widget");
    assert_eq!(fetched.user.as_ref().unwrap().name, "Alice");

    assert!(store.get_sale(SaleId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_sales_orders_newest_first_and_filters() {
    let store = get_test_store().await;
    let product = store.create_product(widget("SKU-LST", 10, 100)).await.unwrap();
    let alice = UserId::new();
    let bob = UserId::new();

    for (user, qty) in [(alice, 1u32), (bob, 2), (alice, 3)] {
        let mut tx = store.begin().await.unwrap();
        assert!(tx.decrement_stock(product.id, qty).await.unwrap());
        tx.insert_sale(NewSale {
            user_id: user,
            total: Money::from_cents(100).multiply(qty),
            items: vec![NewLineItem {
                product_id: product.id,
                quantity: qty,
                price: Money::from_cents(100),
            }],
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
        // Distinct created_at values for a deterministic order
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let all = store.list_sales(None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].items[0].quantity, 3);
    assert_eq!(all[2].items[0].quantity, 1);

    let alices = store.list_sales(Some(alice)).await.unwrap();
    assert_eq!(alices.len(), 2);
    assert!(alices.iter().all(|s| s.user_id == alice));
}

#[tokio::test]
async fn line_items_preserve_input_order() {
    let store = get_test_store().await;
    let a = store.create_product(widget("SKU-A", 10, 100)).await.unwrap();
    let b = store.create_product(widget("SKU-B", 10, 200)).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let sale = tx
        .insert_sale(NewSale {
            user_id: UserId::new(),
            total: Money::from_cents(500),
            items: vec![
                NewLineItem {
                    product_id: b.id,
                    quantity: 1,
                    price: Money::from_cents(200),
                },
                NewLineItem {
                    product_id: a.id,
                    quantity: 3,
                    price: Money::from_cents(100),
                },
            ],
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let fetched = store.get_sale(sale.id).await.unwrap().unwrap();
    assert_eq!(fetched.items[0].product_id, b.id);
    assert_eq!(fetched.items[1].product_id, a.id);
}
