//! Product endpoints.
//!
//! The sale coordinator only reads and decrements products; rows are
//! created and listed here.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Money, ProductId};
use lock::LockService;
use serde::Deserialize;
use store::{NewProduct, Product, SaleStore};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: u32,
}

/// POST /products — create a product with a unique SKU.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<Product>), ApiError>
where
    S: SaleStore,
    L: LockService,
{
    if req.price_cents < 0 {
        return Err(ApiError::BadRequest(
            "Price must not be negative".to_string(),
        ));
    }

    let product = state
        .store
        .create_product(NewProduct {
            sku: req.sku,
            name: req.name,
            description: req.description,
            price: Money::from_cents(req.price_cents),
            stock_quantity: req.stock_quantity,
        })
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(product)))
}

/// GET /products — list products, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
) -> Result<Json<Vec<Product>>, ApiError>
where
    S: SaleStore,
    L: LockService,
{
    Ok(Json(state.store.list_products().await?))
}

/// GET /products/:id — load a single product.
#[tracing::instrument(skip(state))]
pub async fn get<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError>
where
    S: SaleStore,
    L: LockService,
{
    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;

    let product = state
        .store
        .get_product(ProductId::from_uuid(uuid))
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}
