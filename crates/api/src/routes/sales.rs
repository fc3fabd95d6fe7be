//! Sale endpoints: the commit protocol entry point and read projections.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use checkout::SaleItemRequest;
use common::{ProductId, SaleId, UserId};
use lock::LockService;
use serde::Deserialize;
use store::{SaleRecord, SaleStore};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateSaleRequest {
    /// Supplied by the authentication boundary, trusted here.
    pub user_id: uuid::Uuid,
    pub items: Vec<SaleItemBody>,
}

#[derive(Deserialize)]
pub struct SaleItemBody {
    pub product_id: uuid::Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    pub user_id: Option<uuid::Uuid>,
}

/// POST /sales — commit a sale.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(axum::http::StatusCode, Json<SaleRecord>), ApiError>
where
    S: SaleStore,
    L: LockService,
{
    if let Some(item) = req.items.iter().find(|item| item.quantity < 1) {
        return Err(ApiError::BadRequest(format!(
            "Quantity must be at least 1 for product {}",
            item.product_id
        )));
    }

    let items: Vec<SaleItemRequest> = req
        .items
        .iter()
        .map(|item| SaleItemRequest {
            product_id: ProductId::from_uuid(item.product_id),
            quantity: item.quantity,
        })
        .collect();

    let sale = state
        .coordinator
        .create_sale(UserId::from_uuid(req.user_id), &items)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(sale)))
}

/// GET /sales — list sales, optionally filtered by owner, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Query(query): Query<ListSalesQuery>,
) -> Result<Json<Vec<SaleRecord>>, ApiError>
where
    S: SaleStore,
    L: LockService,
{
    let sales = state
        .coordinator
        .list_sales(query.user_id.map(UserId::from_uuid))
        .await?;
    Ok(Json(sales))
}

/// GET /sales/:id — load a single sale.
#[tracing::instrument(skip(state))]
pub async fn get<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<String>,
) -> Result<Json<SaleRecord>, ApiError>
where
    S: SaleStore,
    L: LockService,
{
    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    let sale = state.coordinator.get_sale(SaleId::from_uuid(uuid)).await?;
    Ok(Json(sale))
}
