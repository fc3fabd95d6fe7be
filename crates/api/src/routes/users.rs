//! User provisioning endpoint.
//!
//! Authentication is an external collaborator; this only creates the
//! account rows that back user summaries on the sale read path.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use lock::LockService;
use serde::Deserialize;
use store::{NewUser, SaleStore, UserRecord};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
}

/// POST /users — create a user account.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(axum::http::StatusCode, Json<UserRecord>), ApiError>
where
    S: SaleStore,
    L: LockService,
{
    let user = state
        .store
        .create_user(NewUser {
            email: req.email,
            name: req.name,
        })
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(user)))
}
