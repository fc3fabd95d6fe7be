//! HTTP API server with observability for the POS backend.
//!
//! Provides REST endpoints for sales and products, with structured
//! logging (tracing) and Prometheus metrics. Authentication is an
//! external collaborator: handlers trust the user id supplied by the
//! caller-facing boundary.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::SaleCoordinator;
use lock::{InMemoryLockService, LockService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemorySaleStore, SaleStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: SaleStore, L: LockService> {
    pub coordinator: SaleCoordinator<S, L>,
    pub store: S,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, L>(state: Arc<AppState<S, L>>, metrics_handle: PrometheusHandle) -> Router
where
    S: SaleStore + 'static,
    L: LockService + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/sales", post(routes::sales::create::<S, L>))
        .route("/sales", get(routes::sales::list::<S, L>))
        .route("/sales/{id}", get(routes::sales::get::<S, L>))
        .route("/products", post(routes::products::create::<S, L>))
        .route("/products", get(routes::products::list::<S, L>))
        .route("/products/{id}", get(routes::products::get::<S, L>))
        .route("/users", post(routes::users::create::<S, L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the in-memory backends.
///
/// Used by the test suites and for running the server without a
/// database.
pub fn create_memory_state() -> Arc<AppState<InMemorySaleStore, InMemoryLockService>> {
    let store = InMemorySaleStore::new();
    let locks = InMemoryLockService::new();
    Arc::new(AppState {
        coordinator: SaleCoordinator::new(store.clone(), locks),
        store,
    })
}
