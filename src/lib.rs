pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod models;
pub mod seats;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::LoadError;
use crate::services::{backend::BackendClient, sessions::SelectionStore};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub selections: SelectionStore,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Arc<Self>, LoadError> {
        let backend = BackendClient::from_config(&config.backend, &config.circuit_breaker)?;
        let selections = SelectionStore::new(config.selection.session_ttl_minutes);

        Ok(Arc::new(Self {
            backend,
            selections,
        }))
    }
}

/// Главный роутер: баннер, health-check и API под `/api`.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "LinkedBus Seat Selection API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
