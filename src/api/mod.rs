//! HTTP API module - health endpoints and dice ingestion

mod ingest;

pub use ingest::{AddedDice, IngestResponse};

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::db::Database;
use crate::service::Services;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub services: Services,
}

/// Build the API router; the ingestion route is only mounted when enabled
pub fn router(db: Arc<Database>, services: Services, server: &ServerConfig) -> Router {
    let state = AppState { db, services };

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/", get(root));
    if server.enabled {
        router = router.merge(ingest::router(&server.path));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "moredice",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}
