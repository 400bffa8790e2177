//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::config::DatabaseDriver;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: DatabaseDriver,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    if let Err(e) = state.pool.ping().await {
        tracing::error!("Health check failed: {:#}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }
    Ok(Json(HealthResponse {
        status: "ok",
        database: state.pool.driver(),
    }))
}
