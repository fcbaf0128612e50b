//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::ApiResponse;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /api/v1/health - Succeeds when the database answers
async fn health(State(state): State<AppState>) -> Result<ApiResponse<HealthResponse>, ApiError> {
    if let Err(e) = state.pool.ping().await {
        tracing::warn!("Health check failed: {:#}", e);
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Database unavailable"));
    }
    Ok(ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
