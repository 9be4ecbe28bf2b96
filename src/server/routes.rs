//! HTTP route handlers.

use axum::{extract::State, response::Json};

use crate::types::{HealthResponse, HealthStatus};

use super::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Health check endpoint
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.has_model();

    // Degraded when the classifier failed to load at startup
    let status = if model_loaded {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        version: VERSION.to_string(),
        model_loaded,
    })
}
