//! HTTP server setup and routing.

mod predict;
mod routes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::features::FeatureExtractor;
use crate::inference::EmotionModel;

/// Shared application state passed to all handlers.
///
/// Constructed once at startup; the model is absent when the artifact failed
/// to load, in which case every prediction request reports that condition.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub model: Option<Arc<EmotionModel>>,
    pub extractor: Arc<FeatureExtractor>,
}

impl AppState {
    pub fn new(config: AppConfig, model: Option<EmotionModel>) -> Self {
        Self {
            config: Arc::new(config),
            model: model.map(Arc::new),
            extractor: Arc::new(FeatureExtractor::new()),
        }
    }

    /// Check if the classifier is loaded
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }
}

/// Creates the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/predict", post(predict::predict))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
