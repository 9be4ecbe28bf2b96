use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Application-level errors.
///
/// The `Display` strings double as the wire-level `error` messages, so the
/// exact wording here is part of the HTTP contract.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No audio file uploaded")]
    NoAudioField,

    #[error("Empty file uploaded")]
    EmptyFilename,

    #[error("Feature extraction failed")]
    FeatureExtraction,

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Feature shape mismatch. Expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<i64>,
        actual: Vec<i64>,
    },

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoAudioField | Self::EmptyFilename => StatusCode::BAD_REQUEST,
            Self::FeatureExtraction
            | Self::ModelNotLoaded
            | Self::ShapeMismatch { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
