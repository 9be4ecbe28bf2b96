//! Prediction route handler.

use std::io::Write;

use axum::{
    extract::{Multipart, State},
    response::Json,
};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::features::FeatureError;
use crate::inference::{argmax, EMOTION_LABELS};
use crate::types::PredictResponse;

use super::AppState;

/// Failures inside the blocking persist-and-extract task
enum UploadError {
    Persist(std::io::Error),
    Extract(FeatureError),
}

/// POST /predict
///
/// Accepts a multipart form with an "audio" field holding the clip and
/// responds with the predicted emotion label.
pub async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, AppError> {
    // Locate the "audio" field
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    {
        if field.name() == Some("audio") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or(AppError::NoAudioField)?;

    if filename.is_empty() {
        return Err(AppError::EmptyFilename);
    }

    info!(filename = %filename, size = bytes.len(), "Received audio upload");

    // Persist the upload to a unique scratch file and extract features in the
    // blocking pool. The NamedTempFile is dropped inside the task, so the
    // file is removed on every exit path.
    let extractor = state.extractor.clone();
    let extracted = tokio::task::spawn_blocking(move || {
        let mut tmp = tempfile::NamedTempFile::new().map_err(UploadError::Persist)?;
        tmp.write_all(&bytes).map_err(UploadError::Persist)?;
        extractor.extract(tmp.path()).map_err(UploadError::Extract)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Feature extraction task panicked");
        AppError::Internal(e.to_string())
    })?;

    let features = match extracted {
        Ok(features) => features,
        Err(UploadError::Persist(e)) => {
            error!(error = %e, "Failed to persist upload");
            return Err(AppError::Internal(e.to_string()));
        }
        Err(UploadError::Extract(e)) => {
            // Opaque to the client; the cause stays in the server log
            warn!(error = %e, "Feature extraction failed");
            return Err(AppError::FeatureExtraction);
        }
    };

    let model = state.model.as_ref().ok_or(AppError::ModelNotLoaded)?.clone();

    // The tensor must match the model's declared input, batch axis excluded.
    // A dynamic declared dimension matches anything.
    let expected = model.feature_dims();
    let actual = features.dims();
    let shape_ok = expected.len() == actual.len()
        && expected.iter().zip(actual.iter()).all(|(e, a)| *e <= 0 || e == a);
    if !shape_ok {
        return Err(AppError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }

    let scores = tokio::task::spawn_blocking(move || model.predict(&features))
        .await
        .map_err(|e| {
            error!(error = %e, "Inference task panicked");
            AppError::Internal(e.to_string())
        })?
        .map_err(|e| {
            error!(error = %e, "Inference failed");
            AppError::from(e)
        })?;

    let idx = argmax(&scores)
        .ok_or_else(|| AppError::Internal("Empty score vector".to_string()))?;
    let label = EMOTION_LABELS
        .get(idx)
        .ok_or_else(|| AppError::Internal(format!("Class index {idx} out of range")))?;

    debug!(emotion = label, "Prediction complete");

    Ok(Json(PredictResponse {
        emotion: (*label).to_string(),
    }))
}
