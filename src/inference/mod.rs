//! Emotion classifier inference via ONNX Runtime.

mod model;

pub use model::EmotionModel;

use crate::error::AppError;

/// Emotion labels in classifier output order.
///
/// The order matches the label encoding used when the model was trained;
/// `EmotionModel::load` verifies the artifact's output width against this
/// table.
pub const EMOTION_LABELS: [&str; 6] = ["Neutral", "Happy", "Sad", "Angry", "Fear", "Surprise"];

/// Inference error types
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("ONNX runtime error: {0}")]
    Onnx(String),

    #[error("Model declares {actual} output classes, expected {expected}")]
    LabelMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Index of the maximum score, first occurrence winning ties
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best_idx = 0;
    let mut best = *scores.first()?;

    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > best {
            best_idx = i;
            best = s;
        }
    }

    Some(best_idx)
}
