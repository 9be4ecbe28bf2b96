//! Emotion classifier wrapper for ONNX Runtime inference.

use std::path::Path;
use std::sync::Mutex;

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use tracing::{debug, info};

use super::{InferenceError, EMOTION_LABELS};
use crate::features::{FeatureTensor, N_FRAMES, N_MELS};

/// Pre-trained emotion classifier.
///
/// Loaded once at startup and shared read-only for the process lifetime.
/// `ort::Session::run` needs exclusive access, so inference calls serialize
/// on the inner mutex.
pub struct EmotionModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    input_dims: Vec<i64>,
}

impl std::fmt::Debug for EmotionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionModel")
            .field("input_name", &self.input_name)
            .field("input_dims", &self.input_dims)
            .finish()
    }
}

impl EmotionModel {
    /// Load the classifier from a serialized ONNX artifact.
    ///
    /// Fails when the artifact is unreadable, has no tensor input/output, or
    /// declares an output class count that does not match the label table.
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        info!(path = %path.display(), "Loading emotion model");

        let model_bytes = std::fs::read(path)?;

        let session = Session::builder()
            .map_err(|e| InferenceError::Onnx(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError::Onnx(e.to_string()))?
            .with_intra_threads(4)
            .map_err(|e| InferenceError::Onnx(e.to_string()))?
            .commit_from_memory(&model_bytes)
            .map_err(|e| InferenceError::Onnx(format!("Failed to load model: {e}")))?;

        let input = session
            .inputs()
            .first()
            .ok_or_else(|| InferenceError::Onnx("Model has no inputs".to_string()))?;
        let input_name = input.name().to_string();
        let input_dims: Vec<i64> = match input.dtype() {
            ValueType::Tensor { shape, .. } => shape.iter().copied().collect(),
            other => {
                return Err(InferenceError::Onnx(format!(
                    "Unexpected input type: {other:?}"
                )))
            }
        };

        let output = session
            .outputs()
            .first()
            .ok_or_else(|| InferenceError::Onnx("Model has no outputs".to_string()))?;
        let output_name = output.name().to_string();

        // The label table's length must match the classifier's output width.
        if let ValueType::Tensor { shape, .. } = output.dtype() {
            if let Some(&classes) = shape.last() {
                if classes > 0 && classes as usize != EMOTION_LABELS.len() {
                    return Err(InferenceError::LabelMismatch {
                        expected: EMOTION_LABELS.len(),
                        actual: classes as usize,
                    });
                }
            }
        }

        debug!(
            input = %input_name,
            output = %output_name,
            dims = ?input_dims,
            "Emotion model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_dims,
        })
    }

    /// Declared input dimensions excluding the batch axis
    pub fn feature_dims(&self) -> &[i64] {
        if self.input_dims.len() > 1 {
            &self.input_dims[1..]
        } else {
            &self.input_dims
        }
    }

    /// Run inference on a feature tensor and return the per-class scores
    pub fn predict(&self, features: &FeatureTensor) -> Result<Vec<f32>, InferenceError> {
        let input = Tensor::from_array((
            [1usize, N_MELS, N_FRAMES, 1],
            features.data().to_vec().into_boxed_slice(),
        ))
        .map_err(|e| InferenceError::Onnx(e.to_string()))?;

        let input_name = self.input_name.as_str();

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::Onnx(format!("Session lock error: {e}")))?;

        let outputs = session
            .run(ort::inputs![input_name => input])
            .map_err(|e| InferenceError::Onnx(e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            InferenceError::Onnx(format!("Output '{}' not found", self.output_name))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Onnx(e.to_string()))?;

        debug!(?shape, scores = data.len(), "Classifier output");

        if data.len() != EMOTION_LABELS.len() {
            return Err(InferenceError::LabelMismatch {
                expected: EMOTION_LABELS.len(),
                actual: data.len(),
            });
        }

        Ok(data.to_vec())
    }
}
