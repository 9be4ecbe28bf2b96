//! Emotion Inference Server
//!
//! A single-purpose HTTP inference server for speech emotion recognition:
//! uploaded audio clips are converted to a fixed-shape log-mel spectrogram
//! and classified by a pre-trained ONNX model into one of six emotions.

pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use features::{FeatureExtractor, FeatureTensor};
pub use inference::{EmotionModel, EMOTION_LABELS};
