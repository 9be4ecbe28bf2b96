//! Feature extraction: audio file -> fixed-shape log-mel tensor.
//!
//! The pipeline decodes an uploaded clip, downmixes to mono, resamples to
//! 16 kHz, computes a 40-band log-mel spectrogram, and normalizes the time
//! axis to exactly 100 frames. The resulting tensor is what the emotion
//! classifier was trained on; the constants below are coupled to the model
//! artifact and are deliberately not configurable.

mod decoder;
mod mel;
mod resample;

pub use decoder::{decode_file, DecodedAudio};
pub use mel::{power_to_db, MelSpectrogram};
pub use resample::resample;

use std::path::Path;

/// Sample rate the classifier was trained at
pub const SAMPLE_RATE: u32 = 16_000;
/// Number of mel bands
pub const N_MELS: usize = 40;
/// FFT window size
pub const N_FFT: usize = 1024;
/// Hop length between frames
pub const HOP_LENGTH: usize = 512;
/// Fixed number of time frames fed to the classifier
pub const N_FRAMES: usize = 100;

/// Feature extraction error types
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Audio decode error: {0}")]
    Decode(String),

    #[error("Resample error: {0}")]
    Resample(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed-shape feature tensor, logically (1, 40, 100, 1).
///
/// Stored as a flat buffer in (mel, time) row-major order, which is the
/// layout of the classifier's NHWC input with the batch and channel
/// dimensions squeezed out.
#[derive(Debug, Clone)]
pub struct FeatureTensor {
    data: Vec<f32>,
}

impl FeatureTensor {
    /// Build a tensor from frame-major dB rows, normalizing the time axis:
    /// clips shorter than 100 frames are right-padded with zeros, longer
    /// clips keep their leftmost 100 frames.
    pub fn from_frames(frames: &[Vec<f32>]) -> Self {
        let mut data = vec![0.0f32; N_MELS * N_FRAMES];

        for (t, frame) in frames.iter().take(N_FRAMES).enumerate() {
            for (m, &v) in frame.iter().take(N_MELS).enumerate() {
                data[m * N_FRAMES + t] = v;
            }
        }

        Self { data }
    }

    /// Tensor dimensions excluding the batch axis
    pub fn dims(&self) -> [i64; 3] {
        [N_MELS as i64, N_FRAMES as i64, 1]
    }

    /// Flat tensor data in (mel, time) row-major order
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at a (mel band, time frame) position
    pub fn at(&self, mel: usize, frame: usize) -> f32 {
        self.data[mel * N_FRAMES + frame]
    }
}

/// Feature extractor holding the precomputed mel filter bank and FFT plan
pub struct FeatureExtractor {
    mel: MelSpectrogram,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            mel: MelSpectrogram::new(N_FFT, HOP_LENGTH, N_MELS, SAMPLE_RATE),
        }
    }

    /// Extract the classifier's feature tensor from an audio file.
    ///
    /// Never fails on clip length: any decodable clip produces a full
    /// 40x100 tensor via padding or truncation.
    pub fn extract(&self, path: &Path) -> Result<FeatureTensor, FeatureError> {
        let decoded = decode_file(path)?;
        let mono = decoded.to_mono();

        let samples = if decoded.sample_rate != SAMPLE_RATE {
            resample(&mono, decoded.sample_rate, SAMPLE_RATE)?
        } else {
            mono
        };

        let mel_power = self.mel.compute(&samples);
        let mel_db = power_to_db(&mel_power);

        tracing::debug!(
            input_frames = mel_db.len(),
            sample_rate = decoded.sample_rate,
            channels = decoded.channels,
            "Extracted mel features"
        );

        Ok(FeatureTensor::from_frames(&mel_db))
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
