//! Sample-rate conversion using rubato.

use rubato::{FftFixedIn, Resampler};

use super::FeatureError;

/// Resample mono audio from `from_rate` to `to_rate`
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, FeatureError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;

    let mut resampler = FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, 1024, 1, 1)
        .map_err(|e| FeatureError::Resample(format!("Resampler init failed: {e}")))?;

    let mut output = Vec::new();
    let chunk_size = resampler.input_frames_max();

    for chunk in samples.chunks(chunk_size) {
        let mut input = vec![chunk.to_vec()];

        // Pad last chunk if needed
        if chunk.len() < chunk_size {
            input[0].resize(chunk_size, 0.0);
        }

        let resampled = resampler
            .process(&input, None)
            .map_err(|e| FeatureError::Resample(format!("Resample failed: {e}")))?;

        if !resampled.is_empty() {
            output.extend_from_slice(&resampled[0]);
        }
    }

    // Trim to expected length
    let expected_len = (samples.len() as f64 * ratio) as usize;
    output.truncate(expected_len);

    Ok(output)
}
