//! Mel spectrogram computation.
//!
//! Centered STFT (frame count = len/hop + 1), periodic Hann window, HTK-style
//! triangular mel filter bank, and peak-referenced decibel conversion.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Mel spectrogram computer
pub struct MelSpectrogram {
    n_fft: usize,
    hop_length: usize,
    mel_filters: Vec<Vec<f32>>,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl MelSpectrogram {
    pub fn new(n_fft: usize, hop_length: usize, n_mels: usize, sample_rate: u32) -> Self {
        let window = hann_window(n_fft);
        let mel_filters = mel_filterbank(n_fft, n_mels, sample_rate);
        let fft = FftPlanner::new().plan_fft_forward(n_fft);

        Self {
            n_fft,
            hop_length,
            mel_filters,
            window,
            fft,
        }
    }

    /// Compute mel power spectrogram frames from mono audio.
    ///
    /// Returns frame-major rows of `n_mels` power values. The signal is
    /// zero-padded by `n_fft / 2` on both edges so every hop position yields
    /// a frame (`len / hop + 1` frames total).
    pub fn compute(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let num_frames = (padded.len() - self.n_fft) / self.hop_length + 1;
        let n_freqs = self.n_fft / 2 + 1;

        let mut frames = Vec::with_capacity(num_frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut power = vec![0.0f32; n_freqs];

        for t in 0..num_frames {
            let start = t * self.hop_length;

            for (j, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(padded[start + j] * self.window[j], 0.0);
            }

            self.fft.process(&mut buffer);

            for (k, p) in power.iter_mut().enumerate() {
                *p = buffer[k].norm_sqr();
            }

            let mel_row: Vec<f32> = self
                .mel_filters
                .iter()
                .map(|filter| filter.iter().zip(power.iter()).map(|(f, p)| f * p).sum())
                .collect();

            frames.push(mel_row);
        }

        frames
    }
}

/// Convert mel power frames to decibels relative to the clip's peak power.
///
/// Values below 1e-10 are clamped before the log, and the result is floored
/// at 80 dB below the peak. With the peak as reference the output range is
/// exactly [-80, 0].
pub fn power_to_db(frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
    const AMIN: f32 = 1e-10;
    const TOP_DB: f32 = 80.0;

    let ref_power = frames
        .iter()
        .flat_map(|row| row.iter())
        .fold(AMIN, |acc, &v| acc.max(v));
    let ref_db = 10.0 * ref_power.log10();

    let mut out: Vec<Vec<f32>> = frames
        .iter()
        .map(|row| {
            row.iter()
                .map(|&v| 10.0 * v.max(AMIN).log10() - ref_db)
                .collect()
        })
        .collect();

    let max_db = out
        .iter()
        .flat_map(|row| row.iter())
        .fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let floor = max_db - TOP_DB;

    for row in &mut out {
        for v in row.iter_mut() {
            if *v < floor {
                *v = floor;
            }
        }
    }

    out
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Hz to Mel conversion (HTK)
fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz conversion (HTK)
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filter bank covering 0 Hz to Nyquist
fn mel_filterbank(n_fft: usize, n_mels: usize, sample_rate: u32) -> Vec<Vec<f32>> {
    let n_freqs = n_fft / 2 + 1;
    let fmax = sample_rate as f32 / 2.0;

    let freq_bins: Vec<f32> = (0..n_freqs)
        .map(|i| i as f32 * sample_rate as f32 / n_fft as f32)
        .collect();

    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(fmax);
    let mel_points: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
        .collect();

    let mut filters = vec![vec![0.0; n_freqs]; n_mels];

    for m in 0..n_mels {
        let left = mel_points[m];
        let center = mel_points[m + 1];
        let right = mel_points[m + 2];

        for (k, &freq) in freq_bins.iter().enumerate() {
            if freq >= left && freq <= center && center > left {
                filters[m][k] = (freq - left) / (center - left);
            } else if freq > center && freq <= right && right > center {
                filters[m][k] = (right - freq) / (right - center);
            }
        }
    }

    filters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window_shape() {
        let w = hann_window(1024);
        assert_eq!(w.len(), 1024);
        assert!(w[0].abs() < 1e-6);
        // Periodic window peaks at the midpoint
        assert!((w[512] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_filterbank_dimensions() {
        let filters = mel_filterbank(1024, 40, 16_000);
        assert_eq!(filters.len(), 40);
        assert_eq!(filters[0].len(), 513);
        // Every band must pass some energy
        for filter in &filters {
            assert!(filter.iter().any(|&v| v > 0.0));
            assert!(filter.iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn test_compute_frame_count() {
        let mel = MelSpectrogram::new(1024, 512, 40, 16_000);
        let samples = vec![0.0f32; 16_000];
        let frames = mel.compute(&samples);
        // Centered STFT: len / hop + 1
        assert_eq!(frames.len(), 16_000 / 512 + 1);
        assert_eq!(frames[0].len(), 40);
    }

    #[test]
    fn test_tone_has_energy() {
        let mel = MelSpectrogram::new(1024, 512, 40, 16_000);
        let samples: Vec<f32> = (0..16_000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 16_000.0).sin())
            .collect();
        let frames = mel.compute(&samples);
        let total: f32 = frames.iter().flat_map(|r| r.iter()).sum();
        assert!(total > 0.0);
    }

    #[test]
    fn test_power_to_db_range() {
        let frames = vec![vec![1.0f32, 0.5, 1e-12], vec![0.25, 0.1, 0.01]];
        let db = power_to_db(&frames);

        let max = db
            .iter()
            .flat_map(|r| r.iter())
            .fold(f32::NEG_INFINITY, |a, &v| a.max(v));
        let min = db
            .iter()
            .flat_map(|r| r.iter())
            .fold(f32::INFINITY, |a, &v| a.min(v));

        // Peak-referenced: max is 0 dB, floor is -80 dB
        assert!(max.abs() < 1e-5);
        assert!(min >= -80.0 - 1e-5);
    }

    #[test]
    fn test_power_to_db_relative_levels() {
        let frames = vec![vec![1.0f32, 0.1]];
        let db = power_to_db(&frames);
        assert!((db[0][0] - 0.0).abs() < 1e-5);
        assert!((db[0][1] - (-10.0)).abs() < 1e-4);
    }
}
