//! Audio file decoding using symphonia.
//!
//! Decodes an uploaded clip to raw PCM samples for feature extraction.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::FeatureError;

/// Result of decoding an audio file
#[derive(Debug)]
pub struct DecodedAudio {
    /// Decoded samples as f32, channel-interleaved
    pub samples: Vec<f32>,
    /// Number of channels in the decoded audio
    pub channels: u8,
    /// Native sample rate of the clip
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Downmix to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks_exact(self.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }
}

/// Decode an audio file to f32 samples
pub fn decode_file(path: &Path) -> Result<DecodedAudio, FeatureError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint the probe with the uploaded file's extension, if any
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| FeatureError::Decode(format!("Failed to probe format: {e}")))?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| FeatureError::Decode("No audio track found".to_string()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| FeatureError::Decode("Missing sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u8)
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| FeatureError::Decode(format!("Failed to create decoder: {e}")))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() != track_id {
                    continue;
                }

                match decoder.decode(&packet) {
                    Ok(decoded) => append_samples(&decoded, &mut samples),
                    Err(SymphoniaError::DecodeError(e)) => {
                        tracing::warn!(error = %e, "Decode error, skipping packet");
                        continue;
                    }
                    Err(e) => {
                        return Err(FeatureError::Decode(format!("Decode error: {e}")));
                    }
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // End of stream
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error reading packet, stopping decode");
                break;
            }
        }
    }

    if samples.is_empty() {
        return Err(FeatureError::Decode("No audio samples decoded".to_string()));
    }

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}

/// Append decoded samples, converting any source format to interleaved f32
fn append_samples(decoded: &AudioBufferRef, output: &mut Vec<f32>) {
    let spec = *decoded.spec();
    let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
    sample_buf.copy_interleaved_ref(decoded.clone());
    output.extend_from_slice(sample_buf.samples());
}
