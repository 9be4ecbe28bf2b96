//! Integration tests for API endpoints.
//!
//! These tests exercise the HTTP surface without a real classifier artifact
//! (loading one would make the suite depend on a multi-megabyte model file);
//! the no-model state is itself part of the contract. The feature pipeline
//! has its own unit coverage against synthesized WAV clips.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::Value;
use std::f32::consts::PI;

use emotion_server::config::AppConfig;
use emotion_server::server::{create_router, AppState};

/// Create a test server with default configuration (no model loaded)
fn create_test_server() -> TestServer {
    let config = AppConfig::default();
    let state = AppState::new(config, None);
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

/// Synthesize an in-memory 16 kHz mono WAV of a pure tone
fn tone_wav_bytes(duration_s: f32, freq: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let n = (16_000.0 * duration_s) as usize;
        for i in 0..n {
            let s = ((2.0 * PI * freq * i as f32 / 16_000.0).sin() * 20_000.0) as i16;
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn error_message(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_without_audio_field() {
    let server = create_test_server();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(tone_wav_bytes(0.5, 440.0)).file_name("clip.wav"),
    );

    let response = server.post("/predict").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(error_message(&body), "No audio file uploaded");
}

#[tokio::test]
async fn test_predict_with_empty_filename() {
    let server = create_test_server();

    let form = MultipartForm::new().add_part(
        "audio",
        Part::bytes(tone_wav_bytes(0.5, 440.0)).file_name(""),
    );

    let response = server.post("/predict").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(error_message(&body), "Empty file uploaded");
}

#[tokio::test]
async fn test_predict_with_corrupt_audio() {
    let server = create_test_server();

    let form = MultipartForm::new().add_part(
        "audio",
        Part::bytes(b"definitely not a wav file".to_vec()).file_name("noise.wav"),
    );

    let response = server.post("/predict").multipart(form).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(error_message(&body), "Feature extraction failed");
}

#[tokio::test]
async fn test_predict_without_model() {
    let server = create_test_server();

    // Extraction succeeds on a well-formed clip, then the missing classifier
    // is reported
    let form = MultipartForm::new().add_part(
        "audio",
        Part::bytes(tone_wav_bytes(1.0, 440.0)).file_name("clip.wav"),
    );

    let response = server.post("/predict").multipart(form).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(error_message(&body), "Model not loaded");
}

#[tokio::test]
async fn test_predict_finds_audio_among_other_fields() {
    let server = create_test_server();

    let form = MultipartForm::new()
        .add_text("note", "recorded outdoors")
        .add_part(
            "audio",
            Part::bytes(tone_wav_bytes(1.0, 440.0)).file_name("clip.wav"),
        );

    let response = server.post("/predict").multipart(form).await;

    // Past field validation and extraction; fails only on the absent model
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(error_message(&body), "Model not loaded");
}
