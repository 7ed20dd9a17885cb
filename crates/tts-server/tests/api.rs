//! HTTP surface tests driven through the router with `oneshot`.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use runtime::{Dispatcher, ModelRegistry, SyntheticProvider};
use tts_core::{ApiConfig, Device, SynthesisResult};
use tts_server::{AppState, build_router};

const BOUNDARY: &str = "chatterbox-test-boundary";

fn app_with(temp_dir: Option<PathBuf>) -> (Router, Arc<AppState>) {
    let mut config = ApiConfig::default();
    config.models.temp_dir = temp_dir;

    let registry = ModelRegistry::new(Device::Cpu, Arc::new(SyntheticProvider::new()));
    let dispatcher = Dispatcher::new(registry, config.dispatch());
    let state = Arc::new(AppState::new(dispatcher, config, None));
    (build_router(Arc::clone(&state)).unwrap(), state)
}

fn app() -> Router {
    app_with(None).0
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(fields: &[(&str, &str)], voice: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
                 {value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(voice) = voice {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"voice_file\"; filename=\"ref.wav\"\r\n\
                 Content-Type: audio/wav\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(voice);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/tts/with-voice")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn disposition(response: &axum::response::Response) -> String {
    response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string()
}

fn reference_wav() -> Vec<u8> {
    let samples: Vec<f32> = (0..8000).map(|n| (n as f32 * 0.03).sin() * 0.4).collect();
    audio_codec::encode_wav(&SynthesisResult::new(samples, 16000)).unwrap()
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let response = app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["name"], "Chatterbox TTS API");
    assert!(body["endpoints"]["POST /tts/with-voice"].is_string());
    assert!(body["endpoints"]["POST /tts/multilingual"].is_string());
}

#[tokio::test]
async fn test_health_on_fresh_server() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["device"], "cpu");
    assert_eq!(body["loaded_variants"], serde_json::json!([]));
}

#[tokio::test]
async fn test_models_catalogue() {
    let body = json_body(app().oneshot(get("/models")).await.unwrap()).await;

    assert_eq!(body["models"]["turbo"]["languages"], serde_json::json!(["en"]));
    assert_eq!(
        body["models"]["multilingual"]["languages"].as_array().unwrap().len(),
        23
    );
    assert!(body["models"]["original"]["best_for"].is_string());
}

#[tokio::test]
async fn test_metrics_absent_without_recorder() {
    let response = app().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json_body(response).await["detail"].is_string());
}

#[tokio::test]
async fn test_json_turbo_then_health_lists_turbo() {
    let (router, _state) = app_with(None);

    let response = router
        .clone()
        .oneshot(json_request("/tts", r#"{"text":"Hello world","model_type":"turbo"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(disposition(&response), "attachment; filename=turbo_output.wav");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let reader = hound::WavReader::new(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert!(reader.len() > 0);

    let health = json_body(router.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["loaded_variants"], serde_json::json!(["turbo"]));
}

#[tokio::test]
async fn test_json_defaults_to_configured_variant() {
    let response = app()
        .oneshot(json_request("/tts", r#"{"text":"Hello"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(disposition(&response), "attachment; filename=turbo_output.wav");
}

#[tokio::test]
async fn test_json_unknown_variant_is_422() {
    let response = app()
        .oneshot(json_request("/tts", r#"{"text":"Hello","model_type":"huge"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["detail"].is_string());
}

#[tokio::test]
async fn test_text_too_long_is_400_and_names_limit() {
    let (router, state) = app_with(None);
    let body = serde_json::json!({ "text": "A".repeat(6000), "model_type": "turbo" }).to_string();

    let response = router.oneshot(json_request("/tts", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("5000"), "{detail}");
    assert!(state.dispatcher.registry().loaded_variants().is_empty());
}

#[tokio::test]
async fn test_language_on_turbo_is_400() {
    let response = app()
        .oneshot(json_request(
            "/tts",
            r#"{"text":"Hello","model_type":"turbo","language_id":"en"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_path_multilingual_with_language() {
    let response = app()
        .oneshot(form_request("/tts/multilingual", "text=Bonjour&language_id=fr"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        disposition(&response),
        "attachment; filename=multilingual_fr_output.wav"
    );
}

#[tokio::test]
async fn test_path_multilingual_defaults_to_english() {
    let response = app()
        .oneshot(form_request("/tts/multilingual", "text=Hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        disposition(&response),
        "attachment; filename=multilingual_en_output.wav"
    );
}

#[tokio::test]
async fn test_path_multilingual_blank_language_defaults_to_english() {
    for body in ["text=Hello&language_id=", "text=Hello&language_id=+"] {
        let response = app()
            .oneshot(form_request("/tts/multilingual", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "body {body}");
        assert_eq!(
            disposition(&response),
            "attachment; filename=multilingual_en_output.wav"
        );
    }
}

#[tokio::test]
async fn test_path_original() {
    let response = app()
        .oneshot(form_request("/tts/original", "text=Good+morning"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(disposition(&response), "attachment; filename=original_output.wav");
}

#[tokio::test]
async fn test_path_unknown_variant_is_400() {
    let response = app()
        .oneshot(form_request("/tts/huge", "text=Hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("huge"));
}

#[tokio::test]
async fn test_path_missing_text_is_422() {
    let response = app()
        .oneshot(form_request("/tts/turbo", "language_id=en"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_with_voice_cleans_temp_dir() {
    let temp = tempfile::tempdir().unwrap();
    let (router, _state) = app_with(Some(temp.path().to_path_buf()));
    let voice = reference_wav();

    let response = router
        .oneshot(multipart_request(
            &[("text", "Clone me"), ("model_type", "original")],
            Some(&voice),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        disposition(&response),
        "attachment; filename=original_custom_voice_output.wav"
    );
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_with_voice_bad_audio_is_500_and_cleans_up() {
    let temp = tempfile::tempdir().unwrap();
    let (router, _state) = app_with(Some(temp.path().to_path_buf()));

    let response = router
        .oneshot(multipart_request(&[("text", "Clone me")], Some(b"not a wav")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_with_voice_missing_file_is_400() {
    let response = app()
        .oneshot(multipart_request(&[("text", "Clone me")], None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("voice_file"));
}

#[tokio::test]
async fn test_with_voice_requires_multipart_body() {
    let response = app()
        .oneshot(json_request("/tts/with-voice", r#"{"text":"Clone me"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().is_some_and(|detail| !detail.is_empty()));
}
