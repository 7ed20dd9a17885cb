//! HTTP handlers and error responses.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection};
use axum::extract::{Form, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use tts_core::{
    DEFAULT_LANGUAGE, EncodedAudio, ModelVariant, SynthesisRequest, TtsError, VariantInfo,
};

use crate::server::AppState;

type SharedState = State<Arc<AppState>>;

/// Error body returned by every endpoint: `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<TtsError> for ApiError {
    fn from(err: TtsError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error generating speech: {err}"),
            )
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// JSON body of `POST /tts`.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub model_type: Option<ModelVariant>,
    #[serde(default)]
    pub language_id: Option<String>,
}

/// Form body of `POST /tts/{variant}`.
#[derive(Debug, Deserialize)]
pub struct VariantForm {
    pub text: String,
    #[serde(default)]
    pub language_id: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    device: &'static str,
    loaded_variants: Vec<ModelVariant>,
    version: String,
    uptime_secs: u64,
}

#[derive(Serialize)]
struct ModelsResponse {
    models: Map<String, Value>,
}

fn audio_response(audio: EncodedAudio) -> Response {
    (
        [
            (header::CONTENT_TYPE, audio.content_type.to_string()),
            (header::CONTENT_DISPOSITION, audio.content_disposition()),
        ],
        audio.bytes,
    )
        .into_response()
}

async fn synthesize(state: &AppState, request: SynthesisRequest) -> Result<Response, ApiError> {
    let audio = state.dispatcher.synthesize(request).await?;
    Ok(audio_response(audio))
}

/// `GET /`
pub async fn root_handler(State(state): SharedState) -> Json<Value> {
    let meta = &state.config.metadata;
    let mut endpoints = Map::new();
    endpoints.insert("POST /tts".into(), "Generate speech from text".into());
    for variant in ModelVariant::ALL {
        endpoints.insert(
            format!("POST /tts/{variant}"),
            format!("Generate speech using {} model", variant.display_name()).into(),
        );
    }
    endpoints.insert(
        "POST /tts/with-voice".into(),
        "Generate speech with custom voice reference".into(),
    );
    endpoints.insert("GET /health".into(), "Health check".into());
    endpoints.insert("GET /models".into(), "List available models".into());
    endpoints.insert("GET /metrics".into(), "Prometheus metrics".into());

    Json(json!({
        "name": meta.title,
        "version": meta.version,
        "description": meta.description,
        "endpoints": endpoints,
    }))
}

/// `GET /health`
pub async fn health_handler(State(state): SharedState) -> impl IntoResponse {
    let registry = state.dispatcher.registry();
    Json(HealthResponse {
        status: "healthy",
        device: registry.device().as_str(),
        loaded_variants: registry.loaded_variants(),
        version: state.config.metadata.version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// `GET /models`
pub async fn models_handler() -> impl IntoResponse {
    let models = ModelVariant::ALL
        .into_iter()
        .map(|variant| {
            let info: VariantInfo = variant.info();
            (variant.as_str().to_string(), json!(info))
        })
        .collect();
    Json(ModelsResponse { models })
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): SharedState) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => ApiError::new(StatusCode::NOT_FOUND, "Metrics recorder is not installed")
            .into_response(),
    }
}

/// `POST /tts` with a JSON body.
pub async fn tts_handler(
    State(state): SharedState,
    body: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let variant = body
        .model_type
        .unwrap_or(state.config.models.default_variant);

    let mut request = SynthesisRequest::new(body.text, variant.as_str());
    request.language_id = body.language_id;
    synthesize(&state, request).await
}

/// `POST /tts/{variant}` with an urlencoded form.
pub async fn tts_variant_handler(
    State(state): SharedState,
    variant: Result<Path<String>, PathRejection>,
    form: Result<Form<VariantForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Path(model_type) = variant?;
    let Form(form) = form?;

    let mut language_id = form.language_id.filter(|lang| !lang.trim().is_empty());
    if model_type == ModelVariant::Multilingual.as_str() && language_id.is_none() {
        language_id = Some(DEFAULT_LANGUAGE.to_string());
    }

    let mut request = SynthesisRequest::new(form.text, model_type);
    request.language_id = language_id;
    synthesize(&state, request).await
}

/// Fields of the `POST /tts/with-voice` multipart body.
#[derive(Debug, Default)]
struct VoiceUpload {
    text: Option<String>,
    model_type: Option<String>,
    language_id: Option<String>,
    voice_file: Option<Vec<u8>>,
}

async fn read_voice_upload(mut multipart: Multipart) -> Result<VoiceUpload, ApiError> {
    let mut upload = VoiceUpload::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => upload.text = Some(field.text().await?),
            "model_type" => upload.model_type = Some(field.text().await?),
            "language_id" => upload.language_id = Some(field.text().await?),
            "voice_file" => {
                debug!(file_name = field.file_name().unwrap_or("-"), "Receiving reference audio");
                upload.voice_file = Some(field.bytes().await?.to_vec());
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }
    Ok(upload)
}

/// `POST /tts/with-voice` with a multipart body carrying the reference recording.
pub async fn tts_with_voice_handler(
    State(state): SharedState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|r| ApiError::new(r.status(), r.body_text()))?;
    let upload = read_voice_upload(multipart).await?;

    let text = upload
        .text
        .ok_or_else(|| ApiError::bad_request("Missing form field 'text'."))?;
    let voice = upload
        .voice_file
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing or empty form field 'voice_file'."))?;
    let model_type = upload
        .model_type
        .filter(|tag| !tag.trim().is_empty())
        .unwrap_or_else(|| state.config.models.default_variant.as_str().to_string());

    let mut request = SynthesisRequest::new(text, model_type).with_reference_audio(voice);
    request.language_id = upload.language_id;
    synthesize(&state, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_core::ValidationError;

    #[test]
    fn test_validation_error_maps_to_400() {
        let err = ApiError::from(TtsError::from(ValidationError::EmptyText));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "Text must not be empty.");
    }

    #[test]
    fn test_internal_error_maps_to_500() {
        let err = ApiError::from(TtsError::synthesis(ModelVariant::Turbo, "boom"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.detail().contains("boom"));
    }

    #[test]
    fn test_json_body_rejects_unknown_variant() {
        let parsed: Result<TtsRequest, _> =
            serde_json::from_str(r#"{"text":"hi","model_type":"huge"}"#);
        assert!(parsed.is_err());

        let parsed: TtsRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert!(parsed.model_type.is_none());
    }
}
