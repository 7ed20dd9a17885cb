//! Request validation and dispatch to model instances.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use uuid::Uuid;

use audio_codec::{WAV_CONTENT_TYPE, encode_wav};
use tts_core::{
    DispatchConfig, EncodedAudio, GenerateOptions, MULTILINGUAL_LANGUAGES, ModelVariant,
    SynthesisRequest, TtsError, TtsResult, ValidationError, text_preview,
};

use crate::metrics::TtsMetrics;
use crate::registry::{ModelInstance, ModelRegistry};
use crate::staging::StagedAudio;

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub variant: ModelVariant,
    pub text: String,
    /// Lowercased language id; only ever set for the multilingual variant.
    pub language_id: Option<String>,
    pub reference_audio: Option<Vec<u8>>,
}

impl ValidatedRequest {
    /// Suggested download filename for the generated audio.
    pub fn filename(&self) -> String {
        if self.reference_audio.is_some() {
            return format!("{}_custom_voice_output.wav", self.variant);
        }
        match &self.language_id {
            Some(lang) => format!("{}_{lang}_output.wav", self.variant),
            None => format!("{}_output.wav", self.variant),
        }
    }
}

/// Validates synthesis requests and runs them on registry instances.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ModelRegistry,
    config: DispatchConfig,
    metrics: TtsMetrics,
}

impl Dispatcher {
    pub fn new(registry: ModelRegistry, config: DispatchConfig) -> Self {
        Self {
            registry,
            config,
            metrics: TtsMetrics::default(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Check a request without touching the registry.
    ///
    /// Order: text (empty, then length), variant tag, language id.
    pub fn validate(&self, request: SynthesisRequest) -> Result<ValidatedRequest, ValidationError> {
        if request.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let len = request.text.chars().count();
        if len > self.config.max_text_length {
            return Err(ValidationError::TextTooLong {
                len,
                max: self.config.max_text_length,
            });
        }

        let variant: ModelVariant = request.model_type.parse()?;

        let language_id = request
            .language_id
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty());
        if let Some(lang) = &language_id {
            if !variant.supports_language_id() || !MULTILINGUAL_LANGUAGES.contains(&lang.as_str()) {
                return Err(ValidationError::UnsupportedLanguage {
                    variant,
                    language: lang.clone(),
                });
            }
        }

        Ok(ValidatedRequest {
            variant,
            text: request.text,
            language_id,
            reference_audio: request.reference_audio,
        })
    }

    /// Validate, synthesize and encode one request.
    pub async fn synthesize(&self, request: SynthesisRequest) -> TtsResult<EncodedAudio> {
        let request_id = Uuid::new_v4();
        let preview = request.text_preview().to_string();
        let model_type = request.model_type.clone();
        self.metrics.request_received();

        let result = self.run(request_id, request).await;
        match &result {
            Ok(audio) => self.metrics.request_completed(audio.variant),
            Err(err) => {
                self.metrics.request_failed(err.kind());
                if err.is_client_error() {
                    warn!(
                        %request_id,
                        model_type = %model_type,
                        text = %preview,
                        "Rejected TTS request: {err}"
                    );
                } else {
                    error!(
                        %request_id,
                        model_type = %model_type,
                        text = %preview,
                        kind = err.kind(),
                        "Error generating TTS: {err}"
                    );
                }
            }
        }
        result
    }

    async fn run(&self, request_id: Uuid, request: SynthesisRequest) -> TtsResult<EncodedAudio> {
        let request = self.validate(request)?;
        let instance = self.registry.get_or_load(request.variant).await?;

        info!(
            %request_id,
            variant = %request.variant,
            language = request.language_id.as_deref().unwrap_or("-"),
            custom_voice = request.reference_audio.is_some(),
            text = %text_preview(&request.text),
            "Generating audio with {} model",
            request.variant
        );

        let temp_dir = self.config.temp_dir.clone();
        let start = Instant::now();
        // The blocking job outlives this future when the client disconnects,
        // so the gauge slot travels with it.
        let active = self.metrics.track_active();
        let audio = tokio::task::spawn_blocking(move || {
            let _active = active;
            render(&instance, &request, temp_dir.as_deref(), request_id)
        })
        .await
        .map_err(|e| TtsError::internal(format!("synthesis task failed: {e}")))??;

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let duration_ms = audio.duration_ms();
        let rtf = if duration_ms > 0.0 {
            elapsed_ms / duration_ms
        } else {
            0.0
        };
        self.metrics.record_synthesis_latency(audio.variant, elapsed_ms);
        self.metrics.record_rtf(rtf);

        info!(
            %request_id,
            variant = %audio.variant,
            samples = audio.num_samples,
            duration_ms,
            elapsed_ms,
            rtf,
            "Audio generation completed successfully"
        );
        Ok(audio)
    }
}

/// Blocking part of a request: stage, generate, release, encode.
fn render(
    instance: &Arc<ModelInstance>,
    request: &ValidatedRequest,
    temp_dir: Option<&Path>,
    request_id: Uuid,
) -> TtsResult<EncodedAudio> {
    let staged = request
        .reference_audio
        .as_deref()
        .map(|bytes| StagedAudio::stage(bytes, temp_dir, request_id))
        .transpose()?;

    let options = GenerateOptions::new()
        .with_language(request.language_id.as_deref())
        .with_audio_prompt(staged.as_ref().map(StagedAudio::path));
    let generated = instance.generate(&request.text, &options);

    if let Some(staged) = staged {
        if let Err(err) = staged.release() {
            TtsMetrics.cleanup_failed();
            warn!(%request_id, error = %err, "Temporary reference audio was not removed");
        }
    }

    let audio = generated?;
    let bytes = encode_wav(&audio)?;

    Ok(EncodedAudio {
        bytes,
        content_type: WAV_CONTENT_TYPE,
        filename: request.filename(),
        variant: request.variant,
        sample_rate: audio.sample_rate,
        num_samples: audio.num_samples(),
    })
}
