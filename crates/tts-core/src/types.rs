//! Core data types shared across the service.

use serde::{Deserialize, Serialize};

use crate::error::{TtsError, ValidationError};

/// Language ids accepted by the multilingual variant.
pub const MULTILINGUAL_LANGUAGES: &[&str] = &[
    "ar", "da", "de", "el", "en", "es", "fi", "fr", "he", "hi", "it", "ja", "ko", "ms", "nl", "no",
    "pl", "pt", "ru", "sv", "sw", "tr", "zh",
];

/// Language used by the dedicated multilingual endpoint when none is given.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A synthesis engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Low-compute English model with paralinguistic tags.
    #[default]
    Turbo,
    /// Zero-shot model covering 23 languages.
    Multilingual,
    /// Original English model with CFG and exaggeration controls.
    Original,
}

/// Static capability record for a variant.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VariantInfo {
    pub size: &'static str,
    pub languages: &'static [&'static str],
    pub features: &'static [&'static str],
    pub best_for: &'static str,
}

impl ModelVariant {
    /// Every known variant, in slot order.
    pub const ALL: [ModelVariant; 3] = [Self::Turbo, Self::Multilingual, Self::Original];

    /// Wire tag of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Turbo => "turbo",
            Self::Multilingual => "multilingual",
            Self::Original => "original",
        }
    }

    /// Human-readable engine name used in log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Turbo => "Chatterbox-Turbo",
            Self::Multilingual => "Chatterbox-Multilingual",
            Self::Original => "Chatterbox (Original)",
        }
    }

    /// Position of the variant in [`ModelVariant::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::Turbo => 0,
            Self::Multilingual => 1,
            Self::Original => 2,
        }
    }

    /// Whether the variant accepts a language id.
    pub fn supports_language_id(&self) -> bool {
        matches!(self, Self::Multilingual)
    }

    /// Capability table entry for `GET /models`.
    pub fn info(&self) -> VariantInfo {
        match self {
            Self::Turbo => VariantInfo {
                size: "350M",
                languages: &["en"],
                features: &[
                    "Paralinguistic tags ([laugh], [cough], [chuckle])",
                    "Low compute",
                    "Fast generation",
                ],
                best_for: "Zero-shot voice agents, Production",
            },
            Self::Multilingual => VariantInfo {
                size: "500M",
                languages: MULTILINGUAL_LANGUAGES,
                features: &["Zero-shot cloning", "Multiple languages"],
                best_for: "Global applications, Localization",
            },
            Self::Original => VariantInfo {
                size: "500M",
                languages: &["en"],
                features: &["CFG tuning", "Exaggeration tuning"],
                best_for: "General zero-shot TTS with creative controls",
            },
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelVariant {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turbo" => Ok(Self::Turbo),
            "multilingual" => Ok(Self::Multilingual),
            "original" => Ok(Self::Original),
            other => Err(ValidationError::UnknownVariant(other.to_string())),
        }
    }
}

/// Compute backend a model instance executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// NVIDIA GPU.
    Cuda,
    /// Apple Silicon GPU (Metal Performance Shaders).
    Mps,
    /// CPU fallback.
    #[default]
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Mps => "mps",
            Self::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Device {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cuda" | "gpu" | "nvidia" => Ok(Self::Cuda),
            "mps" | "metal" | "apple" => Ok(Self::Mps),
            "cpu" => Ok(Self::Cpu),
            other => Err(TtsError::config(format!(
                "unknown device '{other}', expected one of: cuda, mps, cpu"
            ))),
        }
    }
}

/// A synthesis request as received from the transport layer.
///
/// `model_type` is the raw variant tag; the dispatcher parses it so that
/// path-based endpoints get the same `UnknownVariant` error kind.
#[derive(Debug, Clone, Default)]
pub struct SynthesisRequest {
    /// Text to synthesize.
    pub text: String,
    /// Requested variant tag.
    pub model_type: String,
    /// Language id (multilingual variant only).
    pub language_id: Option<String>,
    /// Reference audio for voice cloning.
    pub reference_audio: Option<Vec<u8>>,
}

impl SynthesisRequest {
    /// Create a request for the given variant tag.
    pub fn new(text: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model_type: model_type.into(),
            language_id: None,
            reference_audio: None,
        }
    }

    /// Set the language id.
    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = Some(language_id.into());
        self
    }

    /// Attach a reference voice recording.
    pub fn with_reference_audio(mut self, audio: Vec<u8>) -> Self {
        self.reference_audio = Some(audio);
        self
    }

    /// Text prefix used in log lines.
    pub fn text_preview(&self) -> &str {
        text_preview(&self.text)
    }
}

/// First 50 characters of `text`, cut on a char boundary.
pub fn text_preview(text: &str) -> &str {
    match text.char_indices().nth(50) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Raw audio returned by a speech model.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// PCM samples (f32, mono, nominally in [-1, 1]).
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl SynthesisResult {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples.
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 * 1000.0 / self.sample_rate as f32
    }
}

/// Wire-ready audio produced by the dispatcher.
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    /// Encoded container bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: &'static str,
    /// Suggested download filename.
    pub filename: String,
    /// Variant that produced the audio.
    pub variant: ModelVariant,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of samples encoded.
    pub num_samples: usize,
}

impl EncodedAudio {
    /// `Content-Disposition` header value for the response.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }

    /// Playback length in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples as f64 * 1000.0 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parse() {
        assert_eq!("turbo".parse::<ModelVariant>().unwrap(), ModelVariant::Turbo);
        assert_eq!(
            "multilingual".parse::<ModelVariant>().unwrap(),
            ModelVariant::Multilingual
        );
        assert_eq!(
            "original".parse::<ModelVariant>().unwrap(),
            ModelVariant::Original
        );
        assert!(matches!(
            "Turbo".parse::<ModelVariant>(),
            Err(ValidationError::UnknownVariant(tag)) if tag == "Turbo"
        ));
    }

    #[test]
    fn test_variant_serde_tags() {
        let json = serde_json::to_string(&ModelVariant::Multilingual).unwrap();
        assert_eq!(json, "\"multilingual\"");
        assert!(serde_json::from_str::<ModelVariant>("\"fast\"").is_err());
    }

    #[test]
    fn test_variant_index_matches_all() {
        for (idx, variant) in ModelVariant::ALL.iter().enumerate() {
            assert_eq!(variant.index(), idx);
        }
    }

    #[test]
    fn test_only_multilingual_takes_language() {
        assert!(ModelVariant::Multilingual.supports_language_id());
        assert!(!ModelVariant::Turbo.supports_language_id());
        assert!(!ModelVariant::Original.supports_language_id());
        assert_eq!(ModelVariant::Multilingual.info().languages.len(), 23);
    }

    #[test]
    fn test_device_parse() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda);
        assert_eq!("metal".parse::<Device>().unwrap(), Device::Mps);
        assert!("tpu".parse::<Device>().is_err());
        assert_eq!(Device::Mps.to_string(), "mps");
    }

    #[test]
    fn test_text_preview_is_char_safe() {
        let req = SynthesisRequest::new("안".repeat(80), "turbo");
        assert_eq!(req.text_preview().chars().count(), 50);

        let short = SynthesisRequest::new("Hi", "turbo");
        assert_eq!(short.text_preview(), "Hi");
    }

    #[test]
    fn test_synthesis_result_duration() {
        let result = SynthesisResult::new(vec![0.0; 24000], 24000);
        assert_eq!(result.num_samples(), 24000);
        assert!((result.duration_ms() - 1000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_encoded_audio_duration() {
        let audio = EncodedAudio {
            bytes: Vec::new(),
            content_type: "audio/wav",
            filename: "turbo_output.wav".to_string(),
            variant: ModelVariant::Turbo,
            sample_rate: 22050,
            num_samples: 11025,
        };
        assert!((audio.duration_ms() - 500.0).abs() < 1e-9);

        let empty = EncodedAudio {
            sample_rate: 0,
            ..audio
        };
        assert_eq!(empty.duration_ms(), 0.0);
    }
}
