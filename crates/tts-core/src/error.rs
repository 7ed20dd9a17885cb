//! Unified error types for the TTS service.

use std::path::PathBuf;

use crate::types::ModelVariant;

/// Boxed error raised by external engines and providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Caller-fixable request problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Text is empty or whitespace only.
    #[error("Text must not be empty.")]
    EmptyText,

    /// Text exceeds the configured maximum.
    #[error("Text too long ({len} characters). Maximum length is {max} characters.")]
    TextTooLong { len: usize, max: usize },

    /// Variant tag is not one of the known variants.
    #[error("Invalid model_type '{0}'. Expected one of: turbo, multilingual, original.")]
    UnknownVariant(String),

    /// Language id not accepted by the selected variant.
    #[error("language_id '{language}' is not supported by the {variant} model.")]
    UnsupportedLanguage {
        variant: ModelVariant,
        language: String,
    },
}

/// Main error type for TTS operations.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// Request rejected before reaching a model.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Constructing a model instance failed.
    #[error("failed to load {variant} model: {source}")]
    ModelLoad {
        variant: ModelVariant,
        #[source]
        source: BoxError,
    },

    /// The engine failed while generating audio.
    #[error("{variant} synthesis failed: {source}")]
    Synthesis {
        variant: ModelVariant,
        #[source]
        source: BoxError,
    },

    /// Encoding generated samples failed.
    #[error("audio encode error: {0}")]
    Encode(String),

    /// Removing a temporary resource failed.
    #[error("failed to remove temporary file {path}: {source}")]
    ResourceCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results with TtsError.
pub type TtsResult<T> = Result<T, TtsError>;

impl TtsError {
    /// Create a model load error.
    pub fn model_load(variant: ModelVariant, source: impl Into<BoxError>) -> Self {
        Self::ModelLoad {
            variant,
            source: source.into(),
        }
    }

    /// Create a synthesis error.
    pub fn synthesis(variant: ModelVariant, source: impl Into<BoxError>) -> Self {
        Self::Synthesis {
            variant,
            source: source.into(),
        }
    }

    /// Create an encode error with message.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a config error with message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error with message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller can fix the request (maps to 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ModelLoad { .. } => "model_load",
            Self::Synthesis { .. } => "synthesis",
            Self::Encode(_) => "encode",
            Self::ResourceCleanup { .. } => "resource_cleanup",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Internal(_) => "internal",
        }
    }
}
