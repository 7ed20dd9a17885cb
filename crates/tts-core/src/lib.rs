//! # tts-core
//!
//! Core types, traits, and error definitions for the Chatterbox TTS API.
//!
//! This crate provides the foundational abstractions shared by the runtime and
//! the HTTP server:
//!
//! - The closed set of model variants and compute devices
//! - Synthesis request/result types
//! - The `SpeechModel` / `ModelProvider` seams to pretrained engines
//! - Unified error handling via `TtsError`
//! - Configuration structures

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    ApiConfig, ApiMetadata, CorsConfig, DispatchConfig, LoggingConfig, ModelsConfig, ServerConfig,
};
pub use error::{BoxError, TtsError, TtsResult, ValidationError};
pub use traits::{GenerateOptions, ModelProvider, SpeechModel};
pub use types::{
    DEFAULT_LANGUAGE, Device, EncodedAudio, MULTILINGUAL_LANGUAGES, ModelVariant, SynthesisRequest,
    SynthesisResult, VariantInfo, text_preview,
};
