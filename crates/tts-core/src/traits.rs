//! Seams to the pretrained speech engines.

use std::path::Path;

use crate::error::BoxError;
use crate::types::{Device, ModelVariant, SynthesisResult};

/// Per-call generation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions<'a> {
    /// Language id (multilingual engines only).
    pub language_id: Option<&'a str>,
    /// Path to a reference voice recording for cloning.
    pub audio_prompt_path: Option<&'a Path>,
}

impl<'a> GenerateOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language id.
    pub fn with_language(mut self, language_id: Option<&'a str>) -> Self {
        self.language_id = language_id;
        self
    }

    /// Set the reference audio path.
    pub fn with_audio_prompt(mut self, path: Option<&'a Path>) -> Self {
        self.audio_prompt_path = path;
        self
    }
}

/// A loaded, device-bound speech engine.
///
/// `generate` is a blocking, potentially long-running call. The registry
/// shares one engine across requests, so implementations must be `Sync`.
/// Engines that cannot serve overlapping calls return `false` from
/// [`SpeechModel::is_reentrant`] and the runtime serializes access.
pub trait SpeechModel: Send + Sync {
    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Generate audio for `text`.
    fn generate(
        &self,
        text: &str,
        options: &GenerateOptions<'_>,
    ) -> Result<SynthesisResult, BoxError>;

    /// Whether overlapping `generate` calls are safe.
    fn is_reentrant(&self) -> bool {
        true
    }
}

/// Constructs speech engines for a variant on a device.
pub trait ModelProvider: Send + Sync {
    /// Load the engine for `variant`. Called at most once per variant by a
    /// successful registry load; failures may be retried later.
    fn load(&self, variant: ModelVariant, device: Device) -> Result<Box<dyn SpeechModel>, BoxError>;
}
