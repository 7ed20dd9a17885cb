//! Deterministic tone synthesizer used when no pretrained engine is plugged in.
//!
//! Each word becomes a short voiced segment whose pitch follows the variant,
//! the language id and the word's characters, separated by short pauses.

use std::f32::consts::TAU;

use tracing::debug;

use audio_codec::{DEFAULT_FADE_MS, apply_fade_in, apply_fade_out, read_wav, rms};
use tts_core::{
    BoxError, Device, GenerateOptions, ModelProvider, ModelVariant, SpeechModel, SynthesisResult,
};

/// Output sample rate of the synthetic engine.
pub const SYNTHETIC_SAMPLE_RATE: u32 = 24000;

const MS_PER_CHAR: usize = 60;
const MIN_WORD_MS: usize = 80;
const MAX_WORD_MS: usize = 400;
const PAUSE_MS: usize = 40;
const DEFAULT_GAIN: f32 = 0.5;

/// Provider handing out [`SyntheticModel`] instances for every variant.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    hf_token: Option<String>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the model hub credential (unused by the synthetic engine).
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.hf_token = token;
        self
    }
}

impl ModelProvider for SyntheticProvider {
    fn load(
        &self,
        variant: ModelVariant,
        device: Device,
    ) -> Result<Box<dyn SpeechModel>, BoxError> {
        debug!(
            variant = %variant,
            device = %device,
            authenticated = self.hf_token.is_some(),
            "Constructing synthetic engine"
        );
        Ok(Box::new(SyntheticModel::new(variant)))
    }
}

/// Synthetic engine for one variant.
#[derive(Debug, Clone)]
pub struct SyntheticModel {
    variant: ModelVariant,
}

impl SyntheticModel {
    pub fn new(variant: ModelVariant) -> Self {
        Self { variant }
    }

    fn base_pitch(&self, language_id: Option<&str>) -> f32 {
        match self.variant {
            ModelVariant::Turbo => 180.0,
            ModelVariant::Original => 150.0,
            ModelVariant::Multilingual => {
                let offset = language_id
                    .map(|lang| lang.bytes().map(u32::from).sum::<u32>() % 60)
                    .unwrap_or(0);
                160.0 + offset as f32
            }
        }
    }
}

impl SpeechModel for SyntheticModel {
    fn sample_rate(&self) -> u32 {
        SYNTHETIC_SAMPLE_RATE
    }

    fn generate(
        &self,
        text: &str,
        options: &GenerateOptions<'_>,
    ) -> Result<SynthesisResult, BoxError> {
        let gain = match options.audio_prompt_path {
            Some(path) => {
                let reference = read_wav(path)
                    .map_err(|e| format!("unreadable reference audio {}: {e}", path.display()))?;
                (rms(&reference.samples) * 4.0).clamp(0.2, 0.9)
            }
            None => DEFAULT_GAIN,
        };

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Err("no speakable text".into());
        }

        let rate = SYNTHETIC_SAMPLE_RATE as usize;
        let base = self.base_pitch(options.language_id);
        let pause = vec![0.0f32; rate * PAUSE_MS / 1000];
        let mut samples = Vec::new();

        for (idx, word) in words.iter().enumerate() {
            let chars = word.chars().count();
            let word_ms = (chars * MS_PER_CHAR).clamp(MIN_WORD_MS, MAX_WORD_MS);
            let len = rate * word_ms / 1000;
            let pitch = base + word.chars().map(u32::from).sum::<u32>() as f32 % 80.0;

            let mut segment: Vec<f32> = (0..len)
                .map(|n| gain * (TAU * pitch * n as f32 / rate as f32).sin())
                .collect();
            apply_fade_in(&mut segment, DEFAULT_FADE_MS, SYNTHETIC_SAMPLE_RATE);
            apply_fade_out(&mut segment, DEFAULT_FADE_MS, SYNTHETIC_SAMPLE_RATE);

            if idx > 0 {
                samples.extend_from_slice(&pause);
            }
            samples.extend(segment);
        }

        Ok(SynthesisResult::new(samples, SYNTHETIC_SAMPLE_RATE))
    }
}
