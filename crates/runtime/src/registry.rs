//! Lazy, per-variant model instances.
//!
//! The registry preallocates one empty slot per [`ModelVariant`] and fills a
//! slot the first time the variant is requested. Slots are never emptied for
//! the lifetime of the process. Each slot is its own `OnceCell`, so concurrent
//! first requests for one variant share a single construction while loads of
//! different variants proceed independently.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{error, info};

use tts_core::{
    Device, GenerateOptions, ModelProvider, ModelVariant, SpeechModel, SynthesisResult, TtsError,
    TtsResult,
};

use crate::metrics::TtsMetrics;

/// A constructed engine bound to one variant and one device.
pub struct ModelInstance {
    variant: ModelVariant,
    device: Device,
    model: Box<dyn SpeechModel>,
    /// Serializes calls into engines that are not reentrant.
    gate: Option<Mutex<()>>,
}

impl ModelInstance {
    pub fn new(variant: ModelVariant, device: Device, model: Box<dyn SpeechModel>) -> Self {
        let gate = (!model.is_reentrant()).then(|| Mutex::new(()));
        Self {
            variant,
            device,
            model,
            gate,
        }
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Output sample rate of the engine.
    pub fn sample_rate(&self) -> u32 {
        self.model.sample_rate()
    }

    /// Run a blocking generation call on the engine.
    pub fn generate(
        &self,
        text: &str,
        options: &GenerateOptions<'_>,
    ) -> TtsResult<SynthesisResult> {
        let _serialized = self.gate.as_ref().map(|gate| gate.lock());
        self.model
            .generate(text, options)
            .map_err(|source| TtsError::synthesis(self.variant, source))
    }
}

impl fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInstance")
            .field("variant", &self.variant)
            .field("device", &self.device)
            .field("serialized", &self.gate.is_some())
            .finish()
    }
}

struct Slots {
    device: Device,
    provider: Arc<dyn ModelProvider>,
    cells: [OnceCell<Arc<ModelInstance>>; ModelVariant::ALL.len()],
    metrics: TtsMetrics,
}

impl Slots {
    fn loaded_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.initialized()).count()
    }

    async fn load(&self, variant: ModelVariant) -> TtsResult<Arc<ModelInstance>> {
        info!(
            variant = %variant,
            device = %self.device,
            "Loading {} model on {}...",
            variant.display_name(),
            self.device
        );

        let start = Instant::now();
        let provider = Arc::clone(&self.provider);
        let device = self.device;
        let loaded = tokio::task::spawn_blocking(move || provider.load(variant, device))
            .await
            .map_err(|e| TtsError::internal(format!("model load task failed: {e}")))?;

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match loaded {
            Ok(model) => {
                self.metrics.record_model_load(variant, elapsed_ms);
                info!(
                    variant = %variant,
                    elapsed_ms,
                    "{} model loaded successfully",
                    variant.display_name()
                );
                Ok(Arc::new(ModelInstance::new(variant, device, model)))
            }
            Err(source) => {
                let err = TtsError::model_load(variant, source);
                error!(variant = %variant, elapsed_ms, "{err}");
                Err(err)
            }
        }
    }
}

/// Owns at most one [`ModelInstance`] per variant.
#[derive(Clone)]
pub struct ModelRegistry {
    slots: Arc<Slots>,
}

impl ModelRegistry {
    /// Create a registry whose instances are bound to `device`.
    pub fn new(device: Device, provider: Arc<dyn ModelProvider>) -> Self {
        Self::with_metrics(device, provider, TtsMetrics::default())
    }

    /// Create a registry reporting to the given metrics recorder.
    pub fn with_metrics(
        device: Device,
        provider: Arc<dyn ModelProvider>,
        metrics: TtsMetrics,
    ) -> Self {
        Self {
            slots: Arc::new(Slots {
                device,
                provider,
                cells: std::array::from_fn(|_| OnceCell::new()),
                metrics,
            }),
        }
    }

    /// Device every instance is bound to.
    pub fn device(&self) -> Device {
        self.slots.device
    }

    /// Return the instance for `variant`, constructing it on first use.
    ///
    /// The load runs on a spawned task, so a caller that goes away mid-load
    /// does not abort it and waiting callers still receive the instance.
    /// A failed load leaves the slot empty for a later retry.
    pub async fn get_or_load(&self, variant: ModelVariant) -> TtsResult<Arc<ModelInstance>> {
        if let Some(instance) = self.slots.cells[variant.index()].get() {
            return Ok(Arc::clone(instance));
        }

        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            let instance = slots.cells[variant.index()]
                .get_or_try_init(|| slots.load(variant))
                .await
                .map(Arc::clone)?;
            slots.metrics.set_loaded_models(slots.loaded_count());
            Ok::<_, TtsError>(instance)
        })
        .await
        .map_err(|e| TtsError::internal(format!("model load task failed: {e}")))?
    }

    /// Turbo instance.
    pub async fn turbo(&self) -> TtsResult<Arc<ModelInstance>> {
        self.get_or_load(ModelVariant::Turbo).await
    }

    /// Multilingual instance.
    pub async fn multilingual(&self) -> TtsResult<Arc<ModelInstance>> {
        self.get_or_load(ModelVariant::Multilingual).await
    }

    /// Original instance.
    pub async fn original(&self) -> TtsResult<Arc<ModelInstance>> {
        self.get_or_load(ModelVariant::Original).await
    }

    /// Whether the variant has been constructed.
    pub fn is_loaded(&self, variant: ModelVariant) -> bool {
        self.slots.cells[variant.index()].initialized()
    }

    /// Variants currently loaded, in declaration order.
    pub fn loaded_variants(&self) -> Vec<ModelVariant> {
        ModelVariant::ALL
            .into_iter()
            .filter(|variant| self.is_loaded(*variant))
            .collect()
    }

    /// Load each variant in `variants`, stopping at the first failure.
    pub async fn preload(&self, variants: &[ModelVariant]) -> TtsResult<()> {
        for &variant in variants {
            self.get_or_load(variant).await?;
        }
        if !variants.is_empty() {
            info!(loaded = ?self.loaded_variants(), "Preload complete");
        }
        Ok(())
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("device", &self.slots.device)
            .field("loaded", &self.loaded_variants())
            .finish()
    }
}
