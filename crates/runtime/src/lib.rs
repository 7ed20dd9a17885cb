//! # runtime
//!
//! Model lifecycle and request dispatch for the Chatterbox TTS API.
//!
//! This crate provides:
//! - Compute device selection (CUDA, then MPS, then CPU)
//! - A lazy per-variant model registry
//! - Request validation and dispatch with scoped reference-audio staging
//! - Structured logging and Prometheus metrics
//! - A deterministic synthetic engine for running without pretrained weights

pub mod device;
pub mod dispatcher;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod staging;
pub mod synthetic;

pub use device::{DeviceProbe, SystemProbe, device_name, select_device, select_device_with};
pub use dispatcher::{Dispatcher, ValidatedRequest};
pub use logging::{LogFormat, init_from_config, init_logging};
pub use metrics::{ActiveRequest, TtsMetrics};
pub use registry::{ModelInstance, ModelRegistry};
pub use staging::StagedAudio;
pub use synthetic::{SYNTHETIC_SAMPLE_RATE, SyntheticModel, SyntheticProvider};
