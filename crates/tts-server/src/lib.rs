//! # tts-server
//!
//! HTTP server for the Chatterbox TTS API.
//!
//! Provides:
//! - JSON, form and multipart synthesis endpoints
//! - Health and model catalogue endpoints
//! - Prometheus metrics endpoint

pub mod server;
pub mod service;

pub use server::{AppState, TtsServer, build_router, cors_layer};
pub use service::ApiError;
