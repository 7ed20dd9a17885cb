//! Configuration structures for the TTS service.

use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use crate::error::{TtsError, TtsResult};
use crate::types::{Device, ModelVariant};

/// Complete service configuration, built once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Metadata reported by `GET /`.
    #[serde(default)]
    pub metadata: ApiMetadata,

    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Model lifecycle settings.
    #[serde(default)]
    pub models: ModelsConfig,

    /// CORS allow-lists.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ApiConfig {
    /// Settings consumed by the request dispatcher.
    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            max_text_length: self.models.max_text_length,
            temp_dir: self.models.temp_dir.clone(),
        }
    }
}

/// API metadata strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMetadata {
    #[serde(default = "default_api_title")]
    pub title: String,
    #[serde(default = "default_api_version")]
    pub version: String,
    #[serde(default = "default_api_description")]
    pub description: String,
}

fn default_api_title() -> String {
    "Chatterbox TTS API".to_string()
}

fn default_api_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_api_description() -> String {
    "REST API for Chatterbox Text-to-Speech models".to_string()
}

impl Default for ApiMetadata {
    fn default() -> Self {
        Self {
            title: default_api_title(),
            version: default_api_version(),
            description: default_api_description(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address.
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Server port.
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Request body size limit in bytes (reference audio uploads).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10 MB
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

impl ServerConfig {
    /// Resolve `host` and `port` into the addresses to listen on.
    ///
    /// Accepts IP literals (`0.0.0.0`, `::`, `[::1]`) and resolvable host names
    /// such as `localhost`.
    pub fn bind_addrs(&self) -> TtsResult<Vec<SocketAddr>> {
        let host = self.host.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let invalid =
            |reason: String| TtsError::config(format!("invalid host {:?}: {reason}", self.host));

        let addrs: Vec<SocketAddr> = (host, self.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .collect();
        if addrs.is_empty() {
            return Err(invalid("no addresses resolved".to_string()));
        }
        Ok(addrs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_upload_bytes: default_max_upload_bytes(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Model lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Variant used when a request omits `model_type`.
    #[serde(default)]
    pub default_variant: ModelVariant,
    /// Variants loaded at startup.
    #[serde(default)]
    pub preload: Vec<ModelVariant>,
    /// Maximum text length in characters.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Explicit compute device (auto-detected when unset).
    #[serde(default)]
    pub device: Option<Device>,
    /// Credential token handed to the model provider.
    #[serde(default)]
    pub hf_token: Option<String>,
    /// Directory for staged reference audio (OS temp dir when unset).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_max_text_length() -> usize {
    5000
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default_variant: ModelVariant::default(),
            preload: Vec::new(),
            max_text_length: default_max_text_length(),
            device: None,
            hf_token: None,
            temp_dir: None,
        }
    }
}

/// CORS configuration. `"*"` entries mean "any".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_wildcard")]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_allow_credentials")]
    pub allow_credentials: bool,
    #[serde(default = "default_wildcard")]
    pub allow_methods: Vec<String>,
    #[serde(default = "default_wildcard")]
    pub allow_headers: Vec<String>,
}

fn default_wildcard() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_allow_credentials() -> bool {
    true
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: default_wildcard(),
            allow_credentials: default_allow_credentials(),
            allow_methods: default_wildcard(),
            allow_headers: default_wildcard(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json or text).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Settings the request dispatcher needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum text length in characters.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Directory for staged reference audio.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_text_length: default_max_text_length(),
            temp_dir: None,
        }
    }
}
