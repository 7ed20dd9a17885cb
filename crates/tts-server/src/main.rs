//! Chatterbox TTS HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use runtime::{Dispatcher, ModelRegistry, SyntheticProvider, TtsMetrics};
use tts_core::{
    ApiConfig, ApiMetadata, CorsConfig, Device, LoggingConfig, ModelVariant, ModelsConfig,
    ServerConfig,
};
use tts_server::TtsServer;

/// Chatterbox TTS HTTP server
#[derive(Debug, Parser)]
#[command(name = "tts-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Title reported by `GET /`
    #[arg(long, env = "CHATTERBOX_API_TITLE", default_value = "Chatterbox TTS API")]
    api_title: String,

    /// Version reported by `GET /` and `/health`
    #[arg(long, env = "CHATTERBOX_API_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    api_version: String,

    /// Description reported by `GET /`
    #[arg(
        long,
        env = "CHATTERBOX_API_DESCRIPTION",
        default_value = "REST API for Chatterbox Text-to-Speech models"
    )]
    api_description: String,

    /// Bind host
    #[arg(long, env = "CHATTERBOX_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Bind port
    #[arg(short, long, env = "CHATTERBOX_PORT", default_value_t = 8000)]
    port: u16,

    /// Variant used by `POST /tts` when the body names none
    #[arg(long, env = "CHATTERBOX_DEFAULT_MODEL", default_value = "turbo")]
    default_model: ModelVariant,

    /// Variants to load before accepting requests (comma separated)
    #[arg(long, env = "CHATTERBOX_PRELOAD_MODELS", value_delimiter = ',')]
    preload_models: Vec<ModelVariant>,

    /// Allowed CORS origins (comma separated, `*` for any)
    #[arg(long, env = "CHATTERBOX_ALLOW_ORIGINS", value_delimiter = ',', default_value = "*")]
    allow_origins: Vec<String>,

    /// Allowed CORS methods (comma separated, `*` for any)
    #[arg(long, env = "CHATTERBOX_ALLOW_METHODS", value_delimiter = ',', default_value = "*")]
    allow_methods: Vec<String>,

    /// Allowed CORS headers (comma separated, `*` for any)
    #[arg(long, env = "CHATTERBOX_ALLOW_HEADERS", value_delimiter = ',', default_value = "*")]
    allow_headers: Vec<String>,

    /// Allow credentialed CORS requests
    #[arg(
        long,
        env = "CHATTERBOX_ALLOW_CREDENTIALS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    allow_credentials: bool,

    /// Maximum text length in characters
    #[arg(long, env = "CHATTERBOX_MAX_TEXT_LENGTH", default_value_t = 5000)]
    max_text_length: usize,

    /// Maximum request body size in bytes
    #[arg(long, env = "CHATTERBOX_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Compute device (cuda, mps or cpu); auto-detected when unset
    #[arg(long, env = "CHATTERBOX_DEVICE")]
    device: Option<Device>,

    /// Model hub token handed to the model provider
    #[arg(long, env = "CHATTERBOX_HF_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Directory for staged reference audio
    #[arg(long, env = "CHATTERBOX_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, env = "CHATTERBOX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (text or json)
    #[arg(long, env = "CHATTERBOX_LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// Graceful shutdown timeout in seconds
    #[arg(long, env = "CHATTERBOX_SHUTDOWN_TIMEOUT_SECS", default_value_t = 30)]
    shutdown_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> ApiConfig {
        ApiConfig {
            metadata: ApiMetadata {
                title: self.api_title,
                version: self.api_version,
                description: self.api_description,
            },
            server: ServerConfig {
                host: self.host,
                port: self.port,
                max_upload_bytes: self.max_upload_bytes,
                shutdown_timeout_secs: self.shutdown_timeout_secs,
            },
            models: ModelsConfig {
                default_variant: self.default_model,
                preload: self.preload_models,
                max_text_length: self.max_text_length,
                device: self.device,
                hf_token: self.hf_token,
                temp_dir: self.temp_dir,
            },
            cors: CorsConfig {
                allow_origins: self.allow_origins,
                allow_credentials: self.allow_credentials,
                allow_methods: self.allow_methods,
                allow_headers: self.allow_headers,
            },
            logging: LoggingConfig {
                level: self.log_level,
                format: self.log_format,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` has to be applied before clap reads the environment.
    let dotenv = dotenvy::dotenv();

    let config = Args::parse().into_config();
    runtime::logging::init_from_config(&config.logging).context("Invalid logging configuration")?;

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "Failed to read .env file");
        }
    }

    info!(
        version = %config.metadata.version,
        host = %config.server.host,
        port = config.server.port,
        "Starting Chatterbox TTS server"
    );

    let (metrics, handle) = TtsMetrics::install().context("Failed to install metrics recorder")?;

    let device = runtime::select_device(config.models.device);
    info!(device = %device, "Models will run on {}", runtime::device_name(device));
    let provider = SyntheticProvider::new().with_token(config.models.hf_token.clone());
    let registry = ModelRegistry::with_metrics(device, Arc::new(provider), metrics);

    if !config.models.preload.is_empty() {
        info!(variants = ?config.models.preload, "Preloading models");
        registry
            .preload(&config.models.preload)
            .await
            .context("Failed to preload models")?;
    }

    let dispatcher = Dispatcher::new(registry, config.dispatch());
    let server = TtsServer::new(dispatcher, config, Some(handle));

    server.run().await.context("Server failed")?;

    info!("Server shutdown complete");
    Ok(())
}
