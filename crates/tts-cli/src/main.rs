//! Chatterbox TTS command-line client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

mod commands;

use commands::client::ApiClient;
use commands::info::Endpoint;

/// Chatterbox TTS API client
#[derive(Debug, Parser)]
#[command(name = "tts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, env = "CHATTERBOX_URL", default_value = "http://localhost:8000", global = true)]
    url: String,

    /// Log level
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Log format (json or text)
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Json,
    Text,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show API name, version and endpoints
    Info,

    /// Query server health and loaded models
    Health,

    /// List available models and their capabilities
    Models,

    /// Synthesize text to a WAV file
    Synth {
        /// Input text (use @file.txt for file input)
        input: String,

        /// Output file path (WAV format)
        #[arg(short, long)]
        output: PathBuf,

        /// Model variant (turbo, multilingual or original)
        #[arg(short, long)]
        model: Option<String>,

        /// Language id for the multilingual model (e.g. ko, ja, zh)
        #[arg(long)]
        lang: Option<String>,

        /// Send a form to /tts/{model} instead of JSON to /tts
        #[arg(long)]
        form: bool,
    },

    /// Synthesize text in the voice of a reference recording
    Clone {
        /// Input text (use @file.txt for file input)
        input: String,

        /// Reference voice recording (WAV recommended)
        #[arg(short, long)]
        voice: PathBuf,

        /// Output file path (WAV format)
        #[arg(short, long)]
        output: PathBuf,

        /// Model variant (turbo, multilingual or original)
        #[arg(short, long)]
        model: Option<String>,

        /// Language id for the multilingual model
        #[arg(long)]
        lang: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = match cli.log_format {
        LogFormatArg::Json => runtime::logging::LogFormat::Json,
        LogFormatArg::Text => runtime::logging::LogFormat::Text,
    };
    runtime::logging::init_logging(&cli.log_level, format);

    debug!(url = %cli.url, "Using TTS server");
    let client = ApiClient::new(&cli.url);

    match cli.command {
        Commands::Info => commands::info::run(&client, Endpoint::Root)
            .await
            .context("info request failed")?,
        Commands::Health => commands::info::run(&client, Endpoint::Health)
            .await
            .context("health check failed")?,
        Commands::Models => commands::info::run(&client, Endpoint::Models)
            .await
            .context("model listing failed")?,
        Commands::Synth {
            input,
            output,
            model,
            lang,
            form,
        } => {
            let options = commands::synth::SynthOptions {
                text: input,
                output,
                model,
                lang,
                form,
            };
            commands::synth::run(&client, options)
                .await
                .context("synthesis failed")?;
        }
        Commands::Clone {
            input,
            voice,
            output,
            model,
            lang,
        } => {
            let options = commands::synth::CloneOptions {
                text: input,
                voice,
                output,
                model,
                lang,
            };
            commands::synth::run_clone(&client, options)
                .await
                .context("voice cloning failed")?;
        }
    }

    Ok(())
}
