//! Structured logging setup with tracing.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tts_core::{LoggingConfig, TtsError};

/// Logging format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// JSON lines for log shippers.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(TtsError::config(format!("unknown log format: {s}"))),
        }
    }
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is harmless;
/// the second subscriber is ignored.
pub fn init_logging(level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Text => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(true));

            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(false),
            );

            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    }
}

/// Initialize logging from the `logging` section of the API config.
pub fn init_from_config(config: &LoggingConfig) -> Result<LogFormat, TtsError> {
    let format: LogFormat = config.format.parse()?;
    init_logging(&config.level, format);
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(matches!("xml".parse::<LogFormat>(), Err(TtsError::Config(_))));
    }

    #[test]
    fn test_log_format_default() {
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }

    #[test]
    fn test_init_from_config_rejects_bad_format() {
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "yaml".to_string(),
        };
        assert!(init_from_config(&config).is_err());
    }
}
