//! Router assembly, CORS policy and the serve loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tokio::sync::watch;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use runtime::Dispatcher;
use tts_core::{ApiConfig, CorsConfig, TtsError, TtsResult};

use crate::service;

/// Shared handler state.
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub config: ApiConfig,
    pub metrics: Option<PrometheusHandle>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        dispatcher: Dispatcher,
        config: ApiConfig,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            dispatcher,
            config,
            metrics,
            start_time: Instant::now(),
        }
    }
}

/// Build the full HTTP surface.
pub fn build_router(state: Arc<AppState>) -> TtsResult<Router> {
    let cors = cors_layer(&state.config.cors)?;
    let body_limit = state.config.server.max_upload_bytes;

    Ok(Router::new()
        .route("/", get(service::root_handler))
        .route("/health", get(service::health_handler))
        .route("/models", get(service::models_handler))
        .route("/metrics", get(service::metrics_handler))
        .route("/tts", post(service::tts_handler))
        .route("/tts/with-voice", post(service::tts_with_voice_handler))
        .route("/tts/{variant}", post(service::tts_variant_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v.trim() == "*")
}

/// Translate the configured allow-lists into a CORS layer.
///
/// Wildcards combined with credentials mirror the request instead of
/// answering `*`, which browsers refuse for credentialed requests.
pub fn cors_layer(config: &CorsConfig) -> TtsResult<CorsLayer> {
    let credentials = config.allow_credentials;

    let origins = if is_wildcard(&config.allow_origins) {
        if credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::from(Any)
        }
    } else {
        let list = config
            .allow_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o.trim())
                    .map_err(|e| TtsError::config(format!("invalid CORS origin '{o}': {e}")))
            })
            .collect::<TtsResult<Vec<_>>>()?;
        AllowOrigin::list(list)
    };

    let methods = if is_wildcard(&config.allow_methods) {
        if credentials {
            AllowMethods::mirror_request()
        } else {
            AllowMethods::from(Any)
        }
    } else {
        let list = config
            .allow_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_uppercase().as_bytes())
                    .map_err(|e| TtsError::config(format!("invalid CORS method '{m}': {e}")))
            })
            .collect::<TtsResult<Vec<_>>>()?;
        AllowMethods::list(list)
    };

    let headers = if is_wildcard(&config.allow_headers) {
        if credentials {
            AllowHeaders::mirror_request()
        } else {
            AllowHeaders::from(Any)
        }
    } else {
        let list = config
            .allow_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.trim().as_bytes())
                    .map_err(|e| TtsError::config(format!("invalid CORS header '{h}': {e}")))
            })
            .collect::<TtsResult<Vec<_>>>()?;
        AllowHeaders::list(list)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(credentials))
}

/// The HTTP server.
pub struct TtsServer {
    state: Arc<AppState>,
}

impl TtsServer {
    pub fn new(
        dispatcher: Dispatcher,
        config: ApiConfig,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            state: Arc::new(AppState::new(dispatcher, config, metrics)),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Serve until SIGINT/SIGTERM, then drain within the shutdown timeout.
    pub async fn run(self) -> TtsResult<()> {
        let addrs = self.state.config.server.bind_addrs()?;
        let timeout = Duration::from_secs(self.state.config.server.shutdown_timeout_secs);
        let app = build_router(self.state())?;

        let listener = tokio::net::TcpListener::bind(addrs.as_slice()).await?;
        info!(
            addr = %listener.local_addr()?,
            device = %self.state.dispatcher.registry().device(),
            "TTS server started"
        );

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut http_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.changed().await.ok();
                })
                .await
        });

        tokio::select! {
            _ = shutdown_signal() => {}
            joined = &mut http_handle => {
                return match joined {
                    Ok(result) => result.map_err(TtsError::from),
                    Err(e) => Err(TtsError::internal(format!("server task failed: {e}"))),
                };
            }
        }

        info!("Shutdown signal received, stopping server...");
        let _ = shutdown_tx.send(true);

        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                warn!("Shutdown timeout, forcing exit");
            }
            _ = http_handle => {
                info!("Server stopped gracefully");
            }
        }

        Ok(())
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
