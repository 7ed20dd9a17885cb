//! In-process API server for client tests.

use std::path::PathBuf;
use std::sync::Arc;

use runtime::{Dispatcher, ModelRegistry, SyntheticProvider};
use tts_core::{ApiConfig, Device};
use tts_server::{AppState, build_router};

pub struct TestServer {
    pub url: String,
    _handle: tokio::task::JoinHandle<()>,
}

/// Serve the synthetic engine on an ephemeral port.
pub async fn spawn(temp_dir: Option<PathBuf>) -> TestServer {
    let mut config = ApiConfig::default();
    config.models.temp_dir = temp_dir;

    let registry = ModelRegistry::new(Device::Cpu, Arc::new(SyntheticProvider::new()));
    let dispatcher = Dispatcher::new(registry, config.dispatch());
    let router = build_router(Arc::new(AppState::new(dispatcher, config, None))).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        url: format!("http://{addr}"),
        _handle: handle,
    }
}
