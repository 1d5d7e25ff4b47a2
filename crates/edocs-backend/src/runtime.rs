//! Backend runtime setup and orchestration.
//!
//! This module wires together configuration, shared state, and the message
//! dispatch loop that listens to frontend bridge requests.

use std::{
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
};

use edocs_bridge::{MessageFromBackend, MessageToBackend, config::Config};
use tokio::sync::{
    RwLock,
    mpsc::{Receiver, Sender},
};

use crate::app::AppContext;
use crate::state::State;

/// Start-up options that take precedence over the stored configuration.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Configuration file to use instead of the one in the user's config
    /// directory.
    pub config_path: Option<PathBuf>,
    /// Server base URL for this run. Only written to disk as part of a later
    /// configuration update.
    pub server_url: Option<String>,
}

async fn resolve_config(options: &BackendOptions) -> (Config, Option<PathBuf>) {
    let config_path = match &options.config_path {
        Some(path) => Some(path.clone()),
        None => crate::config::config_file_path()
            .inspect_err(|e| log::error!("No configuration location: {e}"))
            .ok(),
    };

    let loaded = match &config_path {
        Some(path) => crate::config::load_config_from(path).await,
        None => Ok(Config::default()),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        log::error!("Failed to load configuration, using defaults: {e}");
        Config::default()
    });
    if let Some(server_url) = &options.server_url {
        log::info!("Using server {server_url} for this run");
        config.server.base_url = server_url.clone();
    }
    (config, config_path)
}

/// Initialize backend state and start processing frontend messages.
async fn setup_backend(
    rx: Receiver<MessageToBackend>,
    tx: Sender<MessageFromBackend>,
    options: BackendOptions,
) {
    let (config, config_path) = resolve_config(&options).await;
    let state = Arc::new(RwLock::new(State::new(config, config_path)));

    let context = Arc::new(AppContext { state, tx });
    context.consume_bridge_messages(rx).await;
}

/// Spawn the backend runtime on its own thread and begin processing bridge
/// messages. The thread finishes once the frontend drops its sender and the
/// active session has been torn down.
pub fn run(
    rx: Receiver<MessageToBackend>,
    tx: Sender<MessageFromBackend>,
    options: BackendOptions,
) -> std::io::Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("edocs-backend")
        .build()?;

    thread::Builder::new()
        .name("edocs-backend".to_string())
        .spawn(move || runtime.block_on(setup_backend(rx, tx, options)))
}
