use edocs_bridge::{alert::AlertLevel, config::Config};

/// Handles an incoming configuration request (see
/// [`edocs_bridge::MessageToBackend::ConfigurationRequest`]).
pub async fn handle_config_request(context: super::AppContextHandle) {
    let config = {
        let state = context.state.read().await;
        state.config.clone()
    };
    context
        .send(edocs_bridge::MessageFromBackend::ConfigurationResponse(
            config,
        ))
        .await;
}

/// Persists a new configuration and makes it current. A running session
/// keeps the settings it was started with.
pub async fn handle_config_update(context: super::AppContextHandle, config: Config) {
    let config_path = context.state.read().await.config_path.clone();
    match config_path {
        Some(path) => {
            if let Err(e) = crate::config::save_config_to(&config, &path).await {
                log::error!("Failed to save configuration: {e}");
                context
                    .send_alert(AlertLevel::Error, format!("Could not save settings: {e}"))
                    .await;
                return;
            }
        }
        None => log::warn!("Configuration update applies to this run only"),
    }

    {
        let mut state = context.state.write().await;
        if state.config.server != config.server {
            state.request_client = crate::state::build_request_client(&config.server);
        }
        state.config = config.clone();
    }

    context
        .send(edocs_bridge::MessageFromBackend::ConfigurationResponse(
            config,
        ))
        .await;
}
