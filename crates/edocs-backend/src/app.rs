//! Application context and message dispatching utilities.
//!
//! The context contains the shared state and provides helpers for sending
//! responses and alerts back to the frontend bridge.

use std::sync::Arc;

use edocs_bridge::{
    MessageFromBackend, MessageToBackend,
    alert::{AlertLevel, AlertMessage},
};
use tokio::sync::mpsc::{Receiver, Sender};

use crate::services;
use crate::state::SharedState;

/// Shared application context passed to services and message handlers.
pub(crate) struct AppContext {
    /// Mutable runtime application state shared across services.
    pub state: SharedState,
    /// Outbound channel to the frontend bridge.
    pub tx: Sender<MessageFromBackend>,
}

impl AppContext {
    /// Read and dispatch messages from the frontend bridge until it closes,
    /// then end the active session.
    pub async fn consume_bridge_messages(self: &Arc<Self>, mut rx: Receiver<MessageToBackend>) {
        while let Some(message) = rx.recv().await {
            log::debug!("Got a frontend message: {message:?}");
            self.dispatch_message(message).await;
        }

        log::info!("Frontend bridge closed");
        services::session_service::handle_end_session(self.clone()).await;
    }

    /// Dispatches the received message from frontend down to individual
    /// service handlers. Commands are handled one at a time, in order.
    async fn dispatch_message(self: &Arc<Self>, message: MessageToBackend) {
        match message {
            MessageToBackend::ConfigurationRequest => {
                services::config_service::handle_config_request(self.clone()).await;
            }
            MessageToBackend::UpdateConfiguration(config) => {
                services::config_service::handle_config_update(self.clone(), config).await;
            }
            MessageToBackend::StartSession(credentials) => {
                services::session_service::handle_start_session(self.clone(), credentials).await;
            }
            MessageToBackend::EndSession => {
                services::session_service::handle_end_session(self.clone()).await;
            }
            MessageToBackend::RefreshUnread => {
                services::unread_service::handle_refresh_request(self.clone()).await;
            }
            MessageToBackend::LoadNotifications => {
                services::unread_service::handle_load_notifications_request(self.clone()).await;
            }
            MessageToBackend::MarkNotificationRead(document_id) => {
                services::unread_service::handle_mark_read(self.clone(), document_id).await;
            }
            MessageToBackend::AcknowledgeDocument(document_id) => {
                services::unread_service::handle_acknowledge(self.clone(), document_id).await;
            }
        }
    }

    /// Send a message to the frontend bridge. Messages are dropped once the
    /// frontend is gone.
    pub async fn send(&self, message: MessageFromBackend) {
        if let Err(e) = self.tx.send(message).await {
            log::debug!("Frontend is gone, dropping {:?}", e.0);
        }
    }

    /// Send an alert to the frontend bridge.
    pub async fn send_alert(&self, level: AlertLevel, content: impl Into<String>) {
        self.send(MessageFromBackend::Alert(AlertMessage {
            level,
            message: content.into(),
        }))
        .await;
    }
}
