//! Communication bridge between frontend and backend.
//!
//! This crate defines the types and protocols used to connect a frontend
//! with the asynchronous backend responsible for the push channel, unread
//! counters and reconciliation against the document server.
//!
//! The design is deliberately lightweight and unidirectional:
//! - The frontend sends commands (e.g., start a session, refresh unread
//!   counters, mark a notification as read).
//! - The backend pushes events (e.g., new unread snapshots, connection state
//!   changes, alerts).
//!
//! Communication happens over bounded [`tokio::sync::mpsc`] channels wrapped
//! in [`BridgeChannels`].

pub mod alert;
pub mod config;
pub mod connection;
pub mod notification;
pub mod session;

use tokio::sync::mpsc::{self, Receiver, Sender};

/// Messages emitted by the backend to inform the frontend of state updates.
#[derive(Debug, Clone)]
pub enum MessageFromBackend {
    /// User-visible alert (e.g. a failed acknowledgement).
    Alert(alert::AlertMessage),
    /// Response to the configuration request from the frontend.
    ConfigurationResponse(config::Config),
    /// The push channel moved to a new state.
    ConnectionStateChanged(connection::ConnectionState),
    /// Counters or notification list changed. Always a full copy.
    UnreadStateChanged(notification::UnreadSnapshot),
    /// A session was established for the given user.
    SessionStarted { user_id: session::UserId },
    /// The active session was torn down.
    SessionEnded,
}

/// Commands issued by the frontend to control or query the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageToBackend {
    /// Request for the application configuration.
    ConfigurationRequest,
    /// Persist a new configuration. Applies to sessions started afterwards.
    UpdateConfiguration(config::Config),
    /// Open a session: builds the store and connects the push channel.
    StartSession(session::SessionCredentials),
    /// Close the push channel and drop the store.
    EndSession,
    /// Overwrite both counters from the server dashboard.
    RefreshUnread,
    /// Rebuild the notification list from the server's unread documents.
    LoadNotifications,
    /// Mark notifications of a document read locally. Counters are untouched.
    MarkNotificationRead(notification::DocumentId),
    /// Mark a document read on the server, then locally.
    AcknowledgeDocument(notification::DocumentId),
}

/// Paired `tokio::mpsc` channels for bidirectional communication between
/// frontend and backend.
pub struct BridgeChannels {
    /// Receiver used by the frontend to get messages from the backend.
    pub frontend_rx: Receiver<MessageFromBackend>,
    /// Sender used by the frontend to send commands to the backend.
    pub frontend_tx: Sender<MessageToBackend>,

    /// Receiver used by the backend to get commands from the frontend.
    pub backend_rx: Receiver<MessageToBackend>,
    /// Sender used by the backend to send events/responses to the frontend.
    pub backend_tx: Sender<MessageFromBackend>,
}

impl BridgeChannels {
    /// Creates a new pair of bridged channels with the given buffer capacity.
    pub fn new(buffer: usize) -> Self {
        let (to_backend_tx, to_backend_rx) = mpsc::channel(buffer);
        let (to_frontend_tx, to_frontend_rx) = mpsc::channel(buffer);
        Self {
            frontend_tx: to_backend_tx,
            frontend_rx: to_frontend_rx,
            backend_rx: to_backend_rx,
            backend_tx: to_frontend_tx,
        }
    }
}

impl Default for BridgeChannels {
    fn default() -> Self {
        Self::new(64)
    }
}
