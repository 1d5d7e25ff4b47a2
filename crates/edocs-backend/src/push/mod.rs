//! Server push channel: connection management and event dispatch.
//!
//! The [`connection`] loop owns the socket and forwards raw payloads in
//! delivery order; [`dispatcher`] turns each payload into a [`PushEvent`]
//! and applies it to the session's [`crate::store::CounterStore`].

pub mod backoff;
pub mod connection;
pub mod dispatcher;

use edocs_bridge::{notification::DocumentId, session::UserId};
use serde::Deserialize;

pub use backoff::Backoff;
pub use connection::{ConnectionHandle, PushError, PushSettings, spawn_connection};

/// Keepalive frame sent by the client and echoed by the server.
pub const PING: &str = "ping";
/// Keepalive reply.
pub const PONG: &str = "pong";

/// Whether `payload` is a keepalive control string rather than an event.
pub fn is_control_frame(payload: &str) -> bool {
    payload == PING || payload == PONG
}

/// Events the server publishes on the push channel, keyed by the `event`
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PushEvent {
    DocumentCreated {
        /// Absent creators never match the current user.
        #[serde(default)]
        creator_id: Option<UserId>,
        #[serde(default)]
        document_id: Option<DocumentId>,
        #[serde(default)]
        title: Option<String>,
    },
    DocumentAssigned {
        #[serde(default)]
        document_id: Option<DocumentId>,
        #[serde(default)]
        title: Option<String>,
        /// Missing and `null` lists are both empty.
        #[serde(default)]
        recipient_ids: Option<Vec<UserId>>,
        #[serde(default)]
        approver_ids: Option<Vec<UserId>>,
    },
    ApprovalStatusChanged {
        user_id: UserId,
        #[serde(default)]
        document_id: Option<DocumentId>,
        #[serde(default)]
        status: Option<String>,
    },
    DocumentRead {
        user_id: UserId,
        #[serde(default)]
        document_id: Option<DocumentId>,
    },
    /// Any `event` value this client does not know about.
    #[serde(other)]
    Unrecognized,
}

impl PushEvent {
    /// Parses a text payload. Returns `None` for keepalive frames and for
    /// payloads that are not a valid event object.
    pub fn parse(payload: &str) -> Option<Self> {
        if is_control_frame(payload) {
            return None;
        }

        match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                log::debug!("Dropping malformed push payload {payload:?}: {e}");
                None
            }
        }
    }
}
