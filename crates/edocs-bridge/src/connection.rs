use std::time::Duration;

/// State of the push channel.
///
/// Owned by the connection manager in the backend; everyone else only ever
/// observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No socket and no reconnect scheduled. Initial and final state.
    #[default]
    Disconnected,
    /// A connection attempt is in flight. `attempt` counts consecutive
    /// attempts since the last successful open, starting at 1.
    Connecting { attempt: u32 },
    /// The socket is open and keepalives are being sent.
    Connected,
    /// The last attempt or connection failed; the next attempt starts after
    /// `delay`.
    BackingOff { attempt: u32, delay: Duration },
}

impl ConnectionState {
    /// Whether the push channel currently delivers events.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}
