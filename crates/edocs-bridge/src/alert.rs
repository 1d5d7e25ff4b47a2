/// Severity of a user-visible alert.
///
/// Push channel failures are never reported through alerts; they only show
/// up as [`crate::connection::ConnectionState`] changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    /// Neutral informational message.
    Info,
    /// Something the user asked for did not happen, but the client keeps
    /// working (e.g. a command that needs a session was sent without one).
    Warning,
    /// A user-initiated operation failed.
    Error,
}

/// An alert payload intended for the user interface.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    /// The severity of the alert, determining how it is displayed.
    pub level: AlertLevel,
    /// The text content to display to the user.
    pub message: String,
}
