use edocs_bridge::{
    MessageFromBackend,
    alert::{AlertLevel, AlertMessage},
    config::Config,
    connection::ConnectionState,
    notification::{NotificationKind, UnreadSnapshot},
    session::UserId,
};

use crate::formatting::{format_badge, format_connection_state, format_kind, format_notification};

/// Number of alerts kept for display.
const ALERT_HISTORY: usize = 5;

/// Everything the console shows, rebuilt from backend messages only.
#[derive(Debug, Clone, Default)]
pub struct UnreadView {
    pub user_id: Option<UserId>,
    pub connection: ConnectionState,
    pub snapshot: UnreadSnapshot,
    pub config: Option<Config>,
    pub alerts: Vec<AlertMessage>,
}

impl UnreadView {
    /// Applies a backend message. Returns whether the rendered view changed.
    pub fn apply(&mut self, message: MessageFromBackend) -> bool {
        match message {
            MessageFromBackend::Alert(alert) => {
                if self.alerts.len() == ALERT_HISTORY {
                    self.alerts.remove(0);
                }
                self.alerts.push(alert);
                true
            }
            MessageFromBackend::ConfigurationResponse(config) => {
                self.config = Some(config);
                false
            }
            MessageFromBackend::ConnectionStateChanged(state) => {
                let changed = self.connection != state;
                self.connection = state;
                changed
            }
            MessageFromBackend::UnreadStateChanged(snapshot) => {
                let changed = self.snapshot != snapshot;
                self.snapshot = snapshot;
                changed
            }
            MessageFromBackend::SessionStarted { user_id } => {
                self.user_id = Some(user_id);
                true
            }
            MessageFromBackend::SessionEnded => {
                self.user_id = None;
                self.connection = ConnectionState::Disconnected;
                self.snapshot = UnreadSnapshot::default();
                true
            }
        }
    }

    /// The last configuration received from the backend with a new server
    /// base URL. `None` until the backend has answered the config request.
    pub fn config_with_server(&self, base_url: &str) -> Option<Config> {
        let mut config = self.config.clone()?;
        config.server.base_url = base_url.to_string();
        Some(config)
    }

    /// One-line status: user, push channel and both badges.
    pub fn status_line(&self) -> String {
        let user = self
            .user_id
            .map_or_else(|| "signed out".to_string(), |id| format!("user {id}"));
        let badges = [NotificationKind::Inbox, NotificationKind::Waiting]
            .into_iter()
            .map(|kind| {
                let badge = format_badge(self.snapshot.counts.get(kind));
                format!("{} [{}]", format_kind(kind), badge.as_deref().unwrap_or(" "))
            })
            .collect::<Vec<_>>()
            .join("  ");

        format!(
            "{user} | {} | {badges}",
            format_connection_state(&self.connection)
        )
    }

    pub fn render(&self) -> String {
        let mut lines = vec![self.status_line()];

        let unread: Vec<_> = self.snapshot.unread_notifications().collect();
        if unread.is_empty() {
            lines.push("  no unread notifications".to_string());
        } else {
            lines.extend(unread.into_iter().map(format_notification));
        }

        for alert in &self.alerts {
            let prefix = match alert.level {
                AlertLevel::Info => "info",
                AlertLevel::Warning => "warning",
                AlertLevel::Error => "error",
            };
            lines.push(format!("{prefix}: {}", alert.message));
        }

        lines.join("\n")
    }
}
