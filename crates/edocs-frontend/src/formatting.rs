use chrono::Local;
use edocs_bridge::{
    connection::ConnectionState,
    notification::{NotificationKind, NotificationRecord},
};

/// Badge text of an unread counter. Zero shows no badge.
pub fn format_badge(count: u32) -> Option<String> {
    (count > 0).then(|| count.to_string())
}

/// Label of a notification category.
pub fn format_kind(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Inbox => "Inbox",
        NotificationKind::Waiting => "Waiting Approval",
    }
}

/// Short human-readable description of the push channel state.
pub fn format_connection_state(state: &ConnectionState) -> String {
    match state {
        ConnectionState::Disconnected => "offline".to_string(),
        ConnectionState::Connecting { attempt: 1 } => "connecting".to_string(),
        ConnectionState::Connecting { attempt } => format!("connecting (attempt {attempt})"),
        ConnectionState::Connected => "live".to_string(),
        ConnectionState::BackingOff { delay, .. } => {
            format!("reconnecting in {:.1}s", delay.as_secs_f64())
        }
    }
}

/// One line of the notification list, timestamps in local time.
pub fn format_notification(record: &NotificationRecord) -> String {
    let id = record
        .document_id
        .map_or_else(|| "-".to_string(), |id| format!("#{id}"));
    let title = if record.title.is_empty() {
        "(untitled)"
    } else {
        record.title.as_str()
    };

    format!(
        "{:>6}  {:<16}  {}  {}",
        id,
        format_kind(record.kind),
        record.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        title
    )
}
