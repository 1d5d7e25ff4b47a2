use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a document as assigned by the document server.
pub type DocumentId = i64;

/// Category a notification (and its unread counter) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// A document delivered to the user's inbox.
    Inbox,
    /// A document waiting for the user's approval.
    Waiting,
}

/// A single entry of the notification list.
///
/// The same document may appear more than once, e.g. when it was both
/// delivered to and assigned for approval by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NotificationRecord {
    /// Referenced document; `None` when the push payload did not carry one.
    pub document_id: Option<DocumentId>,
    pub title: String,
    pub kind: NotificationKind,
    /// Sort key of the list, newest first.
    pub created_at: DateTime<Utc>,
    /// Set only through local interaction, never by the push channel.
    pub read: bool,
}

/// Unread counters per [`NotificationKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnreadCounts {
    pub inbox: u32,
    pub waiting: u32,
}

impl UnreadCounts {
    /// Returns the counter for `kind`.
    pub fn get(&self, kind: NotificationKind) -> u32 {
        match kind {
            NotificationKind::Inbox => self.inbox,
            NotificationKind::Waiting => self.waiting,
        }
    }

    /// Returns a mutable reference to the counter for `kind`.
    pub fn get_mut(&mut self, kind: NotificationKind) -> &mut u32 {
        match kind {
            NotificationKind::Inbox => &mut self.inbox,
            NotificationKind::Waiting => &mut self.waiting,
        }
    }
}

/// Immutable copy of the unread state published to the frontend after each
/// change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadSnapshot {
    pub counts: UnreadCounts,
    /// Newest first.
    pub notifications: Vec<NotificationRecord>,
}

impl UnreadSnapshot {
    /// Iterates over records not yet marked read.
    pub fn unread_notifications(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.notifications.iter().filter(|record| !record.read)
    }
}
