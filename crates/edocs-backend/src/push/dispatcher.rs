use chrono::{DateTime, Utc};
use edocs_bridge::{
    notification::{DocumentId, NotificationKind, NotificationRecord},
    session::UserId,
};

use super::PushEvent;
use crate::store::CounterStore;

const ASSIGNED_TITLE: &str = "Assigned Document";
const WAITING_TITLE: &str = "Waiting Approval";

/// Applies push events to a store from the point of view of one user.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    user_id: UserId,
}

impl Dispatcher {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    /// Parses a raw payload and applies it. Returns whether the store
    /// changed.
    pub fn handle_payload(&self, payload: &str, store: &mut CounterStore) -> bool {
        match PushEvent::parse(payload) {
            Some(event) => self.apply(&event, store, Utc::now()),
            None => false,
        }
    }

    /// Applies one event, stamping new records with `now`. Returns whether
    /// the store changed.
    pub fn apply(&self, event: &PushEvent, store: &mut CounterStore, now: DateTime<Utc>) -> bool {
        match event {
            PushEvent::DocumentCreated {
                creator_id,
                document_id,
                title,
            } => {
                if *creator_id == Some(self.user_id) {
                    return false;
                }
                self.notify(store, NotificationKind::Inbox, *document_id, title_or(title, ""), now);
                true
            }
            PushEvent::DocumentAssigned {
                document_id,
                title,
                recipient_ids,
                approver_ids,
            } => {
                let mut changed = false;
                if ids_or_empty(recipient_ids).contains(&self.user_id) {
                    self.notify(
                        store,
                        NotificationKind::Inbox,
                        *document_id,
                        title_or(title, ASSIGNED_TITLE),
                        now,
                    );
                    changed = true;
                }
                if ids_or_empty(approver_ids).contains(&self.user_id) {
                    self.notify(
                        store,
                        NotificationKind::Waiting,
                        *document_id,
                        title_or(title, WAITING_TITLE),
                        now,
                    );
                    changed = true;
                }
                changed
            }
            PushEvent::ApprovalStatusChanged { user_id, .. } => {
                *user_id == self.user_id && store.decrement(NotificationKind::Waiting)
            }
            PushEvent::DocumentRead { user_id, .. } => {
                *user_id == self.user_id && store.decrement(NotificationKind::Inbox)
            }
            PushEvent::Unrecognized => {
                log::debug!("Ignoring unrecognized push event");
                false
            }
        }
    }

    fn notify(
        &self,
        store: &mut CounterStore,
        kind: NotificationKind,
        document_id: Option<DocumentId>,
        title: String,
        now: DateTime<Utc>,
    ) {
        store.increment(kind);
        store.push_notification(NotificationRecord {
            document_id,
            title,
            kind,
            created_at: now,
            read: false,
        });
    }
}

fn ids_or_empty(ids: &Option<Vec<UserId>>) -> &[UserId] {
    ids.as_deref().unwrap_or_default()
}

fn title_or(title: &Option<String>, fallback: &str) -> String {
    title.clone().unwrap_or_else(|| fallback.to_string())
}
