//! Session-scoped unread counters and notification list.
//!
//! The counters are maintained independently of the record list: push events
//! adjust them by one, reconciliation overwrites them from the dashboard.
//! [`CounterStore::derived_counts`] gives the projection of the list for
//! comparison only.

use chrono::{DateTime, Utc};
use edocs_bridge::notification::{
    DocumentId, NotificationKind, NotificationRecord, UnreadCounts, UnreadSnapshot,
};

use crate::api::{Dashboard, DashboardDocument, UnreadDocument, UnreadDocuments, parse_timestamp};

#[derive(Debug, Clone, Default)]
pub struct CounterStore {
    counts: UnreadCounts,
    notifications: Vec<NotificationRecord>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> UnreadCounts {
        self.counts
    }

    /// Records, newest first.
    pub fn notifications(&self) -> &[NotificationRecord] {
        &self.notifications
    }

    pub fn increment(&mut self, kind: NotificationKind) {
        let counter = self.counts.get_mut(kind);
        *counter = counter.saturating_add(1);
    }

    /// Decrements the counter for `kind`, stopping at zero. Returns whether
    /// the counter changed.
    pub fn decrement(&mut self, kind: NotificationKind) -> bool {
        let counter = self.counts.get_mut(kind);
        if *counter == 0 {
            return false;
        }
        *counter -= 1;
        true
    }

    /// Inserts a record, keeping the list ordered newest first. Records with
    /// equal timestamps keep arrival order, latest on top.
    pub fn push_notification(&mut self, record: NotificationRecord) {
        let position = self
            .notifications
            .partition_point(|existing| existing.created_at > record.created_at);
        self.notifications.insert(position, record);
    }

    /// Marks every record of `document_id` as read and returns how many
    /// changed. Counters are left alone.
    pub fn mark_read(&mut self, document_id: DocumentId) -> usize {
        let mut changed = 0;
        for record in &mut self.notifications {
            if record.document_id == Some(document_id) && !record.read {
                record.read = true;
                changed += 1;
            }
        }
        changed
    }

    /// Overwrites both counters with the number of unread entries in the
    /// matching dashboard list.
    pub fn reconcile_counts(&mut self, dashboard: &Dashboard) {
        fn unread(documents: &[DashboardDocument]) -> u32 {
            let count = documents.iter().filter(|document| !document.is_read).count();
            u32::try_from(count).unwrap_or(u32::MAX)
        }

        let reconciled = UnreadCounts {
            inbox: unread(&dashboard.inbox),
            waiting: unread(&dashboard.ready_to_approve),
        };
        if reconciled != self.counts {
            log::info!(
                "Reconciled unread counters from {:?} to {:?}",
                self.counts,
                reconciled
            );
        }
        self.counts = reconciled;
    }

    /// Rebuilds the record list from the server's unread documents. Counters
    /// are left alone.
    pub fn replace_notifications(&mut self, unread: &UnreadDocuments) {
        fn to_record(document: &UnreadDocument, kind: NotificationKind) -> NotificationRecord {
            NotificationRecord {
                document_id: Some(document.id),
                title: document.title.clone().unwrap_or_default(),
                kind,
                created_at: document
                    .created_at
                    .as_deref()
                    .and_then(parse_timestamp)
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                read: false,
            }
        }

        let mut notifications: Vec<NotificationRecord> = unread
            .inbox
            .iter()
            .map(|document| to_record(document, NotificationKind::Inbox))
            .chain(
                unread
                    .waiting
                    .iter()
                    .map(|document| to_record(document, NotificationKind::Waiting)),
            )
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.notifications = notifications;
    }

    /// Number of unread records of each kind in the list.
    pub fn derived_counts(&self) -> UnreadCounts {
        let mut counts = UnreadCounts::default();
        for record in self.notifications.iter().filter(|record| !record.read) {
            *counts.get_mut(record.kind) += 1;
        }
        counts
    }

    pub fn reset(&mut self) {
        self.counts = UnreadCounts::default();
        self.notifications.clear();
    }

    pub fn snapshot(&self) -> UnreadSnapshot {
        UnreadSnapshot {
            counts: self.counts,
            notifications: self.notifications.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(document_id: DocumentId, kind: NotificationKind, minute: u32) -> NotificationRecord {
        NotificationRecord {
            document_id: Some(document_id),
            title: format!("document {document_id}"),
            kind,
            created_at: Utc.with_ymd_and_hms(2024, 5, 2, 10, minute, 0).unwrap(),
            read: false,
        }
    }

    fn dashboard_document(id: DocumentId, is_read: bool) -> DashboardDocument {
        DashboardDocument {
            id,
            title: None,
            status: None,
            created_at: None,
            is_read,
        }
    }

    #[test]
    fn counters_never_drop_below_zero() {
        let mut store = CounterStore::new();
        let steps = [
            (NotificationKind::Inbox, false),
            (NotificationKind::Inbox, true),
            (NotificationKind::Inbox, false),
            (NotificationKind::Inbox, false),
            (NotificationKind::Waiting, false),
            (NotificationKind::Waiting, true),
            (NotificationKind::Waiting, true),
            (NotificationKind::Waiting, false),
        ];

        for (kind, increment) in steps {
            if increment {
                store.increment(kind);
            } else {
                store.decrement(kind);
            }
        }

        assert_eq!(store.counts(), UnreadCounts { inbox: 0, waiting: 1 });
        assert!(!store.decrement(NotificationKind::Inbox));
    }

    #[test]
    fn reconcile_counts_unread_entries_regardless_of_prior_value() {
        let mut store = CounterStore::new();
        for _ in 0..5 {
            store.increment(NotificationKind::Inbox);
        }

        let dashboard = Dashboard {
            inbox: vec![
                dashboard_document(1, false),
                dashboard_document(2, true),
                dashboard_document(3, false),
            ],
            ready_to_approve: vec![dashboard_document(4, true)],
            approved_by_me: vec![dashboard_document(5, false)],
            my_finalized: Vec::new(),
        };

        store.reconcile_counts(&dashboard);
        assert_eq!(store.counts(), UnreadCounts { inbox: 2, waiting: 0 });

        store.reconcile_counts(&dashboard);
        assert_eq!(store.counts(), UnreadCounts { inbox: 2, waiting: 0 });
    }

    #[test]
    fn mark_read_flags_all_records_of_a_document_only() {
        let mut store = CounterStore::new();
        store.increment(NotificationKind::Inbox);
        store.push_notification(record(1, NotificationKind::Inbox, 0));
        store.push_notification(record(1, NotificationKind::Waiting, 1));
        store.push_notification(record(2, NotificationKind::Inbox, 2));

        assert_eq!(store.mark_read(1), 2);
        assert_eq!(store.mark_read(1), 0);
        assert_eq!(store.counts().inbox, 1);
        assert_eq!(
            store.derived_counts(),
            UnreadCounts { inbox: 1, waiting: 0 }
        );
    }

    #[test]
    fn notifications_stay_newest_first() {
        let mut store = CounterStore::new();
        store.push_notification(record(1, NotificationKind::Inbox, 5));
        store.push_notification(record(2, NotificationKind::Inbox, 1));
        store.push_notification(record(3, NotificationKind::Waiting, 9));

        let ids: Vec<_> = store
            .notifications()
            .iter()
            .map(|record| record.document_id)
            .collect();
        assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn replace_notifications_merges_and_sorts_unread_documents() {
        let mut store = CounterStore::new();
        store.push_notification(record(99, NotificationKind::Inbox, 0));

        let unread = UnreadDocuments {
            inbox: vec![UnreadDocument {
                id: 1,
                title: Some("Budget".to_string()),
                created_at: Some("2024-05-02T10:00:00".to_string()),
            }],
            waiting: vec![
                UnreadDocument {
                    id: 2,
                    title: None,
                    created_at: Some("2024-05-03T08:00:00Z".to_string()),
                },
                UnreadDocument {
                    id: 3,
                    title: Some("Undated".to_string()),
                    created_at: None,
                },
            ],
        };
        store.replace_notifications(&unread);

        let notifications = store.notifications();
        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0].document_id, Some(2));
        assert_eq!(notifications[0].kind, NotificationKind::Waiting);
        assert_eq!(notifications[1].title, "Budget");
        assert_eq!(notifications[2].document_id, Some(3));
        assert!(notifications.iter().all(|record| !record.read));
        assert_eq!(store.counts(), UnreadCounts::default());
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = CounterStore::new();
        store.increment(NotificationKind::Waiting);
        store.push_notification(record(1, NotificationKind::Waiting, 0));

        store.reset();
        assert_eq!(store.snapshot(), UnreadSnapshot::default());
    }
}
