//! Reconciliation and local interaction with the unread state.

use edocs_bridge::{
    MessageFromBackend, alert::AlertLevel, notification::DocumentId,
};

use crate::{
    api::DocumentsApi,
    session::{SharedStore, log_drift},
};

/// The parts of the active session a request needs, detached from the
/// state lock so the request can run without holding it.
struct SessionParts {
    generation: u64,
    store: SharedStore,
    api: DocumentsApi,
}

async fn current_session(context: &super::AppContextHandle) -> Option<SessionParts> {
    let state = context.state.read().await;
    state.session.as_ref().map(|session| SessionParts {
        generation: session.generation,
        store: session.store.clone(),
        api: session.api.clone(),
    })
}

/// Publishes the store's snapshot unless the session it belongs to has
/// ended in the meantime.
async fn publish_if_current(context: &super::AppContextHandle, parts: &SessionParts) {
    let is_current = {
        let state = context.state.read().await;
        state
            .session
            .as_ref()
            .is_some_and(|session| session.generation == parts.generation)
    };
    if !is_current {
        log::debug!("Discarding result of ended session {}", parts.generation);
        return;
    }

    let snapshot = {
        let store = parts.store.read().await;
        log_drift(&store);
        store.snapshot()
    };
    context
        .send(MessageFromBackend::UnreadStateChanged(snapshot))
        .await;
}

async fn require_session(context: &super::AppContextHandle) -> Option<SessionParts> {
    let parts = current_session(context).await;
    if parts.is_none() {
        context
            .send_alert(AlertLevel::Warning, "You are not logged in.")
            .await;
    }
    parts
}

/// Handles [`edocs_bridge::MessageToBackend::RefreshUnread`]: overwrites both
/// counters from the dashboard. On failure the counters keep their values
/// and no retry is scheduled.
pub async fn handle_refresh_request(context: super::AppContextHandle) {
    let Some(parts) = current_session(&context).await else {
        log::debug!("Refresh requested without a session");
        return;
    };

    match parts.api.dashboard().await {
        Ok(dashboard) => {
            parts.store.write().await.reconcile_counts(&dashboard);
            publish_if_current(&context, &parts).await;
        }
        Err(e) => log::error!("Failed to refresh unread counters: {e}"),
    }
}

/// Handles [`edocs_bridge::MessageToBackend::LoadNotifications`]: rebuilds
/// the notification list from the server's unread documents.
pub async fn handle_load_notifications_request(context: super::AppContextHandle) {
    let Some(parts) = current_session(&context).await else {
        log::debug!("Notification load requested without a session");
        return;
    };

    match parts.api.unread_documents().await {
        Ok(unread) => {
            parts.store.write().await.replace_notifications(&unread);
            publish_if_current(&context, &parts).await;
        }
        Err(e) => log::error!("Failed to load unread documents: {e}"),
    }
}

/// Handles [`edocs_bridge::MessageToBackend::MarkNotificationRead`]: flags
/// the document's records as read without touching the counters.
pub async fn handle_mark_read(context: super::AppContextHandle, document_id: DocumentId) {
    let Some(parts) = require_session(&context).await else {
        return;
    };

    let changed = parts.store.write().await.mark_read(document_id);
    if changed > 0 {
        publish_if_current(&context, &parts).await;
    }
}

/// Handles [`edocs_bridge::MessageToBackend::AcknowledgeDocument`]: marks
/// the document read on the server, then locally. The inbox counter follows
/// once the server emits `document_read`.
pub async fn handle_acknowledge(context: super::AppContextHandle, document_id: DocumentId) {
    let Some(parts) = require_session(&context).await else {
        return;
    };

    if let Err(e) = parts.api.mark_read(document_id).await {
        log::error!("Failed to mark document {document_id} as read: {e}");
        context
            .send_alert(
                AlertLevel::Warning,
                format!("Could not mark document {document_id} as read."),
            )
            .await;
        return;
    }

    let changed = parts.store.write().await.mark_read(document_id);
    if changed > 0 {
        publish_if_current(&context, &parts).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use edocs_bridge::{config::Config, notification::NotificationKind};
    use reqwest::Url;
    use tokio::sync::{RwLock, mpsc};

    use super::*;
    use crate::{AppContext, state::State, store::CounterStore};

    #[tokio::test]
    async fn results_of_an_ended_session_are_not_published() {
        let (tx, mut rx) = mpsc::channel(8);
        let context = Arc::new(AppContext {
            state: Arc::new(RwLock::new(State::new(Config::default(), None))),
            tx,
        });

        let mut store = CounterStore::new();
        store.increment(NotificationKind::Inbox);
        let parts = SessionParts {
            generation: 1,
            store: Arc::new(RwLock::new(store)),
            api: DocumentsApi::new(
                reqwest::Client::new(),
                Url::parse("http://localhost:8000").unwrap(),
                "token",
            ),
        };

        publish_if_current(&context, &parts).await;
        assert!(rx.try_recv().is_err());
    }
}
