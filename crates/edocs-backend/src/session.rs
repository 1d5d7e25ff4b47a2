//! Lifetime of one logged-in user: counter store, REST client and push
//! channel, created together on login and torn down together on logout.

use std::sync::Arc;

use edocs_bridge::{
    MessageFromBackend,
    config::Config,
    connection::ConnectionState,
    session::{SessionCredentials, UserId},
};
use tokio::{
    sync::{RwLock, mpsc, watch},
    task::JoinHandle,
};

use crate::{
    api::DocumentsApi,
    config::{ConfigError, push_url, rest_base_url},
    push::{ConnectionHandle, PushSettings, dispatcher::Dispatcher, spawn_connection},
    store::CounterStore,
};

/// Buffer between the socket reader and the dispatcher.
const PAYLOAD_BUFFER: usize = 256;

/// Store shared between the dispatcher task and request handlers.
pub(crate) type SharedStore = Arc<RwLock<CounterStore>>;

pub(crate) struct Session {
    pub generation: u64,
    pub user_id: UserId,
    pub store: SharedStore,
    pub api: DocumentsApi,
    connection: ConnectionHandle,
    dispatch_task: JoinHandle<()>,
    state_task: JoinHandle<()>,
}

impl Session {
    /// Builds the session and connects its push channel. Fails only when
    /// the configured server addresses are unusable; connection problems
    /// are handled by the reconnect loop.
    pub fn start(
        generation: u64,
        credentials: SessionCredentials,
        config: &Config,
        request_client: reqwest::Client,
        tx: mpsc::Sender<MessageFromBackend>,
    ) -> Result<Self, ConfigError> {
        let base_url = rest_base_url(&config.server)?;
        let push_url = push_url(&config.server)?;
        log::info!(
            "Starting session for user {} (rest: {base_url}, push: {push_url})",
            credentials.user_id
        );

        let api = DocumentsApi::new(request_client, base_url, credentials.token);
        let store: SharedStore = Arc::new(RwLock::new(CounterStore::new()));

        let (payload_tx, payload_rx) = mpsc::channel(PAYLOAD_BUFFER);
        let connection =
            spawn_connection(push_url, PushSettings::from_config(&config.push), payload_tx);

        let dispatch_task = tokio::spawn(dispatch_payloads(
            payload_rx,
            Dispatcher::new(credentials.user_id),
            store.clone(),
            tx.clone(),
        ));
        let state_task = tokio::spawn(forward_connection_state(connection.subscribe(), tx));

        Ok(Self {
            generation,
            user_id: credentials.user_id,
            store,
            api,
            connection,
            dispatch_task,
            state_task,
        })
    }

    /// Closes the push channel without reconnecting, stops the session's
    /// background tasks and clears the store. Nothing of this session is
    /// published once this returns.
    pub async fn shutdown(self) {
        log::info!("Ending session for user {}", self.user_id);
        self.state_task.abort();
        let _ = self.state_task.await;
        self.connection.close().await;
        self.dispatch_task.abort();
        let _ = self.dispatch_task.await;

        // late request results land in an empty store
        self.store.write().await.reset();
    }
}

/// Applies push payloads to the store strictly in delivery order and
/// publishes a snapshot after each change.
async fn dispatch_payloads(
    mut payload_rx: mpsc::Receiver<String>,
    dispatcher: Dispatcher,
    store: SharedStore,
    tx: mpsc::Sender<MessageFromBackend>,
) {
    while let Some(payload) = payload_rx.recv().await {
        let snapshot = {
            let mut store = store.write().await;
            if !dispatcher.handle_payload(&payload, &mut store) {
                continue;
            }
            log_drift(&store);
            store.snapshot()
        };

        if tx
            .send(MessageFromBackend::UnreadStateChanged(snapshot))
            .await
            .is_err()
        {
            break;
        }
    }
}

/// Forwards every connection state, starting with the current one.
async fn forward_connection_state(
    mut state_rx: watch::Receiver<ConnectionState>,
    tx: mpsc::Sender<MessageFromBackend>,
) {
    loop {
        let state = *state_rx.borrow_and_update();
        if tx
            .send(MessageFromBackend::ConnectionStateChanged(state))
            .await
            .is_err()
        {
            break;
        }
        if state_rx.changed().await.is_err() {
            break;
        }
    }
}

/// Logs when the counters no longer match the unread records in the list.
pub(crate) fn log_drift(store: &CounterStore) {
    let derived = store.derived_counts();
    if derived != store.counts() {
        log::debug!(
            "Unread counters {:?} differ from notification list {:?}",
            store.counts(),
            derived
        );
    }
}
