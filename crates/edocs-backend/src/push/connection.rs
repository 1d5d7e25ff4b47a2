//! Push channel connection manager.
//!
//! One spawned task owns the socket for the lifetime of a session. It moves
//! through [`ConnectionState`]s, publishing each transition on a
//! [`watch`] channel, and reconnects with exponential backoff until the
//! [`ConnectionHandle`] is closed.

use std::time::Duration;

use edocs_bridge::{config::PushConfig, connection::ConnectionState};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, Interval, MissedTickBehavior},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};

use super::{Backoff, PING, is_control_frame};

type PushStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reasons a connection attempt or an open connection ended.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("failed to connect: {0}")]
    Connect(#[source] tungstenite::Error),
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("socket error: {0}")]
    Socket(#[source] tungstenite::Error),
    #[error("server closed the connection")]
    Closed,
}

/// Timing of the connection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushSettings {
    /// Interval between `"ping"` frames while connected. Zero disables
    /// keepalives.
    pub keepalive_interval: Duration,
    /// Upper bound for a single connection attempt.
    pub connect_timeout: Duration,
    pub backoff: Backoff,
    /// Consecutive failures after which the loop gives up. `None` retries
    /// forever.
    pub max_attempts: Option<u32>,
}

impl PushSettings {
    pub fn from_config(config: &PushConfig) -> Self {
        Self {
            keepalive_interval: config.keepalive_interval(),
            connect_timeout: config.connect_timeout(),
            backoff: Backoff::new(config.reconnect_initial_delay(), config.reconnect_max_delay()),
            max_attempts: config.reconnect_max_attempts,
        }
    }
}

impl Default for PushSettings {
    fn default() -> Self {
        Self::from_config(&PushConfig::default())
    }
}

/// Owner side of a running connection loop.
///
/// Dropping the handle stops the loop without a close handshake; use
/// [`ConnectionHandle::close`] to shut down cleanly.
pub struct ConnectionHandle {
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Current state of the push channel.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Closes the socket (with a close frame when connected), stops
    /// reconnecting and waits for the loop to finish. The final state is
    /// [`ConnectionState::Disconnected`].
    pub async fn close(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("Push channel task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Starts the connection loop for `url`. Every inbound payload that is not
/// a keepalive control string is sent to `payload_tx`, in delivery order.
pub fn spawn_connection(
    url: Url,
    settings: PushSettings,
    payload_tx: mpsc::Sender<String>,
) -> ConnectionHandle {
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let connection = ConnectionLoop {
        url,
        settings,
        payload_tx,
        state_tx,
    };
    let task = tokio::spawn(connection.run(shutdown_rx));

    ConnectionHandle {
        state_rx,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

/// Resolves on the next keepalive tick; never when keepalives are off.
async fn next_keepalive(keepalive: &mut Option<Interval>) {
    match keepalive {
        Some(keepalive) => {
            keepalive.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// How a single connection ended.
enum Exit {
    /// Shutdown was requested or nobody consumes payloads anymore.
    Stop,
    /// The connection failed or dropped; a reconnect may follow.
    Dropped(PushError),
}

struct ConnectionLoop {
    url: Url,
    settings: PushSettings,
    payload_tx: mpsc::Sender<String>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionLoop {
    async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut failures = 0u32;

        loop {
            self.set_state(ConnectionState::Connecting {
                attempt: failures + 1,
            });

            let exit = match self.connect(&mut shutdown_rx).await {
                Ok(Some(stream)) => {
                    failures = 0;
                    log::info!("Push channel connected to {}", self.url);
                    self.set_state(ConnectionState::Connected);
                    self.serve(stream, &mut shutdown_rx).await
                }
                Ok(None) => Exit::Stop,
                Err(e) => Exit::Dropped(e),
            };

            let error = match exit {
                Exit::Stop => break,
                Exit::Dropped(error) => error,
            };

            failures = failures.saturating_add(1);
            if self
                .settings
                .max_attempts
                .is_some_and(|max_attempts| failures >= max_attempts)
            {
                log::error!("Push channel gave up after {failures} failed attempts: {error}");
                break;
            }

            let delay = self.settings.backoff.delay(failures);
            log::warn!("Push channel unavailable ({error}), reconnecting in {delay:?}");
            self.set_state(ConnectionState::BackingOff {
                attempt: failures,
                delay,
            });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown_rx => break,
            }
        }

        self.set_state(ConnectionState::Disconnected);
        log::info!("Push channel to {} stopped", self.url);
    }

    /// Opens the socket. `Ok(None)` means shutdown was requested meanwhile.
    async fn connect(
        &self,
        shutdown_rx: &mut oneshot::Receiver<()>,
    ) -> Result<Option<PushStream>, PushError> {
        let timeout = self.settings.connect_timeout;
        tokio::select! {
            result = tokio::time::timeout(timeout, connect_async(self.url.as_str())) => match result {
                Ok(Ok((stream, _response))) => Ok(Some(stream)),
                Ok(Err(e)) => Err(PushError::Connect(e)),
                Err(_) => Err(PushError::Timeout(timeout)),
            },
            _ = shutdown_rx => Ok(None),
        }
    }

    /// Pumps one open connection until it ends.
    async fn serve(&self, stream: PushStream, shutdown_rx: &mut oneshot::Receiver<()>) -> Exit {
        let (mut write, mut read) = stream.split();

        let period = self.settings.keepalive_interval;
        let mut keepalive = (!period.is_zero()).then(|| {
            let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);
            keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
            keepalive
        });

        loop {
            tokio::select! {
                _ = &mut *shutdown_rx => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        log::debug!("Failed to send close frame: {e}");
                    }
                    return Exit::Stop;
                }
                _ = next_keepalive(&mut keepalive) => {
                    if let Err(e) = write.send(Message::Text(PING.into())).await {
                        return Exit::Dropped(PushError::Socket(e));
                    }
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !self.forward(text.as_str()).await {
                            return Exit::Stop;
                        }
                    }
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => {
                            if !self.forward(text).await {
                                return Exit::Stop;
                            }
                        }
                        Err(_) => log::debug!("Dropping non-UTF-8 binary frame of {} bytes", data.len()),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            return Exit::Dropped(PushError::Socket(e));
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        log::debug!("Server sent close frame: {frame:?}");
                        return Exit::Dropped(PushError::Closed);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Exit::Dropped(PushError::Socket(e)),
                    None => return Exit::Dropped(PushError::Closed),
                },
            }
        }
    }

    /// Hands a payload to the consumer. Returns `false` once the consumer is
    /// gone.
    async fn forward(&self, payload: &str) -> bool {
        if is_control_frame(payload) {
            return true;
        }

        log::debug!("Push payload: {payload}");
        if self.payload_tx.send(payload.to_string()).await.is_err() {
            log::info!("Push payload consumer is gone, stopping");
            return false;
        }
        true
    }

    fn set_state(&self, state: ConnectionState) {
        log::debug!("Push channel state: {state:?}");
        self.state_tx.send_replace(state);
    }
}
