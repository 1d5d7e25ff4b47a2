use std::time::Duration;

use edocs_bridge::{MessageFromBackend, MessageToBackend, session::SessionCredentials};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::{
    commands::{Command, HELP},
    entities::UnreadView,
};

pub mod commands;
pub mod entities;
pub mod formatting;

/// Upper bound on waiting for the backend to confirm a session teardown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct BackendBridge {
    pub to_backend: mpsc::Sender<MessageToBackend>,
}

impl BackendBridge {
    pub async fn send(&self, message: MessageToBackend) -> anyhow::Result<()> {
        self.to_backend
            .send(message)
            .await
            .map_err(|_| anyhow::anyhow!("backend is no longer running"))
    }

    pub async fn request_config(&self) -> anyhow::Result<()> {
        self.send(MessageToBackend::ConfigurationRequest).await
    }

    pub async fn start_session(&self, credentials: SessionCredentials) -> anyhow::Result<()> {
        self.send(MessageToBackend::StartSession(credentials)).await
    }

    pub async fn end_session(&self) -> anyhow::Result<()> {
        self.send(MessageToBackend::EndSession).await
    }
}

/// Runs the console frontend on the calling thread until the user quits,
/// stdin closes or Ctrl-C is pressed. The session is ended before returning.
pub fn run(
    rx: mpsc::Receiver<MessageFromBackend>,
    tx: mpsc::Sender<MessageToBackend>,
    credentials: SessionCredentials,
) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(event_loop(rx, BackendBridge { to_backend: tx }, credentials))
}

async fn event_loop(
    mut rx: mpsc::Receiver<MessageFromBackend>,
    bridge: BackendBridge,
    credentials: SessionCredentials,
) -> anyhow::Result<()> {
    let mut view = UnreadView::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    bridge.request_config().await?;
    bridge.start_session(credentials).await?;
    println!("{HELP}");

    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else {
                    log::warn!("Backend closed the bridge");
                    return Ok(());
                };
                log::debug!("Got a message from backend: {message:?}");
                if view.apply(message) {
                    println!("{}", view.render());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match commands::parse(&line) {
                    Ok(Command::Backend(message)) => bridge.send(message).await?,
                    Ok(Command::Show) => println!("{}", view.render()),
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::SetServer(base_url)) => match view.config_with_server(&base_url) {
                        Some(config) => {
                            bridge.send(MessageToBackend::UpdateConfiguration(config)).await?
                        }
                        None => println!("configuration not loaded yet"),
                    },
                    Ok(Command::Quit) => break,
                    Err(commands::ParseError::Empty) => {}
                    Err(error) => println!("{error}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    bridge.end_session().await?;
    if tokio::time::timeout(SHUTDOWN_GRACE, drain_until_session_ended(&mut rx))
        .await
        .is_err()
    {
        log::warn!("Backend did not confirm the session teardown");
    }
    Ok(())
}

/// Waits for the backend to confirm teardown so its log lines come before
/// the process exits.
async fn drain_until_session_ended(rx: &mut mpsc::Receiver<MessageFromBackend>) {
    while let Some(message) = rx.recv().await {
        if matches!(message, MessageFromBackend::SessionEnded) {
            break;
        }
    }
}
