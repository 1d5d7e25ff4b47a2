use anyhow::Context;
use clap::Parser;
use edocs_backend::BackendOptions;
use edocs_bridge::{BridgeChannels, session::SessionCredentials};

#[derive(Parser)]
#[command(author, version, about = "Live unread counters for the e-document server", long_about = None)]
struct Cli {
    /// Id of the signed-in user; push events are filtered against it
    #[arg(long, env = "EDOCS_USER_ID")]
    user_id: i64,

    /// Bearer token for the document server
    #[arg(long, env = "EDOCS_TOKEN", hide_env_values = true)]
    token: String,

    /// Server base URL for this run, overriding the stored configuration
    #[arg(long)]
    server: Option<String>,
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .with_colors(true)
        .with_threads(true)
        .with_local_timestamps()
        .init()
        .context("failed to build logger instance")?;

    let cli = Cli::parse();

    let channels = BridgeChannels::default();
    let backend = edocs_backend::run(
        channels.backend_rx,
        channels.backend_tx,
        BackendOptions {
            config_path: None,
            server_url: cli.server,
        },
    )
    .context("failed to start the backend")?;

    edocs_frontend::run(
        channels.frontend_rx,
        channels.frontend_tx,
        SessionCredentials {
            user_id: cli.user_id,
            token: cli.token,
        },
    )
    .context("failed to run frontend")?;

    if backend.join().is_err() {
        anyhow::bail!("backend thread panicked");
    }
    Ok(())
}
