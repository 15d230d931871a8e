//! Headless server binary.
//!
//! Starts the command API, the milestone announcer and signal handling.

use tracing_subscriber::EnvFilter;

use season_bot_lib::app::SharedState;
use season_bot_lib::background;
use season_bot_lib::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting season bot");

    let (db, config, dir) = season_bot_lib::init_foundation()?;
    let state = SharedState::new(db, config, dir);

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let s = state.clone();
    let announcer = tokio::spawn(async move { background::milestone_announcer_loop(s).await });

    tracing::info!(
        port = state.server_port(),
        data_dir = %state.data_dir().display(),
        "Season bot running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    state.shutdown_token().cancel();
    let _ = tokio::join!(server_handle, announcer);
    tracing::info!("Shutdown complete");
    Ok(())
}
