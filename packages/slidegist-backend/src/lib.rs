/// slidegist backend: config loading, logging, remote store selection, HTTP server.
pub mod api;
pub mod config;
pub mod github;
mod log_bridge;
pub mod remote;
pub mod server;
pub mod state;

use crate::state::AppState;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = log_bridge::init() {
        log_bridge::write_fallback_line(&format!("failed to initialize backend logger: {}", e));
    }

    let config_path = config::default_config_path();
    let config = config::load_config(&config_path);
    let state = AppState::from_config(&config, config::api_token_from_env());

    let port = server::spawn_server(state).await?;
    log::info!(
        "slidegist ready on port {} (share links under {})",
        port,
        config.public_base_url()
    );

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    Ok(())
}
