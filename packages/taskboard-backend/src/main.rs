use std::path::PathBuf;

use taskboard_backend::config::{default_config_path, load_config};
use taskboard_backend::server;
use taskboard_backend::state::AppState;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let config = load_config(&config_path);

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            log::error!("[taskboard.main] Failed to initialize store: {}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "[taskboard.main] Serving {} boards",
        state.store.board_ids().len()
    );

    if let Err(e) = server::serve(state).await {
        log::error!("[taskboard.main] HTTP server exited with error: {}", e);
        std::process::exit(1);
    }
}
