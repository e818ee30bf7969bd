/// Shared application state passed to axum handlers.
use std::path::PathBuf;
use std::sync::Arc;

use taskboard_core::storage::memory::MemoryStore;
use taskboard_core::storage::{ColumnStore, Identity, StoreError};

use crate::auth::TokenIdentity;
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<dyn Identity>,
    pub port: u16,
    pub bind_address: String,
    pub data_file: Option<PathBuf>,
}

impl AppState {
    /// Build the store from the snapshot file if one exists, otherwise
    /// from the configured board seeds.
    pub fn from_config(config: ServerConfig) -> Result<Self, StoreError> {
        let store = match &config.data_file {
            Some(path) if path.exists() => MemoryStore::load_from(path)?,
            _ => {
                let store = MemoryStore::new();
                for seed in config.boards {
                    let board_id = seed.board.id.clone();
                    store.register_board(seed.board);
                    for mut column in seed.columns {
                        column.board_id = board_id.clone();
                        store.create_column(column)?;
                    }
                }
                store
            }
        };

        Ok(Self {
            store: Arc::new(store),
            identity: Arc::new(TokenIdentity::new(config.tokens)),
            port: config.port,
            bind_address: config.bind_address,
            data_file: config.data_file,
        })
    }

    /// Write the store snapshot, if persistence is configured.
    pub fn persist(&self) {
        let Some(path) = &self.data_file else {
            return;
        };
        if let Err(e) = self.store.save_to(path) {
            log::error!(
                "[taskboard.state] Failed to save store to {}: {}",
                path.display(),
                e
            );
        }
    }
}
