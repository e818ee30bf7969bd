/// Configuration for the taskboard server.
/// Reads server.json from ~/.config/taskboard/server.json (or platform equivalent).
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use taskboard_core::storage::memory::BoardRecord;
use taskboard_core::types::Column;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Bearer token → user id.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
    /// Store snapshot file. Loaded at startup when present, rewritten
    /// after every mutation.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    /// Boards created on startup when no snapshot file exists.
    #[serde(default)]
    pub boards: Vec<BoardSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSeed {
    #[serde(flatten)]
    pub board: BoardRecord,
    #[serde(default)]
    pub columns: Vec<Column>,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            tokens: HashMap::new(),
            data_file: None,
            boards: Vec::new(),
        }
    }
}

/// Default config path: ~/.config/taskboard/server.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("server.json")
}

/// Load config from path. Returns default if the file doesn't exist or
/// can't be parsed.
pub fn load_config(path: &Path) -> ServerConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(
                "[taskboard.config] Failed to parse config {}: {}",
                path.display(),
                e
            );
            ServerConfig::default()
        }),
        Err(_) => {
            log::info!(
                "[taskboard.config] No config at {}, using defaults",
                path.display()
            );
            ServerConfig::default()
        }
    }
}
