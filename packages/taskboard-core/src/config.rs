/// View preferences injected into the view layer: the active board and
/// the last used filters. Stored as JSON, never on the tasks themselves.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::filter::FilterCriteria;
use crate::swimlane::SwimlaneMode;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewPreferences {
    pub active_board_id: Option<String>,
    pub filters: FilterCriteria,
    pub swimlane: SwimlaneMode,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ViewPreferences {
    /// Load preferences. Returns defaults if the file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!(
                    "[taskboard.config] Failed to parse preferences {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }),
            Err(_) => {
                log::info!(
                    "[taskboard.config] No preferences at {}, using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
