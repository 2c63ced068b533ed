use std::path::PathBuf;

use serde::Deserialize;

/// App configuration loaded from `<config dir>/reminder-tui/config.toml`.
/// Missing file or unparseable content falls back to defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the event gateway.
    pub server_url: String,
    /// Overrides the persisted device identifier when set.
    pub user_id: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".to_string(),
            user_id: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::try_load().unwrap_or_default()
    }

    fn try_load() -> Option<Self> {
        let path = config_dir()?.join("config.toml");
        if !path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(&path).ok()?;
        toml::from_str(&content).ok()
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("reminder-tui"))
}

pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("reminder-tui"))
}
