use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;
use crate::blocks::default_block_list_path;
use crate::popup::state::DEFAULT_DATE_FORMAT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_fps: f64,
    /// strftime pattern for account-creation and follow dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Avatar height in terminal rows.
    #[serde(default = "default_avatar_size")]
    pub avatar_size: u16,
    #[serde(default)]
    pub block_list_path: Option<PathBuf>,
    #[serde(default = "default_helix_base_url")]
    pub helix_base_url: String,
}

fn default_tick_rate() -> f64 {
    30.0
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_avatar_size() -> u16 {
    4
}

fn default_helix_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_rate_fps: default_tick_rate(),
            date_format: default_date_format(),
            avatar_size: default_avatar_size(),
            block_list_path: None,
            helix_base_url: default_helix_base_url(),
        }
    }
}

impl AppConfig {
    pub fn block_list_path(&self) -> PathBuf {
        self.block_list_path
            .clone()
            .unwrap_or_else(default_block_list_path)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/chattertui/config.toml"))
}

pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };

    let Ok(contents) = fs::read_to_string(&path) else {
        return AppConfig::default();
    };

    parse_config(&contents)
}

fn parse_config(contents: &str) -> AppConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        tracing::warn!("ignoring malformed config: {e}");
        AppConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("");
        assert_eq!(config.tick_rate_fps, 30.0);
        assert_eq!(config.date_format, "%b %-d, %Y");
        assert_eq!(config.avatar_size, 4);
        assert_eq!(config.helix_base_url, "https://api.twitch.tv/helix");
        assert_eq!(config.block_list_path(), default_block_list_path());
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = parse_config(
            r#"
            date_format = "%Y-%m-%d"
            block_list_path = "/tmp/blocks.json"
            "#,
        );
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert_eq!(config.block_list_path(), PathBuf::from("/tmp/blocks.json"));
        assert_eq!(config.avatar_size, 4);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let config = parse_config("avatar_size = \"big\"");
        assert_eq!(config.avatar_size, 4);
    }
}
