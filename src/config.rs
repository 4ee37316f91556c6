use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::format::DisplayZone;
use crate::voice::extract::ExtractScope;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("neuri")
        .join("config.json")
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    40
}

fn default_feed_limit() -> usize {
    10
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct NeuriConfig {
    pub api_base_url: String,
    pub vapi_public_key: String,
    pub main_assistant_id: String,
    /// Single-assistant setups predate the main/onboarding split.
    pub legacy_assistant_id: String,
    pub debug_logging: bool,
    pub http_timeout_secs: u64,
    pub suggestion_limit: usize,
    pub tool_response_limit: usize,
    pub extract_scope: ExtractScope,
    /// Pinned offset for dates and times. `None` follows the host's time zone.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for NeuriConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            vapi_public_key: String::new(),
            main_assistant_id: String::new(),
            legacy_assistant_id: String::new(),
            debug_logging: false,
            http_timeout_secs: default_http_timeout_secs(),
            suggestion_limit: default_feed_limit(),
            tool_response_limit: default_feed_limit(),
            extract_scope: ExtractScope::default(),
            utc_offset_minutes: None,
        }
    }
}

impl NeuriConfig {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_from(&default_config_path());
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Read a config file. Missing or malformed files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::debug!("No config at {} ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create config directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    log::error!("Failed to save config: {}", e);
                }
            }
            Err(e) => log::error!("Failed to serialize config: {}", e),
        }
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("NEURI_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(key) = get("NEURI_VAPI_PUBLIC_KEY") {
            self.vapi_public_key = key;
        }
        if let Some(id) = get("NEURI_VAPI_MAIN_ASSISTANT_ID") {
            self.main_assistant_id = id;
        }
        if let Some(id) = get("NEURI_VAPI_ASSISTANT_ID") {
            self.legacy_assistant_id = id;
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// The assistant to start calls with: main assistant first, then the legacy id.
    pub fn assistant_id(&self) -> Option<&str> {
        [&self.main_assistant_id, &self.legacy_assistant_id]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    pub fn display_zone(&self) -> DisplayZone {
        let Some(minutes) = self.utc_offset_minutes else {
            return DisplayZone::Local;
        };
        match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(offset) => DisplayZone::Fixed(offset),
            None => {
                log::warn!("Ignoring out-of-range utc_offset_minutes {}, using local time", minutes);
                DisplayZone::Local
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn assistant_id_prefers_main() {
        let mut config = NeuriConfig::default();
        assert_eq!(config.assistant_id(), None);

        config.legacy_assistant_id = "legacy".into();
        assert_eq!(config.assistant_id(), Some("legacy"));

        config.main_assistant_id = "main".into();
        assert_eq!(config.assistant_id(), Some("main"));
    }

    #[test]
    fn env_overrides_skip_empty_values() {
        let vars: HashMap<&str, &str> = [
            ("NEURI_API_BASE_URL", "https://api.example.com/"),
            ("NEURI_VAPI_MAIN_ASSISTANT_ID", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = NeuriConfig::default();
        config.main_assistant_id = "kept".into();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_base_url(), "https://api.example.com");
        assert_eq!(config.main_assistant_id, "kept");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: NeuriConfig =
            serde_json::from_str(r#"{"main_assistant_id": "a1", "utc_offset_minutes": 0}"#).unwrap();
        assert_eq!(config.main_assistant_id, "a1");
        assert_eq!(config.http_timeout_secs, 40);
        assert_eq!(config.suggestion_limit, 10);
        assert_eq!(config.extract_scope, ExtractScope::ToolResults);
        assert_eq!(
            config.display_zone(),
            DisplayZone::Fixed(FixedOffset::east_opt(0).unwrap())
        );
    }

    #[test]
    fn display_zone_defaults_to_host_rules() {
        assert_eq!(NeuriConfig::default().display_zone(), DisplayZone::Local);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_local() {
        let mut config = NeuriConfig::default();
        config.utc_offset_minutes = Some(i32::MAX);
        assert_eq!(config.display_zone(), DisplayZone::Local);

        config.utc_offset_minutes = Some(24 * 60);
        assert_eq!(config.display_zone(), DisplayZone::Local);

        config.utc_offset_minutes = Some(-330);
        assert_eq!(
            config.display_zone(),
            DisplayZone::Fixed(FixedOffset::west_opt(330 * 60).unwrap())
        );
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("neuri-missing-config-test.json");
        assert_eq!(NeuriConfig::load_from(&path), NeuriConfig::default());
    }
}
