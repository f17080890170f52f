//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the portal API base URL, the preference profile and the last used
//! username.
//!
//! Configuration is stored at `~/.config/packdesk/config.json`. The
//! `PACKDESK_API_URL` and `PACKDESK_PROFILE` environment variables override
//! the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::prefs::DEFAULT_PROFILE;

/// Application name used for config/data directory paths
const APP_NAME: &str = "packdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

pub const ENV_API_URL: &str = "PACKDESK_API_URL";
pub const ENV_PROFILE: &str = "PACKDESK_PROFILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub last_username: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            profile: None,
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Record `username` as the last one used. Only the file's own settings
    /// are written back; environment and flag overrides never reach disk.
    pub fn save_last_username(username: &str) -> Result<()> {
        Self::save_last_username_to(&Self::config_path()?, username)
    }

    pub fn save_last_username_to(path: &Path, username: &str) -> Result<()> {
        let mut stored = Self::load_from(path)?;
        stored.last_username = Some(username.to_string());
        stored.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides. Empty values are ignored.
    pub fn with_env(self) -> Self {
        self.with_overrides(std::env::var(ENV_API_URL).ok(), std::env::var(ENV_PROFILE).ok())
    }

    fn with_overrides(mut self, api_url: Option<String>, profile: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(profile) = profile.filter(|v| !v.trim().is_empty()) {
            self.profile = Some(profile);
        }
        self
    }

    /// Preference profile in effect.
    pub fn profile(&self) -> &str {
        self.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session file, preferences and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
