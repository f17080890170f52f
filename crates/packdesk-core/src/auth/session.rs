use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// The signed-in portal user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub signed_in_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(username: String, avatar: Option<String>) -> Self {
        Self {
            username,
            avatar,
            signed_in_at: Utc::now(),
        }
    }
}

pub struct Session {
    data_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir, data: None }
    }

    /// Load session from disk. Returns whether a session was found.
    /// An unreadable session file counts as signed out.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        match serde_json::from_str::<SessionData>(&contents) {
            Ok(data) => {
                self.data = Some(data);
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt session file");
                Ok(false)
            }
        }
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    pub fn user(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.username.as_str())
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}
