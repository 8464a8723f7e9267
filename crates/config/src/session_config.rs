// Session tuning
// Loaded from ~/.config/parley/session.toml

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Debounce before a settings change is written out
    pub save_delay_ms: u64,

    /// Idle time before the passcode lock engages
    pub auto_lock_secs: u64,

    /// How late a lock check may fire before the session locks anyway
    pub auto_lock_late_ms: u64,

    /// Settings blob location, None = platform config dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_delay_ms: 1000,
            auto_lock_secs: 3600,
            auto_lock_late_ms: 3000,
            settings_path: None,
        }
    }
}

impl SessionConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("parley").join("session.toml"))
    }

    /// Load from the platform config dir, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using default session config", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    pub fn auto_lock_timeout(&self) -> Duration {
        Duration::from_secs(self.auto_lock_secs)
    }

    pub fn auto_lock_late_tolerance(&self) -> Duration {
        Duration::from_millis(self.auto_lock_late_ms)
    }

    /// Where the settings blob is kept.
    pub fn resolved_settings_path(&self) -> Option<PathBuf> {
        self.settings_path
            .clone()
            .or_else(crate::store::FileStore::default_path)
    }
}
