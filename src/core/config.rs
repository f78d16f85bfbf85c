use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default deferral between hiding an alert and serving the next one.
pub const DEFAULT_REQUEUE_DELAY_MS: u64 = 50;

/// Alert service settings - persisted in alerts.json
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AlertSettings {
    /// Every submission preempts the visible alert, regardless of priority
    #[serde(default)]
    pub ignore_priority: bool,
    /// Delay before the queue is processed again after a close
    #[serde(default = "default_requeue_delay_ms")]
    pub requeue_delay_ms: u64,
    /// Caller-defined type tags merged over the built-in ones
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

fn default_requeue_delay_ms() -> u64 {
    DEFAULT_REQUEUE_DELAY_MS
}

impl AlertSettings {
    pub fn requeue_delay(&self) -> Duration {
        Duration::from_millis(self.requeue_delay_ms)
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            ignore_priority: false,
            requeue_delay_ms: DEFAULT_REQUEUE_DELAY_MS,
            types: BTreeMap::new(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join("alerts.json"),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load settings, falling back to defaults when the file is missing or unreadable.
    pub fn load(&self) -> AlertSettings {
        if self.config_path.exists() {
            match fs::read_to_string(&self.config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => log::warn!(
                        "Ignoring malformed alert settings at {:?}: {}",
                        self.config_path,
                        e
                    ),
                },
                Err(e) => log::warn!("Failed to read {:?}: {}", self.config_path, e),
            }
        }
        AlertSettings::default()
    }

    pub fn save(&self, settings: &AlertSettings) -> io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}
