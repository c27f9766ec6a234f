use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{AutoquestError, Result};

pub const CONFIG_FILE: &str = "autoquest.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoquestConfig {
    pub task: TaskConfig,
    pub polling: PollingConfig,
    pub snapshot: SnapshotConfig,
}

impl AutoquestConfig {
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let config = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, dir: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        fs::write(dir.join(CONFIG_FILE), content).await?;
        Ok(())
    }

    /// Validate values for consistency and safety.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.task.retry_limit == 0 {
            errors.push("task.retry_limit must be greater than 0");
        }
        if self.task.handshake_timeout_secs == 0 {
            errors.push("task.handshake_timeout_secs must be greater than 0");
        }
        if self.polling.interval_ms == 0 {
            errors.push("polling.interval_ms must be greater than 0");
        }
        if self.polling.default_max_polls == 0 {
            errors.push("polling.default_max_polls must be greater than 0");
        }
        if self.snapshot.root_dir.trim().is_empty() {
            errors.push("snapshot.root_dir must not be empty");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AutoquestError::Config(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Total attempts allowed per mission per task run before a local fault
    /// escalates to a fatal stop.
    pub retry_limit: u32,
    /// Upper bound on the ready handshake for a subordinate mission.
    pub handshake_timeout_secs: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            handshake_timeout_secs: 300,
        }
    }
}

impl TaskConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between stop-rule evaluations inside mission polling loops.
    pub interval_ms: u64,
    /// Poll budget handed to bounded waits that do not specify their own.
    pub default_max_polls: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 200,
            default_max_polls: 50,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Logs root; snapshots land in a per-day subdirectory.
    pub root_dir: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            root_dir: "logs".to_string(),
        }
    }
}
