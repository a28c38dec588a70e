//! Configuration handling for the registration client

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "CONSULAR_DATA_DIR";

/// Default time an edit may stay unsaved
pub const DEFAULT_FLUSH_MS: u64 = 500;

/// Identity fallback used when the environment does not provide one
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IdentityConfig {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    /// citizen, consular_agent or administrator
    pub role: Option<String>,
}

/// User configuration for the registration client
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistrationConfig {
    /// Where drafts and logs are kept
    pub data_dir: Option<PathBuf>,
    /// Where submitted applications are written
    pub outbox_dir: Option<PathBuf>,
    /// Maximum delay before an edit is saved, in milliseconds
    pub draft_flush_ms: Option<u64>,
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl RegistrationConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "consular", "consular-registration")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: RegistrationConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Whether a config file has been written yet
    pub fn is_present() -> bool {
        Self::config_path().is_some_and(|path| path.exists())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            fs::write(&path, content)?;
        }
        Ok(())
    }

    /// Data directory: environment override, then config, then the platform default
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir_with(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
    }

    fn data_dir_with(&self, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .or_else(|| self.data_dir.clone())
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".consular-registration"))
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.data_dir().join("drafts")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.outbox_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("outbox"))
    }

    pub fn flush_latency(&self) -> Duration {
        Duration::from_millis(self.draft_flush_ms.unwrap_or(DEFAULT_FLUSH_MS))
    }
}
