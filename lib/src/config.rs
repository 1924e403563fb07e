use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Custom user-agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Number of bookmarks fetched concurrently during metadata refresh
    #[serde(default = "default_fetch_batch_size")]
    pub fetch_batch_size: usize,

    /// Pause between refresh batches, in milliseconds
    #[serde(default = "default_fetch_batch_delay_ms")]
    pub fetch_batch_delay_ms: u64,

    /// Default remote store document used by `sync` when --remote is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            fetch_batch_size: default_fetch_batch_size(),
            fetch_batch_delay_ms: default_fetch_batch_delay_ms(),
            remote_path: None,
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/18.5 Safari/605.1.15"
        .to_string()
}

fn default_fetch_batch_size() -> usize {
    3
}

fn default_fetch_batch_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from a file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default location
    /// (~/.config/tsundoku/config.yml). Falls back to the default config
    /// if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let config_path = crate::utils::get_config_dir().join("config.yml");
        if !config_path.exists() {
            return Self::default();
        }

        Self::load_from_path(&config_path).unwrap_or_else(|e| {
            eprintln!(
                "Warning: Failed to load config from {:?}: {}",
                config_path, e
            );
            eprintln!("Using default configuration");
            Self::default()
        })
    }

    /// Save configuration to a file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&crate::utils::get_config_dir().join("config.yml"))
    }
}
