use crate::assets::local::default_cache_root;
use crate::error::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CacheConfig {
    pub root: Option<PathBuf>,
    #[serde(default = "default_min_free_mb")]
    pub min_free_mb: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ProgressConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// Default value functions
fn default_min_free_mb() -> u64 {
    100
}
fn default_timeout_secs() -> u64 {
    1800
}
fn default_connect_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("modelfetch/{}", env!("CARGO_PKG_VERSION"))
}
fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            min_free_mb: default_min_free_mb(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Config {
    /// Load config from the user config directory, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load config from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;

        toml::from_str(&content).map_err(|e| {
            FetchError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Resolve the cache root: explicit config wins, then env/platform default
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache.root {
            Some(root) => Ok(root.clone()),
            None => default_cache_root(),
        }
    }

    /// Free-space headroom in bytes
    #[must_use]
    pub const fn min_free_bytes(&self) -> u64 {
        self.cache.min_free_mb * 1_024 * 1_024
    }
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config)
    } else {
        let home = std::env::var("HOME")
            .map_err(|_| FetchError::Config("HOME env var not set".to_string()))?;
        PathBuf::from(home).join(".config")
    };

    Ok(config_dir.join("modelfetch").join("config.toml"))
}
