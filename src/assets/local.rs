use crate::error::{FetchError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable overriding the platform cache directory
pub const CACHE_DIR_ENV: &str = "MODELFETCH_CACHE_DIR";

/// Lifecycle of a file on local storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetState {
    NotPresent,
    Downloading,
    Verified,
    Invalid,
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotPresent => "not present",
            Self::Downloading => "downloading",
            Self::Verified => "verified",
            Self::Invalid => "invalid",
        };
        f.write_str(label)
    }
}

/// Resolved on-disk location of an asset and its current state
///
/// Only the fetch engine moves an asset between states. `Verified` means the
/// file exists and matched its declared checksum when last inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    local_path: PathBuf,
    state: AssetState,
    failure: Option<String>,
}

impl LocalAsset {
    #[must_use]
    pub const fn new(local_path: PathBuf) -> Self {
        Self {
            local_path,
            state: AssetState::NotPresent,
            failure: None,
        }
    }

    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    #[must_use]
    pub const fn state(&self) -> AssetState {
        self.state
    }

    /// Last failure message while `Invalid`
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub(crate) fn mark(&mut self, state: AssetState) {
        self.state = state;
        self.failure = None;
    }

    pub(crate) fn mark_invalid(&mut self, reason: impl Into<String>) {
        self.state = AssetState::Invalid;
        self.failure = Some(reason.into());
    }
}

/// Process-wide cache root: `MODELFETCH_CACHE_DIR`, else the platform cache dir
pub fn default_cache_root() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    dirs::cache_dir()
        .map(|dir| dir.join("modelfetch"))
        .ok_or_else(|| {
            FetchError::Config(format!(
                "Could not determine a cache directory; set {CACHE_DIR_ENV}"
            ))
        })
}
