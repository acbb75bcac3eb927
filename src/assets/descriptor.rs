use crate::error::{FetchError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Length of a hex-encoded SHA-256 digest
const SHA256_HEX_LEN: usize = 64;

/// A single downloadable file required before a model can be loaded
///
/// Descriptors are immutable once built; construct with [`AssetDescriptor::new`]
/// and optionally attach a digest with [`AssetDescriptor::with_checksum`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    #[serde(rename = "url")]
    source_url: String,
    #[serde(rename = "subfolder")]
    local_subfolder: String,
    #[serde(rename = "sha256", default, skip_serializing_if = "Option::is_none")]
    expected_checksum: Option<String>,
}

impl AssetDescriptor {
    pub fn new(source_url: impl Into<String>, local_subfolder: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            local_subfolder: local_subfolder.into(),
            expected_checksum: None,
        }
    }

    /// Declare the expected SHA-256 hex digest of the file
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.expected_checksum = Some(checksum.into());
        self
    }

    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    #[must_use]
    pub fn local_subfolder(&self) -> &str {
        &self.local_subfolder
    }

    #[must_use]
    pub fn expected_checksum(&self) -> Option<&str> {
        self.expected_checksum.as_deref()
    }

    /// Check the descriptor invariants
    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(FetchError::InvalidArgument(
                "source URL must not be empty".to_string(),
            ));
        }

        let url = self.parsed_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidArgument(format!(
                "unsupported URL scheme '{}' in {}",
                url.scheme(),
                self.source_url
            )));
        }

        self.file_name()?;
        validate_subfolder(&self.local_subfolder)?;

        if let Some(checksum) = &self.expected_checksum {
            validate_checksum(checksum)?;
        }

        Ok(())
    }

    /// File name taken from the last path segment of the URL
    pub fn file_name(&self) -> Result<String> {
        let url = self.parsed_url()?;
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .map(ToString::to_string)
            .ok_or_else(|| {
                FetchError::InvalidArgument(format!(
                    "URL has no file name segment: {}",
                    self.source_url
                ))
            })
    }

    /// Resolve the on-disk location under a cache root
    pub fn local_path(&self, cache_root: &Path) -> Result<PathBuf> {
        Ok(cache_root
            .join(&self.local_subfolder)
            .join(self.file_name()?))
    }

    fn parsed_url(&self) -> Result<Url> {
        Url::parse(self.source_url.trim()).map_err(|e| {
            FetchError::InvalidArgument(format!("malformed URL '{}': {e}", self.source_url))
        })
    }
}

fn validate_subfolder(subfolder: &str) -> Result<()> {
    let path = Path::new(subfolder);
    if subfolder.trim().is_empty() {
        return Err(FetchError::InvalidArgument(
            "local subfolder must not be empty".to_string(),
        ));
    }

    if !path.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(FetchError::InvalidArgument(format!(
            "local subfolder must be a relative path without traversal: {subfolder}"
        )));
    }

    Ok(())
}

fn validate_checksum(checksum: &str) -> Result<()> {
    let checksum = checksum.trim();
    if checksum.len() != SHA256_HEX_LEN || !checksum.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FetchError::InvalidArgument(format!(
            "expected checksum must be a {SHA256_HEX_LEN}-character SHA-256 hex digest, got '{checksum}'"
        )));
    }
    Ok(())
}
