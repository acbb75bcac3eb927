use thiserror::Error;

/// Main error type for modelfetch
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid asset descriptor: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}\n\nTroubleshooting:\n- Check internet connection\n- Verify firewall or proxy settings\n- Try increasing network.timeout_secs in config\n- Run with RUST_LOG=debug for more details")]
    Network(String),

    #[error("Checksum mismatch: expected {expected}, got {actual}\n\nTroubleshooting:\n- The server may be serving a different revision of the file\n- Verify the declared sha256 in your asset list\n- Re-run the fetch; the corrupt download has been discarded")]
    Integrity { expected: String, actual: String },

    #[error("Not enough disk space: {required_mb} MB required, {available_mb} MB available\n\nTroubleshooting:\n- Free up space in the cache directory\n- Point cache.root in config at a larger volume\n- Lower cache.min_free_mb if the headroom is too conservative")]
    InsufficientSpace { required_mb: u64, available_mb: u64 },

    #[error("Download cancelled")]
    Cancelled,

    #[error("Campaign incomplete: {} asset(s) not verified: {}", .failed.len(), .failed.join(", "))]
    CampaignIncomplete { failed: Vec<String> },

    #[error("Config error: {0}\n\nTroubleshooting:\n- Check config file: ~/.config/modelfetch/config.toml\n- Set MODELFETCH_CACHE_DIR to choose a cache directory\n- Run with RUST_LOG=debug for more details")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Whether the error only affects a single asset of a campaign
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Integrity { .. }
                | Self::InsufficientSpace { .. }
                | Self::Cancelled
                | Self::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_asset_errors_are_recoverable() {
        assert!(FetchError::Network("timeout".to_string()).is_recoverable());
        assert!(FetchError::Cancelled.is_recoverable());
        assert!(FetchError::Integrity {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        }
        .is_recoverable());
    }

    #[test]
    fn test_descriptor_errors_are_fatal() {
        assert!(!FetchError::InvalidArgument("empty url".to_string()).is_recoverable());
        assert!(!FetchError::CampaignIncomplete { failed: vec![] }.is_recoverable());
    }

    #[test]
    fn test_campaign_incomplete_lists_failures() {
        let err = FetchError::CampaignIncomplete {
            failed: vec!["a.pb".to_string(), "labels.txt".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 asset(s)"));
        assert!(msg.contains("a.pb, labels.txt"));
    }
}
