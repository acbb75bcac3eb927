use crate::assets::local::AssetState;
use crate::error::{FetchError, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Result of one asset within a campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetOutcome {
    pub asset_index: usize,
    pub source_url: String,
    pub local_path: PathBuf,
    pub state: AssetState,
    /// True when no network request was needed
    pub from_cache: bool,
    pub bytes_downloaded: u64,
    pub error: Option<String>,
}

impl AssetOutcome {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.state == AssetState::Verified
    }
}

/// Aggregate result of one `download()` campaign
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub outcomes: Vec<AssetOutcome>,
    pub cancelled: bool,
    pub completed_at: String,
}

impl FetchReport {
    pub(crate) fn new(outcomes: Vec<AssetOutcome>, cancelled: bool) -> Self {
        Self {
            outcomes,
            cancelled,
            completed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// True iff the campaign ran to the end and every asset is verified
    #[must_use]
    pub fn all_verified(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(AssetOutcome::is_verified)
    }

    /// Outcomes that did not verify
    pub fn failed(&self) -> impl Iterator<Item = &AssetOutcome> {
        self.outcomes.iter().filter(|o| !o.is_verified())
    }

    /// Number of bytes pulled over the network in this campaign
    #[must_use]
    pub fn bytes_downloaded(&self) -> u64 {
        self.outcomes.iter().map(|o| o.bytes_downloaded).sum()
    }

    /// Local paths of every asset, or `CampaignIncomplete` naming the failures
    pub fn into_result(self) -> Result<Vec<PathBuf>> {
        if self.all_verified() {
            return Ok(self.outcomes.into_iter().map(|o| o.local_path).collect());
        }

        let mut failed: Vec<String> = self.failed().map(|o| o.source_url.clone()).collect();
        if self.cancelled && failed.is_empty() {
            failed.push("campaign cancelled".to_string());
        }
        Err(FetchError::CampaignIncomplete { failed })
    }
}
