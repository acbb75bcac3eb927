use crate::assets::descriptor::AssetDescriptor;
use crate::assets::local::{AssetState, LocalAsset};
use crate::assets::registry::ModelFamily;
use crate::config::schema::Config;
use crate::error::{FetchError, Result};
use crate::fetch::cancel::CancelHandle;
use crate::fetch::checksum::{checksum_matches, sha256_file};
use crate::fetch::disk::ensure_free_space;
use crate::fetch::progress::{format_bytes, ObserverId, ProgressObserver, ProgressObservers};
use crate::fetch::report::{AssetOutcome, FetchReport};
use crate::fetch::session::DownloadSession;
use crate::fetch::transport::{HttpTransport, Transport};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A registered asset together with its resolved local state
#[derive(Debug, Clone)]
pub struct ManagedFile {
    descriptor: AssetDescriptor,
    local: LocalAsset,
}

impl ManagedFile {
    #[must_use]
    pub const fn descriptor(&self) -> &AssetDescriptor {
        &self.descriptor
    }

    /// Resolved path under the cache root
    #[must_use]
    pub fn local_file(&self) -> &Path {
        self.local.local_path()
    }

    #[must_use]
    pub const fn state(&self) -> AssetState {
        self.local.state()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.local.failure()
    }
}

/// Orchestrates download campaigns over a set of declared assets
///
/// Assets are processed one at a time in insertion order; a failure only
/// marks the affected asset `Invalid`. The manager is not internally
/// synchronized: share it across tasks only behind external serialization.
pub struct FetchManager {
    cache_root: PathBuf,
    transport: Arc<dyn Transport>,
    observers: ProgressObservers,
    cancel: CancelHandle,
    min_free_bytes: u64,
    files: Vec<ManagedFile>,
}

impl std::fmt::Debug for FetchManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchManager")
            .field("cache_root", &self.cache_root)
            .field("transport", &self.transport.transport_name())
            .field("observers", &self.observers)
            .field("min_free_bytes", &self.min_free_bytes)
            .field("files", &self.files)
            .finish()
    }
}

impl FetchManager {
    /// Create an empty manager downloading through `transport`
    pub fn new(cache_root: impl Into<PathBuf>, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache_root: cache_root.into(),
            transport,
            observers: ProgressObservers::new(),
            cancel: CancelHandle::new(),
            min_free_bytes: 0,
            files: Vec::new(),
        }
    }

    /// Create an HTTP-backed manager from config
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.network)?;
        Ok(Self::new(config.cache_root()?, Arc::new(transport))
            .with_min_free_bytes(config.min_free_bytes()))
    }

    /// Create a manager preloaded with a built-in model family
    pub fn for_model(config: &Config, family: &ModelFamily) -> Result<Self> {
        let mut manager = Self::from_config(config)?;
        manager.add_files(family.descriptors())?;
        Ok(manager)
    }

    /// Free-space headroom required beyond each download's size
    #[must_use]
    pub const fn with_min_free_bytes(mut self, bytes: u64) -> Self {
        self.min_free_bytes = bytes;
        self
    }

    #[must_use]
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Register an asset; no I/O happens until `download()`
    pub fn add_file(&mut self, descriptor: AssetDescriptor) -> Result<()> {
        descriptor.validate()?;
        let local_path = descriptor.local_path(&self.cache_root)?;

        if let Some(existing) = self.files.iter().find(|f| f.local_file() == local_path) {
            if existing.descriptor == descriptor {
                tracing::debug!("{} already registered", descriptor.source_url());
                return Ok(());
            }
            return Err(FetchError::InvalidArgument(format!(
                "{} and {} both resolve to {}",
                existing.descriptor.source_url(),
                descriptor.source_url(),
                local_path.display()
            )));
        }

        self.files.push(ManagedFile {
            descriptor,
            local: LocalAsset::new(local_path),
        });
        Ok(())
    }

    /// Register several assets, stopping at the first invalid one
    pub fn add_files(&mut self, descriptors: impl IntoIterator<Item = AssetDescriptor>) -> Result<()> {
        for descriptor in descriptors {
            self.add_file(descriptor)?;
        }
        Ok(())
    }

    /// Drop every registered asset and its state
    pub fn clear(&mut self) {
        self.files.clear();
    }

    #[must_use]
    pub fn files(&self) -> &[ManagedFile] {
        &self.files
    }

    /// True iff every registered asset is verified (vacuously true when empty)
    #[must_use]
    pub fn all_files_downloaded(&self) -> bool {
        self.files.iter().all(|f| f.state() == AssetState::Verified)
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ProgressObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Handle that cancels the campaign in flight
    ///
    /// A cancel issued while no campaign is running is discarded when the
    /// next `download()` starts.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run one campaign over every registered asset
    pub async fn download(&mut self) -> FetchReport {
        tracing::info!(
            "Fetching {} asset(s) into {}",
            self.files.len(),
            self.cache_root.display()
        );

        self.cancel.reset();
        let mut outcomes = Vec::with_capacity(self.files.len());
        let mut cancelled = false;

        for index in 0..self.files.len() {
            if cancelled || self.cancel.is_cancelled() {
                cancelled = true;
                outcomes.push(self.outcome(index, false, 0));
                continue;
            }

            let (outcome, interrupted) = self.fetch_one(index).await;
            cancelled |= interrupted;
            self.observers.notify_finished(&outcome);
            outcomes.push(outcome);
        }

        self.cancel.reset();
        let report = FetchReport::new(outcomes, cancelled);

        if report.all_verified() {
            tracing::info!(
                "All {} asset(s) verified ({} downloaded)",
                report.outcomes.len(),
                format_bytes(report.bytes_downloaded())
            );
        } else {
            tracing::warn!(
                "Campaign incomplete: {} of {} asset(s) not verified{}",
                report.failed().count(),
                report.outcomes.len(),
                if cancelled { " (cancelled)" } else { "" }
            );
        }

        report
    }

    /// Re-derive every asset's state from disk without network I/O
    ///
    /// Read-only: a mismatching file is reported `Invalid` but left in place.
    pub async fn refresh(&mut self) {
        for index in 0..self.files.len() {
            let state = self.inspect_local(index).await;
            let file = &mut self.files[index];
            match state {
                Ok(Some(AssetState::Invalid)) => file.local.mark_invalid("checksum mismatch"),
                Ok(Some(state)) => file.local.mark(state),
                Ok(None) => file.local.mark(AssetState::NotPresent),
                Err(e) => {
                    tracing::warn!("Could not inspect {}: {e}", file.local_file().display());
                    file.local.mark_invalid(e.to_string());
                }
            }
        }
    }

    /// Bring one asset to a terminal state; the flag reports a mid-stream cancel
    async fn fetch_one(&mut self, index: usize) -> (AssetOutcome, bool) {
        let file = &self.files[index];
        if file.state() == AssetState::Verified && file.local_file().is_file() {
            tracing::debug!("{} already verified", file.local_file().display());
            return (self.outcome(index, true, 0), false);
        }

        match self.inspect_local(index).await {
            Ok(Some(AssetState::Verified)) => {
                tracing::debug!("Cache hit: {}", self.files[index].local_file().display());
                self.files[index].local.mark(AssetState::Verified);
                return (self.outcome(index, true, 0), false);
            }
            Ok(Some(_)) => {
                if let Err(e) = self.remove_stale(index).await {
                    let file = &mut self.files[index];
                    tracing::warn!("Failed to fetch {}: {e}", file.descriptor.source_url());
                    file.local.mark_invalid(e.to_string());
                    return (self.outcome(index, false, 0), false);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "Could not inspect {}: {e}",
                    self.files[index].local_file().display()
                );
            }
        }

        self.files[index].local.mark(AssetState::Downloading);
        match self.download_one(index).await {
            Ok(bytes) => {
                let file = &mut self.files[index];
                file.local.mark(AssetState::Verified);
                tracing::info!(
                    "Downloaded {} ({})",
                    file.local_file().display(),
                    format_bytes(bytes)
                );
                (self.outcome(index, false, bytes), false)
            }
            Err(e) => {
                let file = &mut self.files[index];
                if e.is_recoverable() {
                    tracing::warn!("Failed to fetch {}: {e}", file.descriptor.source_url());
                } else {
                    tracing::error!("Failed to fetch {}: {e}", file.descriptor.source_url());
                }
                file.local.mark_invalid(e.to_string());
                let interrupted = matches!(e, FetchError::Cancelled);
                (self.outcome(index, false, 0), interrupted)
            }
        }
    }

    /// `Some(Verified)` for a usable local file, `Some(Invalid)` for one whose
    /// checksum does not match, `None` when nothing is on disk
    async fn inspect_local(&self, index: usize) -> Result<Option<AssetState>> {
        let file = &self.files[index];
        let path = file.local_file();
        if !path.is_file() {
            return Ok(None);
        }

        let Some(expected) = file.descriptor.expected_checksum() else {
            return Ok(Some(AssetState::Verified));
        };

        let actual = sha256_file(path).await?;
        if checksum_matches(expected, &actual) {
            return Ok(Some(AssetState::Verified));
        }

        tracing::debug!(
            "{}: checksum {actual} does not match {expected}",
            path.display()
        );
        Ok(Some(AssetState::Invalid))
    }

    /// Delete a mismatching local file ahead of re-downloading it
    async fn remove_stale(&self, index: usize) -> Result<()> {
        let path = self.files[index].local_file();
        tracing::warn!("Removing {}: checksum mismatch", path.display());
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn download_one(&self, index: usize) -> Result<u64> {
        let file = &self.files[index];
        let url = file.descriptor.source_url();
        let destination = file.local_file();

        tracing::info!("Downloading {url}");
        let response = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(FetchError::Cancelled),
            response = self.transport.get(url) => response?,
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
            if let Some(length) = response.content_length {
                ensure_free_space(parent, length, self.min_free_bytes)?;
            }
        }

        let session = DownloadSession::new(index, &file.descriptor, response.content_length)?;
        session
            .run(response.body, destination, &self.observers, &self.cancel)
            .await
    }

    fn outcome(&self, index: usize, from_cache: bool, bytes_downloaded: u64) -> AssetOutcome {
        let file = &self.files[index];
        AssetOutcome {
            asset_index: index,
            source_url: file.descriptor.source_url().to_string(),
            local_path: file.local_file().to_path_buf(),
            state: file.state(),
            from_cache,
            bytes_downloaded,
            error: file.failure().map(ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::transport::TransportResponse;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct UnreachableTransport;

    #[async_trait]
    impl Transport for UnreachableTransport {
        async fn get(&self, url: &str) -> Result<TransportResponse> {
            Err(FetchError::Network(format!("{url} unreachable")))
        }

        fn transport_name(&self) -> &str {
            "unreachable"
        }
    }

    fn manager(root: &Path) -> FetchManager {
        FetchManager::new(root, Arc::new(UnreachableTransport))
    }

    #[test]
    fn test_add_file_resolves_path() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager(temp_dir.path());

        manager
            .add_file(AssetDescriptor::new("https://host/model.zip", "Resnet"))
            .unwrap();

        assert_eq!(manager.files().len(), 1);
        assert_eq!(
            manager.files()[0].local_file(),
            temp_dir.path().join("Resnet").join("model.zip")
        );
        assert_eq!(manager.files()[0].state(), AssetState::NotPresent);
        assert!(!manager.all_files_downloaded());
    }

    #[test]
    fn test_add_file_rejects_empty_url() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager(temp_dir.path());

        let result = manager.add_file(AssetDescriptor::new("", "Resnet"));
        assert!(matches!(result, Err(FetchError::InvalidArgument(_))));
        assert!(manager.files().is_empty());
    }

    #[test]
    fn test_add_file_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager(temp_dir.path());
        let descriptor = AssetDescriptor::new("https://host/model.zip", "Resnet");

        manager.add_file(descriptor.clone()).unwrap();
        manager.add_file(descriptor).unwrap();
        assert_eq!(manager.files().len(), 1);

        let clash = AssetDescriptor::new("https://mirror/model.zip", "Resnet");
        assert!(matches!(
            manager.add_file(clash),
            Err(FetchError::InvalidArgument(_))
        ));

        let other_family = AssetDescriptor::new("https://mirror/model.zip", "Inception");
        manager.add_file(other_family).unwrap();
        assert_eq!(manager.files().len(), 2);
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager(temp_dir.path());
        manager
            .add_file(AssetDescriptor::new("https://host/model.zip", "Resnet"))
            .unwrap();

        manager.clear();
        assert!(manager.files().is_empty());
        assert!(manager.all_files_downloaded());
    }

    #[tokio::test]
    async fn test_existing_file_without_checksum_is_verified() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("Resnet");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("labels.txt"), "cat\ndog\n").unwrap();

        let mut manager = manager(temp_dir.path());
        manager
            .add_file(AssetDescriptor::new("https://host/labels.txt", "Resnet"))
            .unwrap();

        let report = manager.download().await;
        assert!(report.all_verified());
        assert!(report.outcomes[0].from_cache);
        assert!(manager.all_files_downloaded());
    }

    #[tokio::test]
    async fn test_unreachable_asset_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = manager(temp_dir.path());
        manager
            .add_file(AssetDescriptor::new("https://host/model.zip", "Resnet"))
            .unwrap();

        let report = manager.download().await;
        assert!(!report.all_verified());
        assert_eq!(manager.files()[0].state(), AssetState::Invalid);
        assert!(manager.files()[0]
            .failure()
            .unwrap()
            .contains("unreachable"));
    }

    #[tokio::test]
    async fn test_refresh_detects_removed_file() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("Resnet");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("labels.txt"), "cat\n").unwrap();

        let mut manager = manager(temp_dir.path());
        manager
            .add_file(AssetDescriptor::new("https://host/labels.txt", "Resnet"))
            .unwrap();

        manager.refresh().await;
        assert!(manager.all_files_downloaded());

        std::fs::remove_file(folder.join("labels.txt")).unwrap();
        manager.refresh().await;
        assert_eq!(manager.files()[0].state(), AssetState::NotPresent);
    }

    #[tokio::test]
    async fn test_refresh_keeps_mismatching_file() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("Resnet");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("model.zip"), b"weights").unwrap();

        let mut manager = manager(temp_dir.path());
        manager
            .add_file(
                AssetDescriptor::new("https://host/model.zip", "Resnet")
                    .with_checksum("0".repeat(64)),
            )
            .unwrap();

        manager.refresh().await;

        assert_eq!(manager.files()[0].state(), AssetState::Invalid);
        assert_eq!(manager.files()[0].failure(), Some("checksum mismatch"));
        assert_eq!(std::fs::read(folder.join("model.zip")).unwrap(), b"weights");
    }

    #[tokio::test]
    async fn test_refresh_inspects_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("Resnet");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("model.zip"), b"weights").unwrap();
        std::fs::write(folder.join("labels.txt"), b"cat\n").unwrap();

        let mut manager = manager(temp_dir.path());
        manager
            .add_files([
                AssetDescriptor::new("https://host/model.zip", "Resnet")
                    .with_checksum("0".repeat(64)),
                AssetDescriptor::new("https://host/labels.txt", "Resnet"),
            ])
            .unwrap();

        manager.refresh().await;

        assert_eq!(manager.files()[0].state(), AssetState::Invalid);
        assert_eq!(manager.files()[1].state(), AssetState::Verified);
    }
}
