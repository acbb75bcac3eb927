use crate::assets::descriptor::AssetDescriptor;
use crate::error::{FetchError, Result};
use crate::fetch::cancel::CancelHandle;
use crate::fetch::checksum::{checksum_matches, StreamHasher};
use crate::fetch::progress::{ProgressEvent, ProgressObservers};
use crate::fetch::transport::ChunkStream;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// One in-flight download of a single asset
///
/// Bytes go to a hidden `.<name>.part` file next to the destination and are
/// hashed as they arrive. The destination path is only ever produced by
/// renaming a fully received, verified temporary file.
#[derive(Debug)]
pub struct DownloadSession<'a> {
    asset_index: usize,
    descriptor: &'a AssetDescriptor,
    file_name: String,
    bytes_received: u64,
    total_bytes: Option<u64>,
}

impl<'a> DownloadSession<'a> {
    pub fn new(
        asset_index: usize,
        descriptor: &'a AssetDescriptor,
        total_bytes: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            asset_index,
            descriptor,
            file_name: descriptor.file_name()?,
            bytes_received: 0,
            total_bytes,
        })
    }

    /// Percentage complete, `None` when the total is unknown
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percentage(&self) -> Option<f64> {
        match self.total_bytes {
            None => None,
            Some(0) => Some(100.0),
            Some(total) => Some((self.bytes_received as f64 / total as f64 * 100.0).min(100.0)),
        }
    }

    fn event(&self) -> ProgressEvent {
        ProgressEvent {
            asset_index: self.asset_index,
            source_url: self.descriptor.source_url().to_string(),
            file_name: self.file_name.clone(),
            total_bytes_to_receive: self.total_bytes,
            bytes_received: self.bytes_received,
            progress_percentage: self.progress_percentage(),
        }
    }

    /// Stream `body` into `destination`, returning the number of bytes received
    pub async fn run(
        mut self,
        mut body: ChunkStream,
        destination: &Path,
        observers: &ProgressObservers,
        cancel: &CancelHandle,
    ) -> Result<u64> {
        let part_path = partial_path(destination, &self.file_name);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let guard = PartialGuard::new(part_path.clone());
        let mut file = tokio::fs::File::create(&part_path).await?;
        let mut hasher = StreamHasher::new();

        observers.notify_progress(&self.event());

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(FetchError::Cancelled),
                next = body.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };

            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }

            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            self.bytes_received += chunk.len() as u64;

            observers.notify_progress(&self.event());
        }

        // Ensure file is flushed to disk before it can be trusted
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Some(total) = self.total_bytes {
            if self.bytes_received != total {
                return Err(FetchError::Network(format!(
                    "transfer ended after {} of {total} bytes",
                    self.bytes_received
                )));
            }
        }

        let actual = hasher.finish();
        if let Some(expected) = self.descriptor.expected_checksum() {
            if !checksum_matches(expected, &actual) {
                return Err(FetchError::Integrity {
                    expected: expected.trim().to_ascii_lowercase(),
                    actual,
                });
            }
        }

        tokio::fs::rename(&part_path, destination).await?;
        guard.disarm();
        sync_parent_dir(destination);

        Ok(self.bytes_received)
    }
}

/// Temporary download location for a destination
#[must_use]
pub fn partial_path(destination: &Path, file_name: &str) -> PathBuf {
    destination.with_file_name(format!(".{file_name}.part"))
}

/// Removes the temporary file on every exit path that did not persist it,
/// including when the owning future is dropped mid-transfer.
struct PartialGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialGuard {
    const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove partial download {}: {e}",
                    self.path.display()
                );
            }
        }
    }
}

/// Best effort; opening a directory fails on some platforms
fn sync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = std::fs::File::open(parent) {
            dir.sync_all().ok();
        }
    }
}
