use crate::fetch::report::AssetOutcome;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One progress notification, emitted per received chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Position of the asset in the campaign
    pub asset_index: usize,
    pub source_url: String,
    pub file_name: String,
    /// `None` when the server did not report a length
    pub total_bytes_to_receive: Option<u64>,
    pub bytes_received: u64,
    /// `None` whenever `total_bytes_to_receive` is unknown
    pub progress_percentage: Option<f64>,
}

/// Receives campaign notifications
///
/// Called synchronously from the fetch engine; implementations must return
/// promptly and never block.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);

    /// Called once per asset when it reaches a terminal state
    fn on_asset_finished(&self, _outcome: &AssetOutcome) {}
}

/// Handle returned by [`ProgressObservers::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers of one manager
#[derive(Default)]
pub struct ProgressObservers {
    next_id: u64,
    observers: Vec<(ObserverId, Arc<dyn ProgressObserver>)>,
}

impl ProgressObservers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ProgressObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn notify_progress(&self, event: &ProgressEvent) {
        for (_, observer) in &self.observers {
            observer.on_progress(event);
        }
    }

    pub(crate) fn notify_finished(&self, outcome: &AssetOutcome) {
        for (_, observer) in &self.observers {
            observer.on_asset_finished(outcome);
        }
    }
}

impl std::fmt::Debug for ProgressObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressObservers")
            .field("count", &self.observers.len())
            .finish()
    }
}

/// Observer wrapping a progress closure
pub struct CallbackObserver<F>(pub F);

impl<F> ProgressObserver for CallbackObserver<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        (self.0)(event);
    }
}

/// Notifications forwarded over a channel
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Progress(ProgressEvent),
    Finished(AssetOutcome),
}

/// Observer forwarding every notification to an unbounded channel
///
/// Sending never waits; events for a dropped receiver are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<FetchEvent>,
}

impl ChannelObserver {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FetchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        self.tx.send(FetchEvent::Progress(event.clone())).ok();
    }

    fn on_asset_finished(&self, outcome: &AssetOutcome) {
        self.tx.send(FetchEvent::Finished(outcome.clone())).ok();
    }
}

/// Format bytes as human-readable string
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
