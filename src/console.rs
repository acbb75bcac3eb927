use crate::fetch::progress::{ProgressEvent, ProgressObserver};
use crate::fetch::report::AssetOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

const BAR_TEMPLATE: &str =
    "{msg:30!} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg:30!} {bytes} ({bytes_per_sec})";

/// Terminal progress bars, one per downloaded asset
#[derive(Default)]
pub struct TerminalProgress {
    current: Mutex<Option<(usize, ProgressBar)>>,
}

impl TerminalProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bar_for(event: &ProgressEvent) -> ProgressBar {
        let bar = match event.total_bytes_to_receive {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
                    bar.set_style(style);
                }
                bar
            }
        };
        bar.set_message(event.file_name.clone());
        bar
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        let stale = !matches!(&*current, Some((index, _)) if *index == event.asset_index);
        if stale {
            if let Some((_, bar)) = current.take() {
                bar.finish_and_clear();
            }
            *current = Some((event.asset_index, Self::bar_for(event)));
        }

        if let Some((_, bar)) = current.as_ref() {
            bar.set_position(event.bytes_received);
        }
    }

    fn on_asset_finished(&self, outcome: &AssetOutcome) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        if let Some((index, bar)) = current.take() {
            if index == outcome.asset_index {
                bar.finish_and_clear();
            } else {
                *current = Some((index, bar));
            }
        }

        let name = outcome
            .local_path
            .file_name()
            .map_or_else(|| outcome.source_url.clone(), |n| n.to_string_lossy().into_owned());

        match (&outcome.error, outcome.from_cache) {
            (Some(error), _) => eprintln!("✗ {name}: {}", first_line(error)),
            (None, true) => println!("✓ {name} (cached)"),
            (None, false) => println!("✓ {name}"),
        }
    }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message)
}
