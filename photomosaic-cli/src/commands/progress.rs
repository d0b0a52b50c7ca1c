//! Progress bar helpers for long-running jobs.
//!
//! The scheduler exposes progress by polling snapshots; these helpers poll
//! at a fixed interval and mirror the percentage into an indicatif bar.

use indicatif::{ProgressBar, ProgressStyle};
use photomosaic::jobs::{JobHandle, JobSnapshot, MaterialHandle};
use photomosaic::material::MaterialSnapshot;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Creates a 0-100% progress bar with a fixed label.
pub fn percent_bar(message: &str) -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:>12} [{bar:40.cyan/blue}] {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    bar.set_message(message.to_string());
    bar
}

/// Polls a material ingest to completion, updating the bar.
pub async fn track_material(handle: &MaterialHandle, bar: &ProgressBar) -> MaterialSnapshot {
    loop {
        let snap = handle.snapshot();
        bar.set_position(u64::from(snap.progress));
        if snap.status.is_terminal() {
            bar.finish_with_message(format!("{}", snap.status));
            return snap;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Polls a mosaic job to completion, updating the bar.
pub async fn track_job(handle: &JobHandle, bar: &ProgressBar) -> JobSnapshot {
    loop {
        let snap = handle.snapshot();
        bar.set_position(u64::from(snap.progress));
        if snap.status.is_terminal() {
            bar.finish_with_message(format!("{}", snap.status));
            return snap;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
