//! Progress bar for download runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tile_downloader::RunStats;
use tracing::debug;

/// Whether to draw a progress bar on stderr.
pub(crate) fn should_show_progress(stderr_is_terminal: bool, quiet: bool) -> bool {
    let dumb = std::env::var("TERM").is_ok_and(|term| term == "dumb");
    stderr_is_terminal && !quiet && !dumb
}

/// Spawns the progress bar when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `show` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    show: bool,
    stats: Arc<RunStats>,
    total: usize,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !show {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_bar_inner(stats, total, Arc::clone(&stop));
    (Some(handle), stop)
}

/// Signals the progress task to stop and waits for it to clear the bar.
/// A task that panicked or was cancelled is logged, not propagated.
pub(crate) async fn finish_progress_ui(
    handle: Option<tokio::task::JoinHandle<()>>,
    stop: &AtomicBool,
) {
    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = handle
        && let Err(e) = handle.await
    {
        debug!(error = %e, "progress task ended abnormally");
    }
}

fn spawn_bar_inner(
    stats: Arc<RunStats>,
    total: usize,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} tiles {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        loop {
            let stopping = stop.load(Ordering::SeqCst);
            bar.set_position(stats.processed() as u64);
            bar.set_message(progress_message(&stats));
            if stopping {
                break;
            }
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        bar.finish_and_clear();
    })
}

fn progress_message(stats: &RunStats) -> String {
    let skipped = stats.skipped_existing() + stats.skipped_forbidden();
    format!(
        "({} new, {} skipped, {} failed)",
        stats.downloaded(),
        skipped,
        stats.failed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_downloader::{FetchOutcome, SkipReason};

    #[test]
    fn should_show_progress_requires_terminal_and_not_quiet() {
        assert!(!should_show_progress(false, false));
        assert!(!should_show_progress(true, true));
    }

    #[test]
    fn progress_message_sums_both_skip_kinds() {
        let stats = RunStats::new();
        stats.record(&FetchOutcome::Skipped(SkipReason::AlreadyExists));
        stats.record(&FetchOutcome::Skipped(SkipReason::Forbidden));
        stats.record(&FetchOutcome::Downloaded {
            bytes: 1,
            attempts: 1,
        });
        assert_eq!(progress_message(&stats), "(1 new, 2 skipped, 0 failed)");
    }

    #[tokio::test]
    async fn spawn_progress_ui_when_disabled_returns_none_handle_and_stop_already_true() {
        let (handle, stop) = spawn_progress_ui(false, Arc::new(RunStats::new()), 1);

        assert!(handle.is_none());
        assert!(
            stop.load(Ordering::SeqCst),
            "stop signal should be true when progress disabled"
        );
    }

    #[tokio::test]
    async fn spawn_progress_ui_when_enabled_returns_handle_and_stop_ends_task() {
        let (handle, stop) = spawn_progress_ui(true, Arc::new(RunStats::new()), 1);

        assert!(handle.is_some(), "handle should be Some when enabled");
        assert!(!stop.load(Ordering::SeqCst), "stop should be false initially");

        stop.store(true, Ordering::SeqCst);
        handle.unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn finish_progress_ui_sets_stop_and_joins_task() {
        let (handle, stop) = spawn_progress_ui(true, Arc::new(RunStats::new()), 1);

        finish_progress_ui(handle, &stop).await;

        assert!(stop.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn finish_progress_ui_tolerates_panicked_task() {
        let stop = AtomicBool::new(false);
        let handle = tokio::spawn(async { panic!("bar task failed") });

        finish_progress_ui(Some(handle), &stop).await;

        assert!(stop.load(Ordering::SeqCst));
    }
}
