//! Bounded-concurrency dispatcher for tile downloads.
//!
//! [`DownloadEngine`] runs a [`TileFetcher`] over every planned [`TileTask`],
//! with at most `concurrency` fetches in flight. Each tile reaches a terminal
//! [`FetchOutcome`] on its own; the engine only counts them.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tile_downloader::coord::{BoundingBox, ZoomRange};
//! use tile_downloader::download::{
//!     DownloadEngine, HttpSettings, HttpTileSource, TileFetcher, TileUrlTemplate,
//! };
//! use tile_downloader::plan::{StorageLayout, TilePlan};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bbox = BoundingBox::new(24.0, 40.0, 44.0, 63.0)?;
//! let plan = TilePlan::build(&bbox, ZoomRange::new(6, 8)?, &StorageLayout::new("tiles"))?;
//! let source = Arc::new(HttpTileSource::new(&HttpSettings::default())?);
//! let fetcher = Arc::new(TileFetcher::new(source, TileUrlTemplate::default()));
//!
//! let engine = DownloadEngine::new(4)?;
//! let stats = engine.run_all(plan.into_tasks(), fetcher).await?;
//! println!("downloaded {}, failed {}", stats.downloaded(), stats.failed());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::fetcher::{FetchOutcome, SkipReason, TileFetcher};
use crate::plan::TileTask;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 64;

/// Default number of concurrent fetches.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Counters for one run.
///
/// Updated atomically by the spawned fetch tasks, so a progress display can
/// read them while the run is in flight.
#[derive(Debug, Default)]
pub struct RunStats {
    total: AtomicUsize,
    downloaded: AtomicUsize,
    skipped_existing: AtomicUsize,
    skipped_forbidden: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
    interrupted: AtomicBool,
}

impl RunStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tiles planned for the run.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn skipped_existing(&self) -> usize {
        self.skipped_existing.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn skipped_forbidden(&self) -> usize {
        self.skipped_forbidden.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Attempts beyond the first, summed over all tiles.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Tiles that reached a terminal outcome.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.downloaded() + self.skipped_existing() + self.skipped_forbidden() + self.failed()
    }

    /// Whether the run stopped claiming tiles before the end of the plan.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    fn add_total(&self, count: usize) {
        self.total.fetch_add(count, Ordering::SeqCst);
    }

    fn mark_interrupted(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Counts one terminal outcome.
    pub fn record(&self, outcome: &FetchOutcome) {
        let counter = match outcome {
            FetchOutcome::Downloaded { .. } => &self.downloaded,
            FetchOutcome::Skipped(SkipReason::AlreadyExists) => &self.skipped_existing,
            FetchOutcome::Skipped(SkipReason::Forbidden) => &self.skipped_forbidden,
            FetchOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        let retries = usize::try_from(outcome.retries()).unwrap_or(0);
        self.retried.fetch_add(retries, Ordering::SeqCst);
    }

    fn copy_from(other: &Self) -> Self {
        let stats = Self::new();
        for (dst, src) in [
            (&stats.total, &other.total),
            (&stats.downloaded, &other.downloaded),
            (&stats.skipped_existing, &other.skipped_existing),
            (&stats.skipped_forbidden, &other.skipped_forbidden),
            (&stats.failed, &other.failed),
            (&stats.retried, &other.retried),
        ] {
            dst.store(src.load(Ordering::SeqCst), Ordering::SeqCst);
        }
        stats
            .interrupted
            .store(other.was_interrupted(), Ordering::SeqCst);
        stats
    }
}

/// Runs tile fetches under a fixed concurrency limit.
///
/// # Concurrency Model
///
/// - Each tile runs in its own Tokio task
/// - A semaphore permit is acquired before spawning and held for the whole
///   fetch, retries and pacing included
/// - Permits are released automatically when the task ends (RAII)
/// - A failing or panicking tile never stops the others
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
}

impl DownloadEngine {
    /// Creates an engine allowing `concurrency` simultaneous fetches.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-64).
    ///
    /// # Example
    ///
    /// ```
    /// use tile_downloader::download::DownloadEngine;
    ///
    /// let engine = DownloadEngine::new(4).unwrap();
    /// assert_eq!(engine.concurrency(), 4);
    /// ```
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(concurrency, "creating download engine");

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches every task and returns the final counters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    /// Individual tile failures never cause an error; they are counted.
    pub async fn run_all(
        &self,
        tasks: Vec<TileTask>,
        fetcher: Arc<TileFetcher>,
    ) -> Result<RunStats, EngineError> {
        self.run_all_interruptible(tasks, fetcher, Arc::new(AtomicBool::new(false)))
            .await
    }

    /// Like [`run_all`](Self::run_all), but stops claiming new tiles once
    /// `interrupted` is set. In-flight fetches still complete.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    pub async fn run_all_interruptible(
        &self,
        tasks: Vec<TileTask>,
        fetcher: Arc<TileFetcher>,
        interrupted: Arc<AtomicBool>,
    ) -> Result<RunStats, EngineError> {
        let stats = Arc::new(RunStats::new());
        self.run_with_stats(tasks, fetcher, Arc::clone(&stats), interrupted)
            .await?;

        // All spawned tasks have been awaited, so this is normally the only
        // reference left.
        Ok(Arc::try_unwrap(stats).unwrap_or_else(|shared| RunStats::copy_from(&shared)))
    }

    /// Runs the tasks, recording into caller-owned `stats`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(skip_all, fields(tasks = tasks.len(), concurrency = self.concurrency))]
    pub async fn run_with_stats(
        &self,
        tasks: Vec<TileTask>,
        fetcher: Arc<TileFetcher>,
        stats: Arc<RunStats>,
        interrupted: Arc<AtomicBool>,
    ) -> Result<(), EngineError> {
        stats.add_total(tasks.len());
        let mut handles = Vec::with_capacity(tasks.len());

        info!("starting tile downloads");

        for task in tasks {
            if interrupted.load(Ordering::SeqCst) {
                stats.mark_interrupted();
                break;
            }

            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            // The wait for a permit may have spanned the interrupt
            if interrupted.load(Ordering::SeqCst) {
                stats.mark_interrupted();
                break;
            }

            let fetcher = Arc::clone(&fetcher);
            let stats = Arc::clone(&stats);

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let outcome = fetcher.fetch(&task).await;
                stats.record(&outcome);
            }));
        }

        if stats.was_interrupted() {
            warn!(
                claimed = handles.len(),
                total = stats.total(),
                "interrupted, waiting for in-flight tiles"
            );
        }
        debug!(task_count = handles.len(), "waiting for tile tasks to complete");

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "tile task panicked");
            }
        }

        info!(
            downloaded = stats.downloaded(),
            skipped_existing = stats.skipped_existing(),
            skipped_forbidden = stats.skipped_forbidden(),
            failed = stats.failed(),
            retried = stats.retried(),
            total = stats.total(),
            "tile downloads complete"
        );
        Ok(())
    }
}
