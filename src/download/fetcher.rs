//! Fetch-or-skip-or-retry protocol for a single tile.
//!
//! ```text
//! CheckExisting ──file present──▶ Skipped(AlreadyExists)
//!       │
//!       ▼
//!   Attempting ──2xx──▶ write file, pace ──▶ Downloaded
//!       │  ▲     └─403─▶ Skipped(Forbidden)
//!  other│  │backoff
//!       ▼  │
//!   Retrying ──budget spent──▶ Failed
//! ```
//!
//! Every path ends in a [`FetchOutcome`]; nothing is propagated to the caller
//! as an error, so one bad tile never stops a batch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use super::client::TileSource;
use super::constants::{DEFAULT_SUCCESS_PACE, PARTIAL_SUFFIX};
use super::error::FetchError;
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use super::url_template::TileUrlTemplate;
use crate::plan::TileTask;

/// Why a tile was not fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The target file was already on disk.
    AlreadyExists,
    /// The server answered 403.
    Forbidden,
}

/// Terminal result of fetching one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Tile written to disk.
    Downloaded {
        /// Size of the stored file.
        bytes: u64,
        /// Network attempts made, including the successful one.
        attempts: u32,
    },
    /// No download was needed or allowed.
    Skipped(SkipReason),
    /// Every attempt failed.
    Failed {
        /// Network attempts made.
        attempts: u32,
        /// Display form of the last error.
        error: String,
    },
}

impl FetchOutcome {
    /// Number of network attempts this outcome took.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Downloaded { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
            Self::Skipped(SkipReason::AlreadyExists) => 0,
            Self::Skipped(SkipReason::Forbidden) => 1,
        }
    }

    /// Attempts beyond the first.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.attempts().saturating_sub(1)
    }
}

/// Fetches tiles from a [`TileSource`] into their planned paths.
///
/// Cheap to share behind an `Arc`; holds no per-tile state.
pub struct TileFetcher {
    source: Arc<dyn TileSource>,
    template: TileUrlTemplate,
    retry_policy: RetryPolicy,
    success_pace: Duration,
}

impl std::fmt::Debug for TileFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileFetcher")
            .field("template", &self.template)
            .field("retry_policy", &self.retry_policy)
            .field("success_pace", &self.success_pace)
            .finish_non_exhaustive()
    }
}

impl TileFetcher {
    /// Creates a fetcher with the default retry policy and pacing.
    #[must_use]
    pub fn new(source: Arc<dyn TileSource>, template: TileUrlTemplate) -> Self {
        Self {
            source,
            template,
            retry_policy: RetryPolicy::default(),
            success_pace: DEFAULT_SUCCESS_PACE,
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Sets the pause taken after each successful download.
    #[must_use]
    pub fn with_success_pace(mut self, success_pace: Duration) -> Self {
        self.success_pace = success_pace;
        self
    }

    /// Runs the protocol for `task` to a terminal outcome.
    #[instrument(skip(self, task), fields(tile = %task.tile()))]
    pub async fn fetch(&self, task: &TileTask) -> FetchOutcome {
        let tile = task.tile();

        if tile_exists(task.path()).await {
            info!(%tile, "tile already downloaded, skipping");
            return FetchOutcome::Skipped(SkipReason::AlreadyExists);
        }

        let url = self.template.render(&tile);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, url = %url, "fetching tile");

            let error = match self.attempt(&url, task.path()).await {
                Ok(bytes) => {
                    info!(%tile, bytes, attempt, "downloaded tile");
                    if !self.success_pace.is_zero() {
                        tokio::time::sleep(self.success_pace).await;
                    }
                    return FetchOutcome::Downloaded {
                        bytes,
                        attempts: attempt,
                    };
                }
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            match self.retry_policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        %tile,
                        attempt,
                        next_attempt,
                        max_attempts = self.retry_policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "tile fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    if failure_type == FailureType::Forbidden {
                        warn!(%tile, url = %url, "access forbidden, skipping tile");
                        return FetchOutcome::Skipped(SkipReason::Forbidden);
                    }
                    // The backoff follows every failed attempt, the last one included
                    let backoff = self.retry_policy.backoff();
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                    error!(
                        %tile,
                        attempts = attempt,
                        error = %error,
                        %reason,
                        "failed to download tile"
                    );
                    return FetchOutcome::Failed {
                        attempts: attempt,
                        error: error.to_string(),
                    };
                }
            }
        }
    }

    /// One network attempt plus the write. Returns bytes stored.
    async fn attempt(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        let body = self.source.fetch(url).await?;
        store_tile(path, &body).await?;
        Ok(body.len() as u64)
    }
}

async fn tile_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Writes `body` to a sibling `.part` file and renames it over `path`, so the
/// target only ever appears complete.
async fn store_tile(path: &Path, body: &[u8]) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::io(parent, e))?;
    }

    let partial = partial_path(path);
    if let Err(e) = tokio::fs::write(&partial, body).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(FetchError::io(partial, e));
    }
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(FetchError::io(path, e));
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
