//! Retry policy for tile fetches.
//!
//! Every failed attempt is classified into a [`FailureType`]:
//! - [`FailureType::Forbidden`] - HTTP 403, a policy rejection; never retried
//! - [`FailureType::Transient`] - everything else (timeouts, connection errors,
//!   other HTTP statuses, local write errors); retried until the budget is spent
//!
//! The [`RetryPolicy`] then decides, from the failure type and attempt number,
//! whether to try again and how long to wait first. The wait is a fixed backoff.
//!
//! # Example
//!
//! ```
//! use tile_downloader::download::{FetchError, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = FetchError::http_status("https://tile.example.com/6/39/24.png", 503);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::debug;

use super::FetchError;
use super::constants::DEFAULT_RETRY_BACKOFF;

/// Default maximum attempts per tile (including the first).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Status a tile server uses to refuse a request on policy grounds.
const FORBIDDEN_STATUS: u16 = 403;

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// May succeed on another attempt.
    Transient,

    /// Server refused the tile (HTTP 403). Retrying would not help.
    Forbidden,
}

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Stop trying.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Fixed-backoff retry budget.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `backoff`: 1 second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Wait between a failed attempt and the next one.
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is raised to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    ///
    /// The fetcher still waits [`backoff`](Self::backoff) after the final
    /// attempt before reporting the tile as failed.
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Forbidden {
            return RetryDecision::DoNotRetry {
                reason: "forbidden - server refused the tile".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.backoff,
            attempt: attempt + 1,
        }
    }
}

/// Classifies a fetch error for retry decisions.
///
/// Only a received 403 response is [`FailureType::Forbidden`]. Every other
/// failure, including 404 and local IO errors, is [`FailureType::Transient`].
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error.status() {
        Some(FORBIDDEN_STATUS) => FailureType::Forbidden,
        _ => FailureType::Transient,
    }
}
