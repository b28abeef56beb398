//! Constants for the download module (timeouts, pacing, backoff).

use std::time::Duration;

/// Per-request timeout for tile fetches (10 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Courtesy pause after each successfully written tile (200 ms).
pub const DEFAULT_SUCCESS_PACE: Duration = Duration::from_millis(200);

/// Fixed wait before retrying a failed attempt (1 second).
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Suffix of the temporary file a tile is written to before being renamed.
pub const PARTIAL_SUFFIX: &str = "part";
