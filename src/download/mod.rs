//! Tile fetching and the concurrent download engine.
//!
//! # Features
//!
//! - Skip-if-present checks, so interrupted runs resume where they stopped
//! - Fixed-backoff retries; HTTP 403 is skipped and never retried
//! - Atomic writes through a `.part` sibling file
//! - Courtesy pacing after each successful download
//! - Bounded concurrency (4 in-flight fetches by default)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tile_downloader::coord::TileId;
//! use tile_downloader::download::{HttpSettings, HttpTileSource, TileFetcher, TileUrlTemplate};
//! use tile_downloader::plan::{StorageLayout, TileTask};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(HttpTileSource::new(&HttpSettings::default())?);
//! let fetcher = TileFetcher::new(source, TileUrlTemplate::default());
//! let task = TileTask::new(TileId::new(6, 39, 24), &StorageLayout::new("tiles"));
//! println!("{:?}", fetcher.fetch(&task).await);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod fetcher;
mod retry;
mod url_template;

pub use client::{ClientError, HttpSettings, HttpTileSource, TileSource};
pub use constants::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_BACKOFF, DEFAULT_SUCCESS_PACE};
pub use engine::{DEFAULT_CONCURRENCY, DownloadEngine, EngineError, RunStats};
pub use error::FetchError;
pub use fetcher::{FetchOutcome, SkipReason, TileFetcher};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
pub use url_template::{DEFAULT_TILE_URL_TEMPLATE, TemplateError, TileUrlTemplate};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, FetchError>` explicitly in function signatures.
