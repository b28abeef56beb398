//! Tile Downloader Library
//!
//! Bulk-downloads map tiles covering a geographic bounding box across a range
//! of zoom levels, from any `{z}/{x}/{y}` tile server, into a local
//! `<output>/<z>/<x>/<y>.<ext>` tree. Runs are resumable: tiles already on
//! disk are skipped.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`coord`] - Latitude/longitude to Web Mercator tile indices
//! - [`plan`] - Expands a bounding box and zoom range into tile tasks
//! - [`download`] - Per-tile fetch protocol and the concurrent engine
//! - [`config`] - Run configuration, JSON loading and validation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coord;
pub mod download;
pub mod plan;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, DownloadConfig, DownloadSettings};
pub use coord::{BoundingBox, CoordError, TileId, ZoomRange, to_tile_xy};
pub use download::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DownloadEngine, EngineError, FetchError,
    FetchOutcome, HttpTileSource, RetryPolicy, RunStats, SkipReason, TileFetcher, TileSource,
    TileUrlTemplate,
};
pub use plan::{PlanError, StorageLayout, TilePlan, TileTask, ZoomSpan, plan};
