//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use tile_downloader::{ConfigError, DownloadConfig};

/// Bulk-download map tiles for a bounding box and zoom range.
///
/// Tiles are stored as <output>/<z>/<x>/<y>.<ext>; tiles already on disk are
/// skipped, so an interrupted run can simply be started again. Values come
/// from built-in defaults, then --config, then the flags below.
#[derive(Parser, Debug)]
#[command(name = "tile-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// JSON config file; flags override its values
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the tile plan and exit without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Southern edge of the bounding box (degrees)
    #[arg(long, allow_negative_numbers = true)]
    pub min_lat: Option<f64>,

    /// Northern edge of the bounding box (degrees)
    #[arg(long, allow_negative_numbers = true)]
    pub max_lat: Option<f64>,

    /// Western edge of the bounding box (degrees)
    #[arg(long, allow_negative_numbers = true)]
    pub min_lon: Option<f64>,

    /// Eastern edge of the bounding box (degrees)
    #[arg(long, allow_negative_numbers = true)]
    pub max_lon: Option<f64>,

    /// Lowest zoom level to download
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=30))]
    pub min_zoom: Option<u8>,

    /// Highest zoom level to download
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=30))]
    pub max_zoom: Option<u8>,

    /// Tile URL with {z}, {x} and {y} placeholders
    #[arg(short = 'u', long, value_name = "TEMPLATE")]
    pub url_template: Option<String>,

    /// User-Agent sent with every request (include contact details)
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Root directory for downloaded tiles
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File extension for stored tiles
    #[arg(long)]
    pub extension: Option<String>,

    /// Maximum concurrent downloads (1-64)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub concurrency: Option<u8>,

    /// Attempts per tile, including the first (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: Option<u8>,

    /// Pause after each downloaded tile in milliseconds (max 60000)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub pace_ms: Option<u64>,

    /// Wait before retrying a failed tile in milliseconds (max 60000)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub backoff_ms: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,
}

impl Args {
    /// Overrides `config` with every flag that was given.
    pub fn apply_to(&self, config: &mut DownloadConfig) -> Result<(), ConfigError> {
        if let Some(v) = self.min_lat {
            config.bbox.min_lat = v;
        }
        if let Some(v) = self.max_lat {
            config.bbox.max_lat = v;
        }
        if let Some(v) = self.min_lon {
            config.bbox.min_lon = v;
        }
        if let Some(v) = self.max_lon {
            config.bbox.max_lon = v;
        }
        if let Some(v) = self.min_zoom {
            config.min_zoom = v;
        }
        if let Some(v) = self.max_zoom {
            config.max_zoom = v;
        }
        if let Some(template) = &self.url_template {
            config.tile_url_template.clone_from(template);
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = Some(user_agent.clone());
        }
        for header in &self.headers {
            config.add_header(header)?;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(extension) = &self.extension {
            config.tile_extension.clone_from(extension);
        }
        if let Some(v) = self.concurrency {
            config.concurrency = usize::from(v);
        }
        if let Some(v) = self.max_retries {
            config.max_retries = u32::from(v);
        }
        if let Some(v) = self.pace_ms {
            config.success_pace_ms = v;
        }
        if let Some(v) = self.backoff_ms {
            config.retry_backoff_ms = v;
        }
        if let Some(v) = self.timeout_ms {
            config.request_timeout_ms = v;
        }
        Ok(())
    }
}
