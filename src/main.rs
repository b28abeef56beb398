//! CLI entry point for the tile downloader.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use tile_downloader::{
    DownloadConfig, DownloadEngine, HttpTileSource, RunStats, TileFetcher, TilePlan,
};
use tracing::{debug, info, warn};

mod cli;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let mut config = match &args.config {
        Some(path) => DownloadConfig::load(path)?,
        None => DownloadConfig::default(),
    };
    args.apply_to(&mut config)?;
    let settings = config.validate().context("invalid configuration")?;

    let plan = TilePlan::build(&settings.bbox, settings.zooms, &settings.layout)
        .context("failed to plan tiles")?;

    for span in plan.spans() {
        info!(
            zoom = span.zoom,
            x_start = span.x_start,
            x_end = span.x_end,
            y_start = span.y_start,
            y_end = span.y_end,
            tiles = span.tile_count(),
            "planned zoom level"
        );
    }

    if args.dry_run {
        for span in plan.spans() {
            println!("{span}");
        }
        println!("total: {} tiles", plan.len());
        return Ok(ExitCode::SUCCESS);
    }

    if plan.is_empty() {
        info!("No tiles to download");
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        tiles = plan.len(),
        output_dir = %settings.layout.root().display(),
        template = %settings.template,
        concurrency = settings.concurrency,
        "Tile downloader starting"
    );

    let source = Arc::new(HttpTileSource::new(&settings.http).context("failed to build HTTP client")?);
    let fetcher = Arc::new(
        TileFetcher::new(source, settings.template.clone())
            .with_retry_policy(settings.retry_policy.clone())
            .with_success_pace(settings.success_pace),
    );
    let engine = DownloadEngine::new(settings.concurrency)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let total = plan.len();
    let stats = Arc::new(RunStats::new());
    let show_progress = progress::should_show_progress(io::stderr().is_terminal(), args.quiet);
    let (progress_handle, progress_stop) =
        progress::spawn_progress_ui(show_progress, Arc::clone(&stats), total);

    let run = engine
        .run_with_stats(
            plan.into_tasks(),
            fetcher,
            Arc::clone(&stats),
            Arc::clone(&interrupted),
        )
        .await;

    progress::finish_progress_ui(progress_handle, &progress_stop).await;
    run?;

    info!(
        downloaded = stats.downloaded(),
        skipped_existing = stats.skipped_existing(),
        skipped_forbidden = stats.skipped_forbidden(),
        failed = stats.failed(),
        retried = stats.retried(),
        total,
        "Download complete"
    );

    if stats.was_interrupted() {
        warn!(
            processed = stats.processed(),
            total, "Interrupted. Run again to resume."
        );
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
