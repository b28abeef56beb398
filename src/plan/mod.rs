//! Tile range planning.
//!
//! Turns a [`BoundingBox`] and a [`ZoomRange`] into the ordered set of tiles to
//! fetch. For each zoom level the box's north-west `(max_lat, min_lon)` and
//! south-east `(min_lat, max_lon)` corners are mapped to tile indices; since
//! tile rows grow southward these cross-paired corners span the full rectangle.
//!
//! Planning is all-or-nothing: if any zoom level fails to map, no tiles are
//! returned for the run.
//!
//! # Example
//!
//! ```
//! use tile_downloader::coord::{BoundingBox, ZoomRange};
//! use tile_downloader::plan::plan;
//!
//! let bbox = BoundingBox::new(24.0, 40.0, 44.0, 63.0).unwrap();
//! let tiles = plan(&bbox, ZoomRange::single(6).unwrap()).unwrap();
//! assert_eq!(tiles.len(), 20);
//! ```

mod layout;

pub use layout::{DEFAULT_TILE_EXTENSION, StorageLayout, TileTask};

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::coord::{BoundingBox, CoordError, TileId, ZoomRange, to_tile_xy};

/// Planning failed because a corner could not be mapped at some zoom level.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("cannot plan zoom {zoom}: {source}")]
    Coordinate {
        zoom: u8,
        #[source]
        source: CoordError,
    },
}

/// Inclusive tile rectangle for one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomSpan {
    pub zoom: u8,
    pub x_start: u32,
    pub x_end: u32,
    pub y_start: u32,
    pub y_end: u32,
}

impl ZoomSpan {
    /// Number of tiles in the rectangle.
    #[must_use]
    pub fn tile_count(&self) -> u64 {
        u64::from(self.x_end - self.x_start + 1) * u64::from(self.y_end - self.y_start + 1)
    }

    /// Tiles in x-then-y ascending order.
    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        (self.x_start..=self.x_end)
            .flat_map(move |x| (self.y_start..=self.y_end).map(move |y| TileId::new(self.zoom, x, y)))
    }
}

impl fmt::Display for ZoomSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "zoom {}: x {}..={}, y {}..={} ({} tiles)",
            self.zoom,
            self.x_start,
            self.x_end,
            self.y_start,
            self.y_end,
            self.tile_count()
        )
    }
}

/// Computes the tile rectangle covering `bbox` at `zoom`.
///
/// # Errors
///
/// Returns [`PlanError::Coordinate`] if either corner cannot be mapped.
pub fn zoom_span(bbox: &BoundingBox, zoom: u8) -> Result<ZoomSpan, PlanError> {
    let to_plan_err = |source| PlanError::Coordinate { zoom, source };

    let (nw_lat, nw_lon) = bbox.north_west();
    let (se_lat, se_lon) = bbox.south_east();
    let (x_a, y_a) = to_tile_xy(nw_lat, nw_lon, zoom).map_err(to_plan_err)?;
    let (x_b, y_b) = to_tile_xy(se_lat, se_lon, zoom).map_err(to_plan_err)?;

    Ok(ZoomSpan {
        zoom,
        x_start: x_a.min(x_b),
        x_end: x_a.max(x_b),
        y_start: y_a.min(y_b),
        y_end: y_a.max(y_b),
    })
}

/// Computes one [`ZoomSpan`] per zoom level, ascending.
///
/// # Errors
///
/// Returns the first [`PlanError`]; spans computed for other zooms are discarded.
pub fn plan_spans(bbox: &BoundingBox, zooms: ZoomRange) -> Result<Vec<ZoomSpan>, PlanError> {
    zooms.levels().map(|zoom| zoom_span(bbox, zoom)).collect()
}

/// Enumerates every tile covering `bbox` across `zooms`.
///
/// Order is zoom, then x, then y ascending and is identical across calls with
/// the same input.
///
/// # Errors
///
/// Returns [`PlanError`] if any zoom level cannot be mapped.
pub fn plan(bbox: &BoundingBox, zooms: ZoomRange) -> Result<Vec<TileId>, PlanError> {
    let spans = plan_spans(bbox, zooms)?;
    Ok(spans.iter().flat_map(ZoomSpan::tiles).collect())
}

/// A complete plan: per-zoom spans plus the tasks to execute.
#[derive(Debug, Clone)]
pub struct TilePlan {
    spans: Vec<ZoomSpan>,
    tasks: Vec<TileTask>,
}

impl TilePlan {
    /// Plans `bbox` × `zooms` and assigns every tile its path in `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] if any zoom level cannot be mapped.
    pub fn build(
        bbox: &BoundingBox,
        zooms: ZoomRange,
        layout: &StorageLayout,
    ) -> Result<Self, PlanError> {
        let spans = plan_spans(bbox, zooms)?;
        let tasks: Vec<TileTask> = spans
            .iter()
            .flat_map(ZoomSpan::tiles)
            .map(|tile| TileTask::new(tile, layout))
            .collect();
        debug!(zooms = spans.len(), tasks = tasks.len(), "built tile plan");
        Ok(Self { spans, tasks })
    }

    #[must_use]
    pub fn spans(&self) -> &[ZoomSpan] {
        &self.spans
    }

    /// Consumes the plan, yielding its tasks.
    #[must_use]
    pub fn into_tasks(self) -> Vec<TileTask> {
        self.tasks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
