//! Geographic and tile coordinate types.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Deserialize;
use thiserror::Error;

/// Latitude limit of the spherical Mercator projection (degrees).
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Valid longitude range (degrees).
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Largest supported zoom level. Tile indices at this zoom still fit in `u32`.
pub const MAX_ZOOM: u8 = 30;

/// Errors produced when geographic input cannot be mapped to valid tiles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Input or computed value was NaN or infinite (e.g. latitude of exactly ±90°).
    #[error("non-finite tile coordinate for lat {lat}, lon {lon} at zoom {zoom}")]
    NonFinite {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lon: f64,
        /// Zoom level.
        zoom: u8,
    },

    /// Latitude lies beyond the Mercator projection limit.
    #[error("latitude {0} outside the Mercator range ±{MERCATOR_MAX_LAT}")]
    LatitudeOutOfRange(f64),

    /// Longitude lies outside [-180, 180].
    #[error("longitude {0} outside [{MIN_LON}, {MAX_LON}]")]
    LongitudeOutOfRange(f64),

    /// Zoom level above [`MAX_ZOOM`].
    #[error("zoom {0} exceeds maximum supported zoom {MAX_ZOOM}")]
    ZoomOutOfRange(u8),

    /// Bounding box bounds are not strictly ordered.
    #[error(
        "invalid bounding box: expected min_lat < max_lat and min_lon < max_lon, got lat {min_lat}..{max_lat}, lon {min_lon}..{max_lon}"
    )]
    InvalidBoundingBox {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },

    /// Zoom range has `min_zoom > max_zoom`.
    #[error("invalid zoom range: min_zoom {min_zoom} is greater than max_zoom {max_zoom}")]
    InvalidZoomRange { min_zoom: u8, max_zoom: u8 },
}

/// Rectangular geographic region in WGS84 degrees.
///
/// Invariant: all bounds finite, `min_lat < max_lat`, `min_lon < max_lon`.
/// Use [`BoundingBox::new`] to construct a checked value.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Creates a bounding box, checking that the bounds are finite and ordered.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::InvalidBoundingBox`] when the invariant does not hold.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self, CoordError> {
        let bbox = Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Re-checks the invariant, for values built from deserialized input.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::InvalidBoundingBox`] when the invariant does not hold.
    pub fn validate(&self) -> Result<(), CoordError> {
        let finite = [self.min_lat, self.max_lat, self.min_lon, self.max_lon]
            .iter()
            .all(|v| v.is_finite());
        if finite && self.min_lat < self.max_lat && self.min_lon < self.max_lon {
            Ok(())
        } else {
            Err(CoordError::InvalidBoundingBox {
                min_lat: self.min_lat,
                max_lat: self.max_lat,
                min_lon: self.min_lon,
                max_lon: self.max_lon,
            })
        }
    }

    /// North-west corner as `(lat, lon)`.
    #[must_use]
    pub fn north_west(&self) -> (f64, f64) {
        (self.max_lat, self.min_lon)
    }

    /// South-east corner as `(lat, lon)`.
    #[must_use]
    pub fn south_east(&self) -> (f64, f64) {
        (self.min_lat, self.max_lon)
    }
}

/// Inclusive range of zoom levels, iterated in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    min_zoom: u8,
    max_zoom: u8,
}

impl ZoomRange {
    /// Creates a zoom range.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::InvalidZoomRange`] if `min_zoom > max_zoom`, or
    /// [`CoordError::ZoomOutOfRange`] if `max_zoom` exceeds [`MAX_ZOOM`].
    pub fn new(min_zoom: u8, max_zoom: u8) -> Result<Self, CoordError> {
        if min_zoom > max_zoom {
            return Err(CoordError::InvalidZoomRange { min_zoom, max_zoom });
        }
        if max_zoom > MAX_ZOOM {
            return Err(CoordError::ZoomOutOfRange(max_zoom));
        }
        Ok(Self { min_zoom, max_zoom })
    }

    /// Range containing a single zoom level.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::ZoomOutOfRange`] if `zoom` exceeds [`MAX_ZOOM`].
    pub fn single(zoom: u8) -> Result<Self, CoordError> {
        Self::new(zoom, zoom)
    }

    /// Zoom levels in ascending order.
    #[must_use]
    pub fn levels(&self) -> RangeInclusive<u8> {
        self.min_zoom..=self.max_zoom
    }
}

/// Identifier of one tile image in the slippy-map grid.
///
/// Invariant: `x < 2^zoom` and `y < 2^zoom`. Ordering is zoom, then x, then y,
/// matching the planner's enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Zoom level.
    pub zoom: u8,
    /// Column, 0 at the antimeridian (west).
    pub x: u32,
    /// Row, 0 at the north edge.
    pub y: u32,
}

impl TileId {
    #[must_use]
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}
