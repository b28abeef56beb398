//! Coordinate conversion module
//!
//! Converts geographic coordinates (latitude/longitude) into spherical
//! Mercator tile indices as used by slippy-map tile servers.

mod types;

pub use types::{
    BoundingBox, CoordError, MAX_LON, MAX_ZOOM, MERCATOR_MAX_LAT, MIN_LON, TileId, ZoomRange,
};

use std::f64::consts::PI;

/// Number of tiles along one axis at `zoom`.
#[must_use]
pub fn tiles_per_axis(zoom: u8) -> u64 {
    1u64 << zoom
}

/// Converts geographic coordinates to tile `(x, y)` indices.
///
/// Uses `x = floor((lon + 180) / 360 * n)` and
/// `y = floor((1 - ln(tan(lat) + sec(lat)) / π) / 2 * n)` with `n = 2^zoom`.
/// Both raw values are non-negative in the valid domain, so `floor` agrees with
/// truncation toward zero. A point exactly on the east or south edge of the
/// world yields `n` and is assigned to the last tile.
///
/// # Errors
///
/// - [`CoordError::NonFinite`] if an input or the computed index is NaN/infinite
///   (a latitude of ±90° lands here)
/// - [`CoordError::LatitudeOutOfRange`] beyond ±[`MERCATOR_MAX_LAT`]
/// - [`CoordError::LongitudeOutOfRange`] outside [-180, 180]
/// - [`CoordError::ZoomOutOfRange`] above [`MAX_ZOOM`]
pub fn to_tile_xy(lat: f64, lon: f64, zoom: u8) -> Result<(u32, u32), CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::ZoomOutOfRange(zoom));
    }

    let n = tiles_per_axis(zoom) as f64;
    let lat_rad = lat.to_radians();
    let raw_x = ((lon + 180.0) / 360.0 * n).floor();
    let raw_y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

    if !raw_x.is_finite() || !raw_y.is_finite() {
        return Err(CoordError::NonFinite { lat, lon, zoom });
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::LongitudeOutOfRange(lon));
    }
    if lat.abs() > MERCATOR_MAX_LAT {
        return Err(CoordError::LatitudeOutOfRange(lat));
    }

    Ok((clamp_index(raw_x, n), clamp_index(raw_y, n)))
}

// Raw index is in [0, n] after the range checks; n itself is the far edge.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_index(raw: f64, n: f64) -> u32 {
    raw.clamp(0.0, n - 1.0) as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_at_zoom_zero_is_single_tile() {
        assert_eq!(to_tile_xy(0.0, 0.0, 0).unwrap(), (0, 0));
    }

    #[test]
    fn test_origin_at_zoom_one_is_south_east_quadrant() {
        // (0, 0) sits on the corner shared by all four tiles; floor picks x=1, y=1
        assert_eq!(to_tile_xy(0.0, 0.0, 1).unwrap(), (1, 1));
    }

    #[test]
    fn test_new_york_city_at_zoom_16() {
        let (x, y) = to_tile_xy(40.7128, -74.0060, 16).unwrap();
        assert_eq!(x, 19295);
        assert_eq!(y, 24640);
    }

    #[test]
    fn test_bbox_corners_at_zoom_6() {
        // North-west and south-east corners of the default Iran-region box
        assert_eq!(to_tile_xy(40.0, 44.0, 6).unwrap(), (39, 24));
        assert_eq!(to_tile_xy(24.0, 63.0, 6).unwrap(), (43, 27));
    }

    #[test]
    fn test_results_stay_inside_grid() {
        for zoom in [0u8, 1, 5, 12, 18, 24] {
            let n = tiles_per_axis(zoom);
            for lat in [-85.0, -45.5, -0.1, 0.0, 33.3, 85.0] {
                for lon in [-180.0, -90.0, 0.0, 45.0, 179.999] {
                    let (x, y) = to_tile_xy(lat, lon, zoom).unwrap();
                    assert!(u64::from(x) < n, "x {x} out of grid at zoom {zoom}");
                    assert!(u64::from(y) < n, "y {y} out of grid at zoom {zoom}");
                }
            }
        }
    }

    #[test]
    fn test_east_and_south_edges_map_to_last_tile() {
        let (x, _) = to_tile_xy(0.0, 180.0, 3).unwrap();
        assert_eq!(x, 7);
        let (_, y) = to_tile_xy(-MERCATOR_MAX_LAT, 0.0, 3).unwrap();
        assert_eq!(y, 7);
    }

    #[test]
    fn test_poles_are_rejected() {
        // tan/sec blow up near ±90°; depending on rounding the result is either
        // infinite or a finite value far outside the grid. Both must be errors.
        for lat in [90.0, -90.0] {
            let err = to_tile_xy(lat, 0.0, 4).unwrap_err();
            assert!(
                matches!(
                    err,
                    CoordError::NonFinite { zoom: 4, .. } | CoordError::LatitudeOutOfRange(_)
                ),
                "unexpected error for lat {lat}: {err:?}"
            );
        }
    }

    #[test]
    fn test_nan_input_is_non_finite() {
        let err = to_tile_xy(f64::NAN, 10.0, 4).unwrap_err();
        assert!(matches!(err, CoordError::NonFinite { .. }));
    }

    #[test]
    fn test_latitude_beyond_mercator_limit_rejected() {
        let err = to_tile_xy(88.0, 0.0, 4).unwrap_err();
        assert_eq!(err, CoordError::LatitudeOutOfRange(88.0));
    }

    #[test]
    fn test_longitude_beyond_antimeridian_rejected() {
        let err = to_tile_xy(10.0, 190.0, 4).unwrap_err();
        assert_eq!(err, CoordError::LongitudeOutOfRange(190.0));
    }

    #[test]
    fn test_zoom_above_maximum_rejected() {
        let err = to_tile_xy(10.0, 10.0, MAX_ZOOM + 1).unwrap_err();
        assert_eq!(err, CoordError::ZoomOutOfRange(MAX_ZOOM + 1));
    }

    #[test]
    fn test_bounding_box_rejects_inverted_bounds() {
        assert!(BoundingBox::new(40.0, 24.0, 44.0, 63.0).is_err());
        assert!(BoundingBox::new(24.0, 40.0, 63.0, 44.0).is_err());
        assert!(BoundingBox::new(24.0, 24.0, 44.0, 63.0).is_err());
        assert!(BoundingBox::new(f64::NAN, 40.0, 44.0, 63.0).is_err());
        assert!(BoundingBox::new(24.0, 40.0, 44.0, 63.0).is_ok());
    }

    #[test]
    fn test_bounding_box_corners_are_cross_paired() {
        let bbox = BoundingBox::new(24.0, 40.0, 44.0, 63.0).unwrap();
        assert_eq!(bbox.north_west(), (40.0, 44.0));
        assert_eq!(bbox.south_east(), (24.0, 63.0));
    }

    #[test]
    fn test_zoom_range_validation() {
        assert!(ZoomRange::new(8, 6).is_err());
        assert!(ZoomRange::new(0, MAX_ZOOM + 1).is_err());
        let range = ZoomRange::new(6, 8).unwrap();
        assert_eq!(range.levels().collect::<Vec<_>>(), vec![6, 7, 8]);
    }

    #[test]
    fn test_tile_id_display() {
        assert_eq!(TileId::new(6, 39, 24).to_string(), "6/39/24");
    }
}
