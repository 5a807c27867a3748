//! # Geographic Utilities
//!
//! Core geographic computation utilities for trail tracking.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine`] | Great-circle distance between two lat/lon pairs |
//! | [`haversine_distance`] | Same, for two [`GpsPoint`]s |
//! | [`compute_bounds`] | Bounding box of a point sequence |
//! | [`to_line_string`] | Convert points into a `geo::LineString` for renderers |
//!
//! ## Example
//!
//! ```rust
//! use trail_tracker::{GpsPoint, geo_utils};
//!
//! let track = vec![
//!     GpsPoint::new(33.8350, 135.7800),
//!     GpsPoint::new(33.8360, 135.7810),
//!     GpsPoint::new(33.8370, 135.7830),
//! ];
//!
//! let dist = geo_utils::haversine_distance(&track[0], &track[2]);
//! println!("Straight line: {:.0}m", dist);
//!
//! let bounds = geo_utils::compute_bounds(&track).unwrap();
//! assert_eq!(bounds.min_lat, 33.8350);
//! assert_eq!(bounds.max_lng, 135.7830);
//! ```
//!
//! ## Algorithm Notes
//!
//! Distances use the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_METERS`] (6 371 000 m). The intermediate term is clamped to
//! `[0, 1]` so that rounding on near-antipodal inputs cannot produce NaN.
//! `geo::Haversine` uses the IUGG mean radius (6 371 008.8 m), which would
//! shift every along-trail distance slightly, so the formula is written out here.
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).

use geo::{BoundingRect, Coord, LineString};

use crate::{Bounds, GpsPoint};

/// Sphere radius used for every distance in the crate, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two WGS84 coordinates.
///
/// Deterministic and symmetric; coincident points give exactly `0.0`.
///
/// # Example
///
/// ```rust
/// use trail_tracker::geo_utils::haversine;
///
/// let d = haversine(0.0, 0.0, 0.0, 0.001);
/// assert!((d - 111.19).abs() < 0.01);
///
/// // Antipodal points stay finite
/// let half = haversine(0.0, 0.0, 0.0, 180.0);
/// assert!(half.is_finite());
/// ```
#[inline]
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Great-circle distance in meters between two GPS points.
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

// =============================================================================
// Shape Functions
// =============================================================================

/// Convert trail points into a `geo::LineString` (x = longitude, y = latitude).
pub fn to_line_string(points: &[GpsPoint]) -> LineString<f64> {
    points
        .iter()
        .map(|p| Coord {
            x: p.longitude,
            y: p.latitude,
        })
        .collect::<Vec<_>>()
        .into()
}

/// Compute the bounding box of a point sequence.
///
/// Returns `None` for empty input. Renderers use this to fit the initial
/// map view to the trail.
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    let rect = to_line_string(points).bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_same_point() {
        assert_eq!(haversine(51.21, 3.62, 51.21, 3.62), 0.0);
        let p = GpsPoint::new(33.8350, 135.7800);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = GpsPoint::new(51.2147, 3.6220);
        let b = GpsPoint::new(48.8566, 2.3522);
        let ab = haversine_distance(&a, &b);
        let ba = haversine_distance(&b, &a);
        assert!(approx_eq(ab, ba, 1e-9));
    }

    #[test]
    fn test_haversine_known_value() {
        // London to Paris is approximately 344 km
        let dist = haversine(51.5074, -0.1278, 48.8566, 2.3522);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_haversine_antipodal_is_finite() {
        let d = haversine(10.0, 20.0, -10.0, -160.0);
        assert!(d.is_finite());
        // Half the circumference of the sphere
        assert!(approx_eq(d, std::f64::consts::PI * EARTH_RADIUS_METERS, 1.0));
    }

    #[test]
    fn test_compute_bounds() {
        let track = vec![
            GpsPoint::new(51.50, -0.13),
            GpsPoint::new(51.51, -0.12),
            GpsPoint::new(51.505, -0.125),
        ];
        let bounds = compute_bounds(&track).unwrap();
        assert_eq!(bounds.min_lat, 51.50);
        assert_eq!(bounds.max_lat, 51.51);
        assert_eq!(bounds.min_lng, -0.13);
        assert_eq!(bounds.max_lng, -0.12);
    }

    #[test]
    fn test_compute_bounds_empty() {
        assert!(compute_bounds(&[]).is_none());
    }

    #[test]
    fn test_to_line_string_axis_order() {
        let line = to_line_string(&[GpsPoint::new(33.0, 135.0)]);
        assert_eq!(line.0[0].x, 135.0);
        assert_eq!(line.0[0].y, 33.0);
    }
}
