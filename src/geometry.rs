//! # Trail Geometry
//!
//! The immutable point sequence of the trail and the along-trail distance
//! table derived from it.
//!
//! ## Distance table
//!
//! `distances_to_end[i]` is the distance walked along the polyline from point
//! `i` to the last point. It is built once, on first use, by walking the
//! points backwards and accumulating segment lengths, so lookups after that
//! are O(1). The table is non-increasing with `i` and its last entry is 0.
//!
//! ## Example
//!
//! ```rust
//! use trail_tracker::{GpsPoint, TrailGeometry};
//!
//! let geometry = TrailGeometry::new(vec![
//!     GpsPoint::new(0.0, 0.0),
//!     GpsPoint::new(0.0, 0.001),
//!     GpsPoint::new(0.0, 0.002),
//! ]);
//!
//! let (idx, distance) = geometry.nearest_point(0.0, 0.0019);
//! assert_eq!(idx, 2);
//! assert!(distance < 20.0);
//!
//! let remaining = geometry.distance_to_end(0).unwrap();
//! assert!((remaining - 222.39).abs() < 0.01);
//! ```

use log::{info, warn};
use once_cell::sync::OnceCell;

use crate::error::{OptionExt, Result, TrailError};
use crate::geo_utils::{self, haversine};
use crate::stages::Stage;
use crate::{Bounds, GpsPoint};

/// Ordered trail points plus a lazily-built cumulative distance table.
///
/// Index 0 is the trail start; the last index is the trail end.
#[derive(Debug, Clone, Default)]
pub struct TrailGeometry {
    points: Vec<GpsPoint>,
    distances_to_end: OnceCell<Vec<f64>>,
}

impl TrailGeometry {
    /// Create a geometry from ordered trail points.
    ///
    /// An empty sequence is accepted (logged); nearest-point queries then
    /// degrade to `(0, 0.0)` and index lookups fail with [`TrailError::EmptyTrail`].
    pub fn new(points: Vec<GpsPoint>) -> Self {
        if points.is_empty() {
            warn!("[TrailGeometry] Trail has no points");
        }
        Self {
            points,
            distances_to_end: OnceCell::new(),
        }
    }

    /// Create a geometry from GeoJSON-ordered `[longitude, latitude]` pairs.
    pub fn from_lon_lat(coords: &[[f64; 2]]) -> Self {
        Self::new(
            coords
                .iter()
                .map(|c| GpsPoint::new(c[1], c[0]))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    /// Point at `idx`, or `None` past the end.
    pub fn point(&self, idx: usize) -> Option<&GpsPoint> {
        self.points.get(idx)
    }

    /// Index of the last point (the trail end).
    pub fn last_index(&self) -> Result<usize> {
        self.points.len().checked_sub(1).ok_or(TrailError::EmptyTrail)
    }

    /// Bounding box of the trail, `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        geo_utils::compute_bounds(&self.points)
    }

    /// Find the trail point closest to a coordinate.
    ///
    /// Linear scan over every point. Returns `(idx, distance_in_meters)`; on
    /// exact ties the lowest index wins. An empty trail yields `(0, 0.0)`.
    /// A non-finite query matches nothing and yields `(0, f64::INFINITY)`.
    pub fn nearest_point(&self, lat: f64, lon: f64) -> (usize, f64) {
        if self.points.is_empty() {
            return (0, 0.0);
        }

        #[cfg(feature = "parallel")]
        {
            self.nearest_point_parallel(lat, lon)
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.nearest_point_sequential(lat, lon)
        }
    }

    #[cfg_attr(feature = "parallel", allow(dead_code))]
    fn nearest_point_sequential(&self, lat: f64, lon: f64) -> (usize, f64) {
        let mut closest_idx = 0;
        let mut closest_distance = f64::INFINITY;

        for (i, p) in self.points.iter().enumerate() {
            let distance = haversine(lat, lon, p.latitude, p.longitude);
            if distance < closest_distance {
                closest_idx = i;
                closest_distance = distance;
            }
        }

        (closest_idx, closest_distance)
    }

    /// Parallel scan. `reduce_with` combines neighbouring chunks in order and
    /// keeps the left operand on ties, so the result equals the sequential scan.
    #[cfg(feature = "parallel")]
    fn nearest_point_parallel(&self, lat: f64, lon: f64) -> (usize, f64) {
        use rayon::prelude::*;

        self.points
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let distance = haversine(lat, lon, p.latitude, p.longitude);
                // NaN never wins a comparison in the sequential scan either
                (i, if distance.is_nan() { f64::INFINITY } else { distance })
            })
            .reduce_with(|a, b| if b.1 < a.1 { b } else { a })
            .unwrap_or((0, f64::INFINITY))
    }

    /// Along-trail distance from point `idx` to the trail end, in meters.
    pub fn distance_to_end(&self, idx: usize) -> Result<f64> {
        if self.points.is_empty() {
            return Err(TrailError::EmptyTrail);
        }
        self.distances_to_end()
            .get(idx)
            .copied()
            .ok_or_out_of_range(idx, self.points.len())
    }

    /// Along-trail distance from `idx_a` to `idx_b`.
    ///
    /// Positive when `idx_a` lies before `idx_b`. This is the walked polyline
    /// distance, not the straight-line distance between the two points.
    pub fn distance_along_trail(&self, idx_a: usize, idx_b: usize) -> Result<f64> {
        Ok(self.distance_to_end(idx_a)? - self.distance_to_end(idx_b)?)
    }

    /// Along-trail distance from `idx` to the last point of `stage`.
    ///
    /// Negative only when `idx` lies past the stage end.
    pub fn distance_to_end_of_stage(&self, idx: usize, stage: &Stage) -> Result<f64> {
        self.distance_along_trail(idx, stage.end_idx as usize)
    }

    /// Total along-trail length (0 for empty or single-point trails).
    pub fn total_length(&self) -> f64 {
        self.distances_to_end().first().copied().unwrap_or(0.0)
    }

    /// The full cumulative distance table, built on first access.
    pub fn distances_to_end(&self) -> &[f64] {
        self.distances_to_end
            .get_or_init(|| build_distance_table(&self.points))
    }
}

fn build_distance_table(points: &[GpsPoint]) -> Vec<f64> {
    let mut distances = vec![0.0; points.len()];

    // Walk backwards from the second-to-last point
    for i in (0..points.len().saturating_sub(1)).rev() {
        let segment = geo_utils::haversine_distance(&points[i], &points[i + 1]);
        distances[i] = distances[i + 1] + segment;
    }

    info!(
        "[TrailGeometry] Built distance table: {} points, {:.0}m total",
        points.len(),
        distances.first().copied().unwrap_or(0.0)
    );

    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// Five points ~111m apart heading east along the equator.
    fn equator_trail() -> TrailGeometry {
        TrailGeometry::new((0..5).map(|i| GpsPoint::new(0.0, i as f64 * 0.001)).collect())
    }

    #[test]
    fn test_nearest_point_picks_closest() {
        let geometry = equator_trail();
        let (idx, distance) = geometry.nearest_point(0.0001, 0.0021);
        assert_eq!(idx, 2);
        assert!(distance < 20.0);
    }

    #[test]
    fn test_nearest_point_tie_goes_to_lowest_index() {
        let geometry = TrailGeometry::new(vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.002),
        ]);
        // Exactly halfway between the two points
        let (idx, _) = geometry.nearest_point(0.0, 0.001);
        assert_eq!(idx, 0);

        // Repeated point: first occurrence wins
        let repeated = TrailGeometry::new(vec![
            GpsPoint::new(0.0, 0.001),
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.0),
        ]);
        assert_eq!(repeated.nearest_point(0.0, 0.0).0, 1);
    }

    #[test]
    fn test_nearest_point_single_point_trail() {
        let geometry = TrailGeometry::new(vec![GpsPoint::new(1.0, 1.0)]);
        for (lat, lon) in [(1.0, 1.0), (0.0, 0.0), (-45.0, 170.0)] {
            let (idx, distance) = geometry.nearest_point(lat, lon);
            assert_eq!(idx, 0);
            assert_eq!(distance, haversine(lat, lon, 1.0, 1.0));
        }
    }

    #[test]
    fn test_nearest_point_empty_trail() {
        let geometry = TrailGeometry::new(vec![]);
        assert_eq!(geometry.nearest_point(10.0, 10.0), (0, 0.0));
    }

    #[test]
    fn test_nearest_point_nan_query() {
        let geometry = equator_trail();
        let (idx, distance) = geometry.nearest_point(f64::NAN, 0.0);
        assert_eq!(idx, 0);
        assert!(distance.is_infinite());
    }

    #[test]
    fn test_distance_to_end_monotonic() {
        let geometry = equator_trail();
        let table = geometry.distances_to_end();
        assert_eq!(table.len(), 5);
        for w in table.windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert_eq!(geometry.distance_to_end(4).unwrap(), 0.0);
        assert!(approx_eq(geometry.total_length(), 4.0 * 111.195, 0.1));
    }

    #[test]
    fn test_distance_to_end_out_of_range() {
        let geometry = equator_trail();
        assert_eq!(
            geometry.distance_to_end(5),
            Err(TrailError::IndexOutOfRange { idx: 5, len: 5 })
        );
        assert_eq!(
            TrailGeometry::new(vec![]).distance_to_end(0),
            Err(TrailError::EmptyTrail)
        );
    }

    #[test]
    fn test_distance_along_trail_sign() {
        let geometry = equator_trail();
        let forward = geometry.distance_along_trail(1, 3).unwrap();
        let backward = geometry.distance_along_trail(3, 1).unwrap();
        assert!(forward > 0.0);
        assert!(approx_eq(forward, -backward, 1e-9));
        assert_eq!(geometry.distance_along_trail(2, 2).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_along_trail_follows_polyline() {
        // Out 1km north and back: endpoints coincide but the walk is ~2km
        let geometry = TrailGeometry::new(vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.009, 0.0),
            GpsPoint::new(0.0, 0.0),
        ]);
        let along = geometry.distance_along_trail(0, 2).unwrap();
        assert!(along > 1900.0);
        assert_eq!(haversine(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_from_lon_lat_swaps_axes() {
        let geometry = TrailGeometry::from_lon_lat(&[[135.78, 33.83]]);
        let p = geometry.point(0).unwrap();
        assert_eq!(p.latitude, 33.83);
        assert_eq!(p.longitude, 135.78);
    }

    #[test]
    fn test_distance_to_end_of_stage() {
        let geometry = equator_trail();
        let stage = Stage {
            id: "S01".into(),
            name: "First".into(),
            start_idx: 0,
            end_idx: 2,
            end_label: "Middle".into(),
        };
        let remaining = geometry.distance_to_end_of_stage(0, &stage).unwrap();
        assert!(approx_eq(remaining, 2.0 * 111.195, 0.1));
        assert_eq!(geometry.distance_to_end_of_stage(2, &stage).unwrap(), 0.0);
        // Past the stage end
        assert!(geometry.distance_to_end_of_stage(3, &stage).unwrap() < 0.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_scan_matches_sequential() {
        // Seven coordinates repeated: every query has thousands of exact ties
        let cycling = TrailGeometry::new(
            (0..100_000)
                .map(|i| GpsPoint::new(0.0, (i % 7) as f64 * 0.001))
                .collect(),
        );
        // Out and back: each point has an exact twin in the other half
        let out_and_back = TrailGeometry::new(
            (0..100_000)
                .map(|i: usize| GpsPoint::new(i.min(99_999 - i) as f64 * 1e-5, 0.0))
                .collect(),
        );

        let queries = [
            (0.0, 0.003),
            (0.0, 0.0),
            (0.0, 0.0035),
            (0.0004, 0.0061),
            (0.25, 0.0),
            (0.1234, 0.0001),
            (45.0, 90.0),
            (f64::NAN, 0.0),
        ];
        for geometry in [&cycling, &out_and_back] {
            for (lat, lon) in queries {
                assert_eq!(
                    geometry.nearest_point_parallel(lat, lon),
                    geometry.nearest_point_sequential(lat, lon),
                    "query ({}, {})",
                    lat,
                    lon
                );
            }
        }

        // Exact hits resolve to the first occurrence
        for (geometry, idx) in [(&cycling, 3), (&out_and_back, 25_000)] {
            let p = *geometry.point(idx).unwrap();
            assert_eq!(geometry.nearest_point_parallel(p.latitude, p.longitude), (idx, 0.0));
        }
    }

    #[test]
    fn test_clone_keeps_table() {
        let geometry = equator_trail();
        let before = geometry.total_length();
        let cloned = geometry.clone();
        assert_eq!(cloned.total_length(), before);
        assert_eq!(cloned.last_index().unwrap(), 4);
    }
}
