//! Per-fix orchestration.
//!
//! [`LocationProcessor::process`] is the single entry point that turns a
//! position fix into a [`Snapshot`]: nearest trail point, stage, along-trail
//! distances, route state, next POI and marker deltas. It is an explicit
//! function call; callers invoke it whenever the position input changes.

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{Result, TrailError};
use crate::geometry::TrailGeometry;
use crate::poi::{NextPoi, PoiCatalog, PoiDeltas, PoiTracker};
use crate::route_state::{sanitize_accuracy, RouteState, RouteStateClassifier};
use crate::stages::{Stage, StageEndpoint, StageIndex};
use crate::{PositionFix, TrackerConfig};

/// Derived state for one position fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Snapshot {
    /// Timestamp of the fix this snapshot was computed from
    pub timestamp: i64,
    pub closest_idx: u32,
    /// Straight-line distance to the closest trail point (m)
    pub closest_distance: f64,
    pub current_stage: Option<Stage>,
    /// Along-trail distance to the end of the current stage (m)
    pub distance_to_end_of_stage: Option<f64>,
    /// Along-trail distance to the end of the trail (m)
    pub distance_to_end_of_trail: f64,
    pub route_state: RouteState,
    /// True when the route state differs from the previous fix
    pub route_state_changed: bool,
    pub next_poi: Option<NextPoi>,
    #[serde(skip)]
    pub poi_deltas: PoiDeltas,
}

impl Snapshot {
    /// Along-trail distance to the next POI, if there is one.
    pub fn distance_to_next_poi(&self) -> Option<f64> {
        self.next_poi.as_ref().map(|n| n.distance)
    }
}

/// Owns the static trail data and one tracking session's mutable state.
///
/// Fixes must be processed one at a time; the most recent fix wins.
#[derive(Debug)]
pub struct LocationProcessor {
    geometry: TrailGeometry,
    stages: StageIndex,
    pois: PoiCatalog,
    tracker: PoiTracker,
    classifier: RouteStateClassifier,
    config: TrackerConfig,
    last_route_state: Option<RouteState>,
}

impl LocationProcessor {
    pub fn new(
        geometry: TrailGeometry,
        stages: StageIndex,
        pois: PoiCatalog,
        config: TrackerConfig,
    ) -> Self {
        info!(
            "[LocationProcessor] Tracking {} points, {} stages, {} POIs",
            geometry.len(),
            stages.stages().len(),
            pois.len()
        );
        Self {
            geometry,
            stages,
            pois,
            tracker: PoiTracker::with_show_all(config.show_all_pois),
            classifier: RouteStateClassifier::new(
                config.on_route_threshold,
                config.near_route_threshold,
            ),
            config,
            last_route_state: None,
        }
    }

    pub fn geometry(&self) -> &TrailGeometry {
        &self.geometry
    }

    pub fn stages(&self) -> &StageIndex {
        &self.stages
    }

    pub fn pois(&self) -> &PoiCatalog {
        &self.pois
    }

    pub fn tracker(&self) -> &PoiTracker {
        &self.tracker
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn stage_endpoints(&self) -> Vec<StageEndpoint> {
        self.stages.stage_endpoints(&self.geometry)
    }

    /// Compute the full snapshot for a fix.
    ///
    /// Fails with [`TrailError::EmptyTrail`] when there is no trail to track
    /// against. No partial snapshot is ever returned, and the POI marker set
    /// is only updated once every other quantity has been computed.
    pub fn process(&mut self, fix: &PositionFix) -> Result<Snapshot> {
        if self.geometry.is_empty() {
            return Err(TrailError::EmptyTrail);
        }
        let fix = sanitize_fix(fix);

        let (closest_idx, closest_distance) =
            self.geometry.nearest_point(fix.latitude, fix.longitude);
        let distance_to_end_of_trail = self.geometry.distance_to_end(closest_idx)?;

        let current_stage = self.stages.stage_for(closest_idx).cloned();
        let distance_to_end_of_stage = match &current_stage {
            Some(stage) => Some(self.geometry.distance_to_end_of_stage(closest_idx, stage)?),
            None => None,
        };
        let stage_id = current_stage.as_ref().map(|s| s.id.as_str());

        let route_state = self.classifier.classify(closest_distance, fix.accuracy);

        let placed = self.pois.placed(&self.geometry, &self.stages);
        let next_poi = self.tracker.next_poi(
            &placed,
            &self.geometry,
            stage_id,
            closest_idx,
            self.config.next_poi_horizon,
        )?;

        let poi_deltas = self.tracker.reconcile(
            &placed,
            &self.geometry,
            closest_idx,
            stage_id,
            self.config.max_poi_distance,
        )?;

        let route_state_changed = self.last_route_state != Some(route_state);
        if route_state_changed {
            match self.last_route_state {
                Some(previous) => info!(
                    "[LocationProcessor] Route state {} → {}",
                    previous, route_state
                ),
                None => info!("[LocationProcessor] Initial route state {}", route_state),
            }
        }
        self.last_route_state = Some(route_state);

        let snapshot = Snapshot {
            timestamp: fix.timestamp,
            closest_idx: closest_idx as u32,
            closest_distance,
            current_stage,
            distance_to_end_of_stage,
            distance_to_end_of_trail,
            route_state,
            route_state_changed,
            next_poi,
            poi_deltas,
        };

        debug!(
            "[LocationProcessor] idx={} d={:.0}m stage={:?} end={:.0}m state={}",
            snapshot.closest_idx,
            snapshot.closest_distance,
            snapshot.current_stage.as_ref().map(|s| s.id.as_str()),
            snapshot.distance_to_end_of_trail,
            snapshot.route_state
        );

        Ok(snapshot)
    }

    /// Remove every POI marker (e.g. when the map goes away). Returns the
    /// ids that were visible.
    pub fn clear_pois(&mut self) -> Vec<String> {
        self.tracker.clear()
    }

    /// Forget session state: markers and the last route state.
    pub fn reset(&mut self) {
        self.tracker.clear();
        self.last_route_state = None;
    }
}

fn sanitize_fix(fix: &PositionFix) -> PositionFix {
    if !fix.point().is_valid() {
        warn!(
            "[LocationProcessor] Invalid fix coordinates ({}, {})",
            fix.latitude, fix.longitude
        );
    }
    let accuracy = sanitize_accuracy(fix.accuracy);
    if accuracy != fix.accuracy {
        warn!("[LocationProcessor] Clamped fix accuracy {} to {}", fix.accuracy, accuracy);
    }
    PositionFix { accuracy, ..*fix }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::haversine;
    use crate::poi::{Poi, BAILOUT_TYPE};
    use crate::route_state::classify;
    use crate::GpsPoint;

    fn stage(id: &str, start_idx: u32, end_idx: u32) -> Stage {
        Stage {
            id: id.to_string(),
            name: id.to_string(),
            start_idx,
            end_idx,
            end_label: format!("{} end", id),
        }
    }

    /// 40 points ~111m apart along the equator, two stages with a gap at 20..=24.
    fn processor() -> LocationProcessor {
        let geometry =
            TrailGeometry::new((0..40).map(|i| GpsPoint::new(0.0, i as f64 * 0.001)).collect());
        let stages = StageIndex::new(
            vec![stage("S01", 0, 19), stage("S02", 25, 39)],
            geometry.len(),
        )
        .unwrap();
        let pois = PoiCatalog::new(vec![
            Poi::new(Some("water".into()), "water", "Spring", 0.0, 0.008, Some("S01".into())),
            Poi::new(Some("shrine".into()), "shrine", "Oji", 0.0, 0.030, Some("S02".into())),
            Poi::new(Some("exit".into()), BAILOUT_TYPE, "Bus stop", 0.0, 0.036, Some("S02".into())),
        ]);
        LocationProcessor::new(geometry, stages, pois, TrackerConfig::default())
    }

    #[test]
    fn test_three_point_trail_end_to_end() {
        let geometry = TrailGeometry::new(vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.001),
            GpsPoint::new(0.0, 0.002),
        ]);
        let stages = StageIndex::new(vec![stage("S01", 0, 2)], 3).unwrap();
        let mut processor = LocationProcessor::new(
            geometry,
            stages,
            PoiCatalog::default(),
            TrackerConfig::default(),
        );

        let fix = PositionFix::new(0.0, 0.0015, 5.0, 1_000);
        let snapshot = processor.process(&fix).unwrap();

        // Halfway between idx 1 and 2: the closer one in floating point wins,
        // the lower index on an exact tie
        let d1 = haversine(0.0, 0.0015, 0.0, 0.001);
        let d2 = haversine(0.0, 0.0015, 0.0, 0.002);
        let expected_idx = if d2 < d1 { 2 } else { 1 };
        assert_eq!(snapshot.closest_idx, expected_idx);
        assert_eq!(snapshot.closest_distance, d1.min(d2));
        assert_eq!(snapshot.route_state, classify(d1.min(d2), 5.0));
        assert_eq!(snapshot.route_state, RouteState::OnRoute);
        assert_eq!(snapshot.current_stage.as_ref().unwrap().id, "S01");
        assert!(snapshot.next_poi.is_none());
    }

    #[test]
    fn test_snapshot_quantities() {
        let mut processor = processor();
        let fix = PositionFix::new(0.0, 0.002, 5.0, 0);
        let snapshot = processor.process(&fix).unwrap();

        let geometry = processor.geometry();
        assert_eq!(snapshot.closest_idx, 2);
        assert_eq!(snapshot.closest_distance, 0.0);
        assert_eq!(snapshot.current_stage.as_ref().unwrap().id, "S01");
        assert_eq!(
            snapshot.distance_to_end_of_stage,
            Some(geometry.distance_along_trail(2, 19).unwrap())
        );
        assert_eq!(snapshot.distance_to_end_of_trail, geometry.distance_to_end(2).unwrap());
        assert_eq!(snapshot.next_poi.as_ref().unwrap().poi.id, "water");
        assert_eq!(
            snapshot.distance_to_next_poi(),
            Some(geometry.distance_along_trail(2, 8).unwrap())
        );

        let shown: Vec<&str> = snapshot.poi_deltas.to_show.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(shown, vec!["water", "exit"]);
    }

    #[test]
    fn test_gap_has_no_stage() {
        let mut processor = processor();
        let snapshot = processor.process(&PositionFix::new(0.0, 0.022, 5.0, 0)).unwrap();
        assert_eq!(snapshot.closest_idx, 22);
        assert!(snapshot.current_stage.is_none());
        assert!(snapshot.distance_to_end_of_stage.is_none());
        assert!(snapshot.next_poi.is_none());
    }

    #[test]
    fn test_route_state_transitions() {
        let mut processor = processor();

        let first = processor.process(&PositionFix::new(0.0, 0.005, 5.0, 0)).unwrap();
        assert_eq!(first.route_state, RouteState::OnRoute);
        assert!(first.route_state_changed);

        let same = processor.process(&PositionFix::new(0.0, 0.006, 5.0, 1)).unwrap();
        assert!(!same.route_state_changed);

        // ~1.1km north of the trail
        let off = processor.process(&PositionFix::new(0.01, 0.006, 5.0, 2)).unwrap();
        assert_eq!(off.route_state, RouteState::OffRoute);
        assert!(off.route_state_changed);
    }

    #[test]
    fn test_repeated_fix_has_no_deltas() {
        let mut processor = processor();
        let fix = PositionFix::new(0.0, 0.004, 10.0, 0);
        let first = processor.process(&fix).unwrap();
        assert!(!first.poi_deltas.is_empty());
        let second = processor.process(&fix).unwrap();
        assert!(second.poi_deltas.is_empty());
    }

    #[test]
    fn test_negative_accuracy_sanitized() {
        let mut processor = processor();
        // ~155m north of idx 5
        let fix = PositionFix::new(0.0014, 0.005, -200.0, 0);
        let snapshot = processor.process(&fix).unwrap();
        assert_eq!(snapshot.route_state, RouteState::NearRoute);
    }

    #[test]
    fn test_infinite_accuracy_does_not_put_far_fix_on_route() {
        let mut processor = processor();
        // ~11km north of the trail
        let far = PositionFix::new(0.1, 0.005, f64::INFINITY, 0);
        let snapshot = processor.process(&far).unwrap();
        assert!(snapshot.closest_distance > 11_000.0);
        assert_eq!(snapshot.route_state, RouteState::OffRoute);
        assert_eq!(
            snapshot.route_state,
            processor.process(&PositionFix { accuracy: 0.0, ..far }).unwrap().route_state
        );
    }

    #[test]
    fn test_out_of_range_fix_is_still_processed() {
        let mut processor = processor();
        let fix = PositionFix::new(95.0, 0.005, 5.0, 0);
        assert!(!fix.point().is_valid());
        let snapshot = processor.process(&fix).unwrap();
        assert_eq!(snapshot.route_state, RouteState::OffRoute);
    }

    #[test]
    fn test_nan_fix_is_total() {
        let mut processor = processor();
        let snapshot = processor.process(&PositionFix::new(f64::NAN, 0.0, f64::NAN, 0)).unwrap();
        assert_eq!(snapshot.closest_idx, 0);
        assert_eq!(snapshot.route_state, RouteState::OffRoute);
    }

    #[test]
    fn test_empty_trail_fails() {
        let mut processor = LocationProcessor::new(
            TrailGeometry::new(vec![]),
            StageIndex::default(),
            PoiCatalog::default(),
            TrackerConfig::default(),
        );
        assert_eq!(
            processor.process(&PositionFix::new(0.0, 0.0, 5.0, 0)),
            Err(TrailError::EmptyTrail)
        );
    }

    #[test]
    fn test_clear_and_reset() {
        let mut processor = processor();
        processor.process(&PositionFix::new(0.0, 0.004, 5.0, 0)).unwrap();
        assert_eq!(processor.clear_pois(), vec!["exit".to_string(), "water".to_string()]);

        processor.reset();
        let snapshot = processor.process(&PositionFix::new(0.0, 0.004, 5.0, 1)).unwrap();
        assert!(snapshot.route_state_changed);
        assert_eq!(snapshot.poi_deltas.to_show.len(), 2);
    }

    #[test]
    fn test_stage_endpoints_from_processor() {
        let processor = processor();
        let labels: Vec<String> = processor
            .stage_endpoints()
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec!["Start", "S01 end", "S02 end"]);
    }
}
