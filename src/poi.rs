//! Points of interest: projection onto the trail, next-POI selection and the
//! marker visibility lifecycle.
//!
//! POI data is static. Each POI is projected once onto its nearest trail
//! point ([`PoiCatalog`]); the [`PoiTracker`] then only keeps the set of POI
//! ids that currently have a marker, and reports show/hide deltas as the
//! user moves.
//!
//! Two predicates decide what the user sees, and they intentionally differ:
//!
//! - [`PoiTracker::next_poi`] only considers POIs *ahead* of the user on the
//!   current stage.
//! - [`PoiTracker::visibility_for`] uses the absolute along-trail distance, so
//!   a POI just behind the user keeps its marker.

use log::{debug, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, TrailError};
use crate::geometry::TrailGeometry;
use crate::stages::StageIndex;

/// POI type tag for emergency exits. Bailouts are always visible.
pub const BAILOUT_TYPE: &str = "bailout";

/// Default visibility radius along the trail, in meters.
pub const DEFAULT_MAX_POI_DISTANCE: f64 = 2000.0;

/// A point of interest along the trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Poi {
    pub id: String,
    /// Free-form type tag ("water", "shrine", "bailout", ...)
    #[serde(rename = "type")]
    pub poi_type: String,
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// Stage declared in the source data, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<String>,
}

impl Poi {
    /// Create a POI, generating a deterministic id from type and coordinates
    /// when none is given.
    pub fn new(
        id: Option<String>,
        poi_type: &str,
        name: &str,
        latitude: f64,
        longitude: f64,
        stage_id: Option<String>,
    ) -> Self {
        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| generate_poi_id(poi_type, latitude, longitude));
        Self {
            id,
            poi_type: poi_type.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
            stage_id,
        }
    }

    pub fn is_bailout(&self) -> bool {
        self.poi_type == BAILOUT_TYPE
    }
}

/// Deterministic POI id: `"{type}-{lat:.6}-{lon:.6}"`.
pub fn generate_poi_id(poi_type: &str, latitude: f64, longitude: f64) -> String {
    format!("{}-{:.6}-{:.6}", poi_type, latitude, longitude)
}

/// Where a POI sits on the trail.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiPlacement {
    /// Index of the nearest trail point
    pub idx: usize,
    /// Stage the POI is assigned to; `None` when it cannot be assigned
    pub stage_id: Option<String>,
}

/// A POI paired with its (possibly missing) trail placement.
#[derive(Debug, Clone, Copy)]
pub struct PlacedPoi<'a> {
    pub poi: &'a Poi,
    pub placement: Option<&'a PoiPlacement>,
}

/// The static POI list plus a lazily computed projection for each entry.
///
/// Projections are computed on first use against the geometry and stages
/// passed in; a catalog must always be queried with the same trail.
#[derive(Debug, Clone, Default)]
pub struct PoiCatalog {
    pois: Vec<Poi>,
    placements: OnceCell<Vec<Option<PoiPlacement>>>,
}

impl PoiCatalog {
    pub fn new(pois: Vec<Poi>) -> Self {
        Self {
            pois,
            placements: OnceCell::new(),
        }
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    /// Placements in POI order, projected on first call.
    pub fn placements(
        &self,
        geometry: &TrailGeometry,
        stages: &StageIndex,
    ) -> &[Option<PoiPlacement>] {
        self.placements.get_or_init(|| {
            self.pois
                .iter()
                .map(|poi| project_poi(poi, geometry, stages))
                .collect()
        })
    }

    /// POIs in load order, each with its placement.
    pub fn placed<'a>(
        &'a self,
        geometry: &TrailGeometry,
        stages: &StageIndex,
    ) -> Vec<PlacedPoi<'a>> {
        let placements = self.placements(geometry, stages);
        self.pois
            .iter()
            .zip(placements.iter())
            .map(|(poi, placement)| PlacedPoi {
                poi,
                placement: placement.as_ref(),
            })
            .collect()
    }
}

/// Project a POI onto its nearest trail point and resolve its stage.
///
/// A declared stage id wins if it exists; an unknown one leaves the POI
/// unassigned. Without a declared id, the stage containing the projected
/// index is used.
fn project_poi(poi: &Poi, geometry: &TrailGeometry, stages: &StageIndex) -> Option<PoiPlacement> {
    if geometry.is_empty() {
        return None;
    }

    let (idx, distance) = geometry.nearest_point(poi.latitude, poi.longitude);
    if !distance.is_finite() {
        warn!("[PoiCatalog] POI '{}' has unusable coordinates, skipping", poi.id);
        return None;
    }

    let stage_id = match &poi.stage_id {
        Some(declared) => {
            if stages.stage_by_id(declared).is_some() {
                Some(declared.clone())
            } else {
                let err = TrailError::MissingStageData {
                    poi_id: poi.id.clone(),
                    stage_id: declared.clone(),
                };
                warn!("[PoiCatalog] {}", err);
                None
            }
        }
        None => stages.stage_for(idx).map(|s| s.id.clone()),
    };

    Some(PoiPlacement { idx, stage_id })
}

/// The next POI ahead of the user and the along-trail distance to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct NextPoi {
    pub poi: Poi,
    pub distance: f64,
}

/// Marker changes produced by [`PoiTracker::reconcile`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PoiDeltas {
    /// POIs that need a marker created
    pub to_show: Vec<Poi>,
    /// POIs whose marker must be removed
    pub to_hide: Vec<Poi>,
}

impl PoiDeltas {
    pub fn is_empty(&self) -> bool {
        self.to_show.is_empty() && self.to_hide.is_empty()
    }
}

/// Tracks which POIs currently have a marker.
#[derive(Debug, Clone, Default)]
pub struct PoiTracker {
    visible: HashSet<String>,
    show_all: bool,
}

impl PoiTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Debug mode: every POI is visible regardless of stage and distance.
    pub fn with_show_all(show_all: bool) -> Self {
        Self {
            visible: HashSet::new(),
            show_all,
        }
    }

    pub fn is_visible(&self, poi_id: &str) -> bool {
        self.visible.contains(poi_id)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// First POI in load order that is on the current stage and strictly
    /// ahead of `current_idx`.
    ///
    /// This is a first match, not a nearest match: if a stage's POIs are not
    /// stored in increasing index order, the POI returned may not be the
    /// closest one ahead. `horizon` additionally skips non-bailout POIs
    /// farther away than that along the trail.
    pub fn next_poi(
        &self,
        pois: &[PlacedPoi<'_>],
        geometry: &TrailGeometry,
        current_stage_id: Option<&str>,
        current_idx: usize,
        horizon: Option<f64>,
    ) -> Result<Option<NextPoi>> {
        let Some(current_stage_id) = current_stage_id else {
            return Ok(None);
        };

        for placed in pois {
            let Some(placement) = placed.placement else {
                continue;
            };
            if placement.stage_id.as_deref() != Some(current_stage_id) {
                continue;
            }
            if placement.idx <= current_idx {
                continue;
            }

            let distance = geometry.distance_along_trail(current_idx, placement.idx)?;
            if let Some(limit) = horizon {
                if !placed.poi.is_bailout() && distance > limit {
                    continue;
                }
            }

            return Ok(Some(NextPoi {
                poi: placed.poi.clone(),
                distance,
            }));
        }

        Ok(None)
    }

    /// Whether a POI should have a marker for the current position.
    ///
    /// Bailouts are always visible. Other POIs must be on the current stage
    /// and within `max_distance` along the trail, in either direction.
    pub fn visibility_for(
        &self,
        placed: &PlacedPoi<'_>,
        geometry: &TrailGeometry,
        current_idx: usize,
        current_stage_id: Option<&str>,
        max_distance: f64,
    ) -> Result<bool> {
        if self.show_all || placed.poi.is_bailout() {
            return Ok(true);
        }

        let Some(placement) = placed.placement else {
            return Ok(false);
        };
        let same_stage = match (placement.stage_id.as_deref(), current_stage_id) {
            (Some(poi_stage), Some(current)) => poi_stage == current,
            _ => false,
        };
        if !same_stage {
            return Ok(false);
        }

        let distance = geometry.distance_along_trail(current_idx, placement.idx)?;
        Ok(distance.abs() <= max_distance)
    }

    /// Recompute visibility for every POI and return the marker changes.
    ///
    /// Calling twice with the same inputs yields empty deltas the second time.
    /// On error the marker set is left unchanged.
    pub fn reconcile(
        &mut self,
        pois: &[PlacedPoi<'_>],
        geometry: &TrailGeometry,
        current_idx: usize,
        current_stage_id: Option<&str>,
        max_distance: f64,
    ) -> Result<PoiDeltas> {
        // Desired set first, so duplicate ids cannot flip-flop
        let mut desired: HashSet<&str> = HashSet::new();
        for placed in pois {
            if self.visibility_for(placed, geometry, current_idx, current_stage_id, max_distance)? {
                desired.insert(placed.poi.id.as_str());
            }
        }

        let mut deltas = PoiDeltas::default();
        let mut seen: HashSet<&str> = HashSet::new();
        for placed in pois {
            let id = placed.poi.id.as_str();
            if !seen.insert(id) {
                continue;
            }
            let should_show = desired.contains(id);
            let shown = self.visible.contains(id);
            if should_show && !shown {
                deltas.to_show.push(placed.poi.clone());
            } else if !should_show && shown {
                deltas.to_hide.push(placed.poi.clone());
            }
        }

        for poi in &deltas.to_show {
            self.visible.insert(poi.id.clone());
        }
        for poi in &deltas.to_hide {
            self.visible.remove(&poi.id);
        }

        if !deltas.is_empty() {
            debug!(
                "[PoiTracker] +{} -{} markers ({} visible)",
                deltas.to_show.len(),
                deltas.to_hide.len(),
                self.visible.len()
            );
        }

        Ok(deltas)
    }

    /// Drop every marker, returning the ids that were visible (sorted).
    pub fn clear(&mut self) -> Vec<String> {
        let mut ids: Vec<String> = self.visible.drain().collect();
        ids.sort();
        ids
    }
}
