//! Loading the static trail data.
//!
//! A trail ships as three JSON documents:
//!
//! - `tracks.json`: a GeoJSON `FeatureCollection` whose first feature is a
//!   `LineString` of `[longitude, latitude(, elevation)]` positions
//! - `stages.json`: `{ "route_id": ..., "stages": [ {id, name, start_idx, end_idx, end_label} ] }`
//! - `pois.json`: `[ {id?, type, name, lat, lon, stage_id?} ]`
//!
//! ```rust
//! use trail_tracker::{TrailData, TrackerConfig, PositionFix};
//!
//! let tracks = r#"{"type": "FeatureCollection", "features": [{"type": "Feature",
//!     "geometry": {"type": "LineString",
//!                  "coordinates": [[0.0, 0.0], [0.001, 0.0], [0.002, 0.0]]}}]}"#;
//! let stages = r#"{"route_id": "demo", "stages": [
//!     {"id": "S01", "name": "A → B", "start_idx": 0, "end_idx": 2, "end_label": "B"}]}"#;
//! let pois = r#"[{"type": "water", "name": "Spring", "lat": 0.0, "lon": 0.0018}]"#;
//!
//! let data = TrailData::from_json(tracks, stages, pois).unwrap();
//! let mut processor = data.into_processor(TrackerConfig::default()).unwrap();
//! let snapshot = processor.process(&PositionFix::new(0.0, 0.0, 5.0, 0)).unwrap();
//! assert_eq!(snapshot.next_poi.unwrap().poi.id, "water-0.000000-0.001800");
//! ```

use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Result, TrailError};
use crate::geometry::TrailGeometry;
use crate::poi::{Poi, PoiCatalog};
use crate::processor::LocationProcessor;
use crate::stages::{StageIndex, Trail};
use crate::TrackerConfig;

pub const TRACKS_FILE: &str = "tracks.json";
pub const STAGES_FILE: &str = "stages.json";
pub const POIS_FILE: &str = "pois.json";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    geometry_type: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PoiRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    poi_type: String,
    #[serde(default)]
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    stage_id: Option<String>,
}

/// One trail's static data, parsed but not yet validated against itself.
#[derive(Debug, Clone)]
pub struct TrailData {
    pub trail: Trail,
    pub geometry: TrailGeometry,
    pub pois: Vec<Poi>,
}

impl TrailData {
    /// Parse the three JSON documents.
    pub fn from_json(tracks_json: &str, stages_json: &str, pois_json: &str) -> Result<Self> {
        let geometry = parse_tracks(tracks_json)?;
        let trail: Trail = serde_json::from_str(stages_json)?;
        let pois = parse_pois(pois_json)?;

        info!(
            "[TrailData] Loaded '{}': {} points ({:.1}km), {} stages, {} POIs",
            trail.route_id,
            geometry.len(),
            geometry.total_length() / 1000.0,
            trail.stages.len(),
            pois.len()
        );

        Ok(Self {
            trail,
            geometry,
            pois,
        })
    }

    /// Read `tracks.json`, `stages.json` and `pois.json` from a directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            fs::read_to_string(dir.join(name)).map_err(|e| TrailError::Io {
                message: format!("{}: {}", dir.join(name).display(), e),
            })
        };
        Self::from_json(&read(TRACKS_FILE)?, &read(STAGES_FILE)?, &read(POIS_FILE)?)
    }

    /// Validate the stages against the geometry and build a processor.
    pub fn into_processor(self, config: TrackerConfig) -> Result<LocationProcessor> {
        let stages = StageIndex::from_trail(&self.trail, &self.geometry)?;
        Ok(LocationProcessor::new(
            self.geometry,
            stages,
            PoiCatalog::new(self.pois),
            config,
        ))
    }
}

/// Parse a GeoJSON track into a geometry. A collection without features
/// yields an empty trail.
fn parse_tracks(json: &str) -> Result<TrailGeometry> {
    let collection: FeatureCollection = serde_json::from_str(json)?;

    let Some(geometry) = collection.features.into_iter().next().and_then(|f| f.geometry) else {
        warn!("[TrailData] Track document has no geometry");
        return Ok(TrailGeometry::new(Vec::new()));
    };

    if geometry.geometry_type != "LineString" {
        return Err(TrailError::InvalidData {
            message: format!("expected a LineString track, got {}", geometry.geometry_type),
        });
    }

    let positions: Vec<Vec<f64>> = serde_json::from_value(geometry.coordinates)?;
    let coords = positions
        .iter()
        .enumerate()
        .map(|(i, position)| match position.as_slice() {
            [lon, lat, ..] => Ok([*lon, *lat]),
            _ => Err(TrailError::InvalidData {
                message: format!("track position {} has {} values", i, position.len()),
            }),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TrailGeometry::from_lon_lat(&coords))
}

fn parse_pois(json: &str) -> Result<Vec<Poi>> {
    let records: Vec<PoiRecord> = serde_json::from_str(json)?;

    let pois: Vec<Poi> = records
        .into_iter()
        .map(|r| Poi::new(r.id, &r.poi_type, &r.name, r.lat, r.lon, r.stage_id))
        .collect();

    let mut seen = HashSet::new();
    for poi in &pois {
        if !seen.insert(poi.id.as_str()) {
            warn!("[TrailData] Duplicate POI id '{}'", poi.id);
        }
    }

    Ok(pois)
}
