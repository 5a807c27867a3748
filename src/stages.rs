//! Trail stages and the index → stage lookup.
//!
//! A stage is an inclusive range of trail-point indices. Stages are sorted by
//! `start_idx` and never overlap, but gaps between them are allowed: a point
//! inside a gap belongs to no stage.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};
use crate::geometry::TrailGeometry;
use crate::GpsPoint;

/// A named, contiguous sub-range of the trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Stage {
    /// Unique stage identifier (e.g. "S01")
    pub id: String,
    /// Display name (e.g. "Takijiri → Takahara")
    pub name: String,
    /// First trail-point index of the stage (inclusive)
    pub start_idx: u32,
    /// Last trail-point index of the stage (inclusive)
    pub end_idx: u32,
    /// Label of the stage end point (e.g. "Takahara")
    pub end_label: String,
}

impl Stage {
    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start_idx as usize && idx <= self.end_idx as usize
    }
}

/// A trail: an identifier plus its ordered stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    pub route_id: String,
    pub stages: Vec<Stage>,
}

impl Trail {
    pub fn stage_by_id(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }
}

/// A labelled marker location at a stage boundary, for the map renderer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct StageEndpoint {
    pub label: String,
    pub idx: u32,
    pub point: GpsPoint,
}

/// Validated stage list answering "which stage contains this index".
#[derive(Debug, Clone, Default)]
pub struct StageIndex {
    stages: Vec<Stage>,
}

impl StageIndex {
    /// Build an index over `stages` for a trail with `point_count` points.
    ///
    /// Rejects inverted ranges, indices past the end of the trail, and stages
    /// that are unsorted or overlap their predecessor. `stage_for` relies on
    /// these to make "first match" the only match.
    pub fn new(stages: Vec<Stage>, point_count: usize) -> Result<Self> {
        for stage in &stages {
            if stage.start_idx > stage.end_idx {
                return Err(TrailError::InvalidStages {
                    message: format!(
                        "stage '{}' starts at {} after its end {}",
                        stage.id, stage.start_idx, stage.end_idx
                    ),
                });
            }
            if stage.end_idx as usize >= point_count {
                return Err(TrailError::IndexOutOfRange {
                    idx: stage.end_idx as usize,
                    len: point_count,
                });
            }
        }

        for pair in stages.windows(2) {
            if pair[1].start_idx <= pair[0].end_idx {
                return Err(TrailError::InvalidStages {
                    message: format!(
                        "stage '{}' ({}..={}) overlaps or precedes stage '{}' ({}..={})",
                        pair[1].id,
                        pair[1].start_idx,
                        pair[1].end_idx,
                        pair[0].id,
                        pair[0].start_idx,
                        pair[0].end_idx
                    ),
                });
            }
        }

        info!("[StageIndex] Loaded {} stages over {} points", stages.len(), point_count);
        Ok(Self { stages })
    }

    /// Build an index from a [`Trail`] against its geometry.
    pub fn from_trail(trail: &Trail, geometry: &TrailGeometry) -> Result<Self> {
        Self::new(trail.stages.clone(), geometry.len())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The stage whose inclusive range contains `idx`, if any.
    pub fn stage_for(&self, idx: usize) -> Option<&Stage> {
        self.stages.iter().find(|s| s.contains(idx))
    }

    pub fn stage_by_id(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Marker locations for the stage boundaries: a "Start" marker at the
    /// first stage's start, then one marker per stage end.
    pub fn stage_endpoints(&self, geometry: &TrailGeometry) -> Vec<StageEndpoint> {
        let mut endpoints = Vec::with_capacity(self.stages.len() + 1);

        let endpoint = |label: &str, idx: u32| {
            geometry.point(idx as usize).map(|p| StageEndpoint {
                label: label.to_string(),
                idx,
                point: *p,
            })
        };

        if let Some(first) = self.stages.first() {
            endpoints.extend(endpoint("Start", first.start_idx));
        }
        for stage in &self.stages {
            endpoints.extend(endpoint(&stage.end_label, stage.end_idx));
        }

        endpoints
    }
}
