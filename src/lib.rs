//! # Trail Tracker
//!
//! Progress tracking along a fixed, pre-recorded trail.
//!
//! Given the trail polyline, its stages and its points of interest, each
//! incoming position fix is turned into a [`Snapshot`]:
//! - nearest trail point and the distance to it
//! - along-trail distance to the end of the current stage and of the trail
//! - the stage the user is on (or none, between stages)
//! - on/near/off-route state, adjusted for GPS accuracy
//! - the next POI ahead, plus show/hide deltas for POI markers
//!
//! ## Features
//!
//! - **`parallel`** - Parallel nearest-point search with rayon
//! - **`http`** - Fetch trail data documents over HTTP
//! - **`ffi`** - FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trail_tracker::{
//!     GpsPoint, LocationProcessor, PoiCatalog, PositionFix, RouteState, Stage, StageIndex,
//!     TrackerConfig, TrailGeometry,
//! };
//!
//! let geometry = TrailGeometry::new(
//!     (0..20).map(|i| GpsPoint::new(33.835, 135.780 + i as f64 * 0.001)).collect(),
//! );
//! let stages = StageIndex::new(
//!     vec![Stage {
//!         id: "S01".into(),
//!         name: "Takijiri → Takahara".into(),
//!         start_idx: 0,
//!         end_idx: 19,
//!         end_label: "Takahara".into(),
//!     }],
//!     geometry.len(),
//! )
//! .unwrap();
//!
//! let mut processor =
//!     LocationProcessor::new(geometry, stages, PoiCatalog::default(), TrackerConfig::default());
//!
//! let snapshot = processor
//!     .process(&PositionFix::new(33.8352, 135.7851, 8.0, 0))
//!     .unwrap();
//! assert_eq!(snapshot.closest_idx, 5);
//! assert_eq!(snapshot.route_state, RouteState::OnRoute);
//! println!("{:.0}m to Takahara", snapshot.distance_to_end_of_stage.unwrap());
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Result, TrailError};

pub mod geo_utils;

pub mod geometry;
pub use geometry::TrailGeometry;

pub mod stages;
pub use stages::{Stage, StageEndpoint, StageIndex, Trail};

pub mod route_state;
pub use route_state::{
    classify, RouteState, RouteStateClassifier, NEAR_ROUTE_THRESHOLD, ON_ROUTE_THRESHOLD,
};

pub mod poi;
pub use poi::{
    NextPoi, PlacedPoi, Poi, PoiCatalog, PoiDeltas, PoiPlacement, PoiTracker, BAILOUT_TYPE,
    DEFAULT_MAX_POI_DISTANCE,
};

pub mod processor;
pub use processor::{LocationProcessor, Snapshot};

pub mod data;
pub use data::TrailData;

pub mod simulation;
pub use simulation::SimulatedWalk;

pub mod format;
pub use format::format_distance;

// HTTP module for trail data fetching
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{fetch_trail_data_sync, TrailDataFetcher};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("TrailTrackerRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude (WGS84 degrees).
///
/// # Example
/// ```
/// use trail_tracker::GpsPoint;
/// let point = GpsPoint::new(33.8350, 135.7800); // Takijiri
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box of the trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// A single position fix from the location source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters
    pub accuracy: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp,
        }
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// Configuration for route-state classification and POI visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[serde(default)]
pub struct TrackerConfig {
    /// Effective distance up to which a fix is on route.
    /// Default: 100.0 meters
    pub on_route_threshold: f64,

    /// Effective distance up to which a fix is near the route.
    /// Default: 250.0 meters
    pub near_route_threshold: f64,

    /// Along-trail radius within which same-stage POIs are shown.
    /// Default: 2000.0 meters
    pub max_poi_distance: f64,

    /// Debug flag: show every POI marker.
    /// Default: false
    pub show_all_pois: bool,

    /// Skip non-bailout "next POI" candidates farther than this along the trail.
    /// Default: None (no limit)
    pub next_poi_horizon: Option<f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            on_route_threshold: ON_ROUTE_THRESHOLD,
            near_route_threshold: NEAR_ROUTE_THRESHOLD,
            max_poi_distance: DEFAULT_MAX_POI_DISTANCE,
            show_all_pois: false,
            next_poi_horizon: None,
        }
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{info, warn};
    use std::sync::{Arc, Mutex, MutexGuard};

    /// One tracking session over one trail, shared with the mobile app.
    #[derive(uniffi::Object)]
    pub struct TrailTracker {
        processor: Mutex<LocationProcessor>,
    }

    impl TrailTracker {
        fn from_data(data: TrailData, config: TrackerConfig) -> Option<Arc<Self>> {
            match data.into_processor(config) {
                Ok(processor) => Some(Arc::new(Self {
                    processor: Mutex::new(processor),
                })),
                Err(e) => {
                    warn!("[TrailTrackerRust] Rejected trail data: {}", e);
                    None
                }
            }
        }

        fn lock(&self) -> MutexGuard<'_, LocationProcessor> {
            self.processor.lock().unwrap_or_else(|e| e.into_inner())
        }
    }

    /// Build a tracker from the three trail data JSON documents.
    #[uniffi::export]
    pub fn create_tracker(
        tracks_json: String,
        stages_json: String,
        pois_json: String,
        config: TrackerConfig,
    ) -> Option<Arc<TrailTracker>> {
        init_logging();
        match TrailData::from_json(&tracks_json, &stages_json, &pois_json) {
            Ok(data) => TrailTracker::from_data(data, config),
            Err(e) => {
                warn!("[TrailTrackerRust] Failed to parse trail data: {}", e);
                None
            }
        }
    }

    #[uniffi::export]
    impl TrailTracker {
        /// Process a position fix. Returns `None` if the trail cannot be tracked.
        pub fn process_fix(&self, fix: PositionFix) -> Option<Snapshot> {
            match self.lock().process(&fix) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!("[TrailTrackerRust] process_fix failed: {}", e);
                    None
                }
            }
        }

        /// Remove all POI markers; returns the ids that were shown.
        pub fn clear_pois(&self) -> Vec<String> {
            self.lock().clear_pois()
        }

        pub fn stage_endpoints(&self) -> Vec<StageEndpoint> {
            self.lock().stage_endpoints()
        }

        pub fn trail_bounds(&self) -> Option<Bounds> {
            self.lock().geometry().bounds()
        }

        pub fn trail_length(&self) -> f64 {
            self.lock().geometry().total_length()
        }
    }

    /// Get default configuration.
    #[uniffi::export]
    pub fn default_config() -> TrackerConfig {
        init_logging();
        info!("[TrailTrackerRust] default_config called");
        TrackerConfig::default()
    }

    /// Format a distance for display ("734 m", "2.5 km", "N/A").
    #[uniffi::export]
    pub fn ffi_format_distance(meters: Option<f64>) -> String {
        format_distance(meters)
    }

    /// Download trail data from `base_url` and build a tracker.
    #[cfg(feature = "http")]
    #[uniffi::export]
    pub fn create_tracker_from_url(
        base_url: String,
        config: TrackerConfig,
    ) -> Option<Arc<TrailTracker>> {
        init_logging();
        info!("[TrailTrackerRust] Fetching trail data from {}", base_url);
        match crate::http::fetch_trail_data_sync(&base_url) {
            Ok(data) => TrailTracker::from_data(data, config),
            Err(e) => {
                warn!("[TrailTrackerRust] Fetch failed: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
