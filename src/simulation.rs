//! Simulated position source for demos and development builds.
//!
//! Produces a steady stream of fixes drifting from a start coordinate by a
//! fixed step, the way a stand-in for the device location watcher would.

use crate::PositionFix;

/// Default per-step latitude change (degrees): drift south.
pub const DEFAULT_LAT_STEP: f64 = -0.0001;
/// Default per-step longitude change (degrees): drift east.
pub const DEFAULT_LON_STEP: f64 = 0.00001;
/// Accuracy reported by simulated fixes (m).
pub const SIMULATED_ACCURACY: f64 = 5.0;
/// Time between simulated fixes (ms).
pub const DEFAULT_INTERVAL_MS: i64 = 500;

/// An endless iterator of simulated fixes.
#[derive(Debug, Clone)]
pub struct SimulatedWalk {
    latitude: f64,
    longitude: f64,
    lat_step: f64,
    lon_step: f64,
    accuracy: f64,
    timestamp: i64,
    interval_ms: i64,
}

impl SimulatedWalk {
    /// Start a walk at the given coordinate with the default drift.
    pub fn new(latitude: f64, longitude: f64, start_timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            lat_step: DEFAULT_LAT_STEP,
            lon_step: DEFAULT_LON_STEP,
            accuracy: SIMULATED_ACCURACY,
            timestamp: start_timestamp,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }

    pub fn with_step(mut self, lat_step: f64, lon_step: f64) -> Self {
        self.lat_step = lat_step;
        self.lon_step = lon_step;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: i64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Teleport: the next fix is reported at this coordinate.
    pub fn jump_to(&mut self, latitude: f64, longitude: f64) {
        self.latitude = latitude;
        self.longitude = longitude;
    }
}

impl Iterator for SimulatedWalk {
    type Item = PositionFix;

    fn next(&mut self) -> Option<PositionFix> {
        let fix = PositionFix::new(self.latitude, self.longitude, self.accuracy, self.timestamp);
        self.latitude += self.lat_step;
        self.longitude += self.lon_step;
        self.timestamp += self.interval_ms;
        Some(fix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_drift() {
        let fixes: Vec<PositionFix> = SimulatedWalk::new(51.2147, 3.6220, 1_000).take(3).collect();
        assert_eq!(fixes[0].latitude, 51.2147);
        assert!((fixes[2].latitude - (51.2147 - 0.0002)).abs() < 1e-12);
        assert!((fixes[2].longitude - (3.6220 + 0.00002)).abs() < 1e-12);
        assert_eq!(fixes[2].timestamp, 2_000);
        assert!(fixes.iter().all(|f| f.accuracy == SIMULATED_ACCURACY));
    }

    #[test]
    fn test_jump_to() {
        let mut walk = SimulatedWalk::new(0.0, 0.0, 0).with_step(0.0, 0.001);
        walk.next();
        walk.jump_to(10.0, 20.0);
        let fix = walk.next().unwrap();
        assert_eq!((fix.latitude, fix.longitude), (10.0, 20.0));
        assert!((walk.next().unwrap().longitude - 20.001).abs() < 1e-12);
    }
}
