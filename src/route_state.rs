//! On/near/off-route classification.
//!
//! The classifier works on the *effective* distance: raw distance to the
//! nearest trail point minus the fix's accuracy radius. A fix 120m from the
//! trail with 50m accuracy (effective 70m) is therefore on route.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Effective distance (m) up to which a fix is on route.
pub const ON_ROUTE_THRESHOLD: f64 = 100.0;

/// Effective distance (m) up to which a fix is near the route.
pub const NEAR_ROUTE_THRESHOLD: f64 = 250.0;

/// Coarse position of the user relative to the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum RouteState {
    OnRoute,
    NearRoute,
    OffRoute,
}

impl RouteState {
    /// Whether the map may follow the user. Only on-route fixes qualify.
    pub fn allows_follow(&self) -> bool {
        matches!(self, RouteState::OnRoute)
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteState::OnRoute => write!(f, "ON_ROUTE"),
            RouteState::NearRoute => write!(f, "NEAR_ROUTE"),
            RouteState::OffRoute => write!(f, "OFF_ROUTE"),
        }
    }
}

/// Threshold pair used by [`RouteStateClassifier::classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStateClassifier {
    pub on_route_threshold: f64,
    pub near_route_threshold: f64,
}

impl Default for RouteStateClassifier {
    fn default() -> Self {
        Self {
            on_route_threshold: ON_ROUTE_THRESHOLD,
            near_route_threshold: NEAR_ROUTE_THRESHOLD,
        }
    }
}

impl RouteStateClassifier {
    pub fn new(on_route_threshold: f64, near_route_threshold: f64) -> Self {
        Self {
            on_route_threshold,
            near_route_threshold,
        }
    }

    /// Classify a fix from its distance to the trail and its accuracy radius.
    ///
    /// Negative or non-finite accuracy counts as 0, so a bad accuracy value can
    /// never earn a better state than a perfect fix would.
    pub fn classify(&self, distance_to_trail: f64, accuracy: f64) -> RouteState {
        let effective = distance_to_trail - sanitize_accuracy(accuracy);

        if effective <= self.on_route_threshold {
            RouteState::OnRoute
        } else if effective <= self.near_route_threshold {
            RouteState::NearRoute
        } else {
            RouteState::OffRoute
        }
    }
}

/// Classify with the default 100m / 250m thresholds.
///
/// ```rust
/// use trail_tracker::{classify, RouteState};
///
/// assert_eq!(classify(90.0, 0.0), RouteState::OnRoute);
/// assert_eq!(classify(150.0, 60.0), RouteState::OnRoute);
/// assert_eq!(classify(300.0, 0.0), RouteState::OffRoute);
/// ```
pub fn classify(distance_to_trail: f64, accuracy: f64) -> RouteState {
    RouteStateClassifier::default().classify(distance_to_trail, accuracy)
}

/// Clamp an accuracy radius to a usable non-negative value.
pub(crate) fn sanitize_accuracy(accuracy: f64) -> f64 {
    if accuracy.is_finite() {
        accuracy.max(0.0)
    } else {
        0.0
    }
}
