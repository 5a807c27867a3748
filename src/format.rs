//! Human-readable distances for snapshot consumers.

/// Format a distance in meters for display. Missing or non-finite
/// distances read "N/A".
///
/// ```rust
/// use trail_tracker::format_distance;
///
/// assert_eq!(format_distance(None), "N/A");
/// assert_eq!(format_distance(Some(734.4)), "734 m");
/// assert_eq!(format_distance(Some(2_460.0)), "2.5 km");
/// assert_eq!(format_distance(Some(12_300.0)), "12 km");
/// ```
pub fn format_distance(meters: Option<f64>) -> String {
    match meters {
        Some(m) if !m.is_finite() => "N/A".to_string(),
        None => "N/A".to_string(),
        Some(m) if m < 1000.0 => format!("{} m", m.round()),
        Some(m) if m < 10_500.0 => format!("{:.1} km", m / 1000.0),
        Some(m) => format!("{} km", (m / 1000.0).round()),
    }
}
