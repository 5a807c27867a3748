//! Unified error handling for the trail-tracker library.
//!
//! Most of the per-fix pipeline is total: invalid fixes are sanitized rather
//! than rejected. The errors here cover programmer mistakes (bad indices),
//! unusable static data, and the optional I/O surfaces.

use std::fmt;

/// Unified error type for trail-tracker operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TrailError {
    /// The trail has no points, so nothing index-based can be answered
    EmptyTrail,
    /// A trail-point index past the end of the trail
    IndexOutOfRange { idx: usize, len: usize },
    /// A POI references a stage id that is not in the stage list
    MissingStageData { poi_id: String, stage_id: String },
    /// Stage ranges are unsorted, overlapping or inverted
    InvalidStages { message: String },
    /// Static trail data could not be parsed
    InvalidData { message: String },
    /// Static trail data could not be read
    Io { message: String },
    /// HTTP error while fetching trail data
    Http {
        message: String,
        status_code: Option<u16>,
    },
}

impl fmt::Display for TrailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailError::EmptyTrail => write!(f, "Trail has no points"),
            TrailError::IndexOutOfRange { idx, len } => {
                write!(f, "Trail index {} out of range for {} points", idx, len)
            }
            TrailError::MissingStageData { poi_id, stage_id } => {
                write!(f, "POI '{}' references unknown stage '{}'", poi_id, stage_id)
            }
            TrailError::InvalidStages { message } => {
                write!(f, "Invalid stage list: {}", message)
            }
            TrailError::InvalidData { message } => {
                write!(f, "Invalid trail data: {}", message)
            }
            TrailError::Io { message } => write!(f, "I/O error: {}", message),
            TrailError::Http {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "HTTP error ({}): {}", code, message)
                } else {
                    write!(f, "HTTP error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for TrailError {}

impl From<serde_json::Error> for TrailError {
    fn from(e: serde_json::Error) -> Self {
        TrailError::InvalidData {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for TrailError {
    fn from(e: std::io::Error) -> Self {
        TrailError::Io {
            message: e.to_string(),
        }
    }
}

/// Result type alias for trail-tracker operations.
pub type Result<T> = std::result::Result<T, TrailError>;

/// Extension trait for converting Option to TrailError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an index-out-of-range error.
    fn ok_or_out_of_range(self, idx: usize, len: usize) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_out_of_range(self, idx: usize, len: usize) -> Result<T> {
        self.ok_or(TrailError::IndexOutOfRange { idx, len })
    }
}
