use serde::{Deserialize, Serialize};

/// Value the tracker reports for a coordinate it could not resolve.
pub const MISSING_DATA: f32 = -32768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eye {
    Left,
    Right,
}

/// One gaze sample as read from the tracker link.
///
/// `valid` is derived at construction and never recomputed: a sample is valid
/// when both coordinates differ from [`MISSING_DATA`] and the pupil area is
/// positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub x: f32,
    pub y: f32,
    pub pupil_area: f32,
    pub eye: Eye,
    pub valid: bool,
}

impl GazeSample {
    pub fn new(x: f32, y: f32, pupil_area: f32, eye: Eye) -> Self {
        let valid = x != MISSING_DATA && y != MISSING_DATA && pupil_area > 0.0;
        Self {
            x,
            y,
            pupil_area,
            eye,
            valid,
        }
    }

    /// A sample taken while the pupil was lost (blink, dropout).
    pub fn missing(eye: Eye) -> Self {
        Self::new(MISSING_DATA, MISSING_DATA, 0.0, eye)
    }
}
