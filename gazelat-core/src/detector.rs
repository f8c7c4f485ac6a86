use serde::{Deserialize, Serialize};

use crate::sample::GazeSample;

/// Per-axis displacement a candidate sample must reach before a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerThreshold {
    pub axis_threshold: f32,
}

impl TriggerThreshold {
    pub fn new(axis_threshold: f32) -> Self {
        Self { axis_threshold }
    }
}

impl Default for TriggerThreshold {
    fn default() -> Self {
        Self::new(25.0)
    }
}

/// Decides whether `candidate` has moved far enough from `baseline`.
///
/// Both axes must individually move by at least the threshold; a large shift on
/// a single axis is treated as jitter. Invalid samples never trigger.
pub fn evaluate(baseline: &GazeSample, candidate: &GazeSample, threshold: TriggerThreshold) -> bool {
    if !baseline.valid || !candidate.valid {
        return false;
    }
    let dx = (baseline.x - candidate.x).abs();
    let dy = (baseline.y - candidate.y).abs();
    dx >= threshold.axis_threshold && dy >= threshold.axis_threshold
}
