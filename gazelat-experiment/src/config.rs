use std::time::Duration;

use gazelat_core::TriggerThreshold;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed parameters of a run. Read-only once the runner starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub trial_count: u32,
    #[serde(flatten)]
    pub threshold: TriggerThreshold,
    /// How long to wait for the tracker to confirm sample data is flowing.
    pub sample_wait_timeout_ms: u32,
    /// Settle time after switching the tracker to offline mode.
    pub mode_switch_delay_ms: u64,
    /// Extra recording kept after a trial ends to catch trailing data.
    pub trailing_window_ms: u64,
    /// Triggered frames shown after a trigger, the first one timed.
    pub triggered_frames: u32,
    /// Idle frames between two frame-rate reports; 0 disables them.
    pub fps_report_interval: u64,
    /// Unset: wait for a valid baseline sample forever.
    pub baseline_timeout_ms: Option<u64>,
    /// Unset: wait for the device acknowledgement forever.
    pub ack_timeout_ms: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            trial_count: 1,
            threshold: TriggerThreshold::default(),
            sample_wait_timeout_ms: 100,
            mode_switch_delay_ms: 50,
            trailing_window_ms: 100,
            triggered_frames: 4,
            fps_report_interval: 480,
            baseline_timeout_ms: None,
            ack_timeout_ms: None,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trial_count == 0 {
            return Err(ConfigError::Invalid("trial_count must be at least 1".into()));
        }
        let t = self.threshold.axis_threshold;
        if !t.is_finite() || t <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "axis_threshold must be a positive number, got {t}"
            )));
        }
        if self.triggered_frames == 0 {
            return Err(ConfigError::Invalid(
                "triggered_frames must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn sample_wait_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.sample_wait_timeout_ms))
    }

    pub fn mode_switch_delay(&self) -> Duration {
        Duration::from_millis(self.mode_switch_delay_ms)
    }

    pub fn trailing_window(&self) -> Duration {
        Duration::from_millis(self.trailing_window_ms)
    }

    pub fn baseline_timeout(&self) -> Option<Duration> {
        self.baseline_timeout_ms.map(Duration::from_millis)
    }

    pub fn ack_timeout(&self) -> Option<Duration> {
        self.ack_timeout_ms.map(Duration::from_millis)
    }
}
