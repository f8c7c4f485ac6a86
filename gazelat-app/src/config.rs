use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gazelat_core::PacingMode;
use gazelat_devices::SimulatedTrackerConfig;
use gazelat_experiment::{ConfigError, ExperimentConfig};
use serde::Deserialize;

/// Contents of `gazelat.toml`. Every section and field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub experiment: ExperimentConfig,
    pub display: DisplayConfig,
    pub tracker: SimulatedTrackerConfig,
    pub trigger: TriggerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub pacing: PacingMode,
    pub box_size: u32,
    /// Render offscreen; no window, no operator keys.
    pub headless: bool,
    /// Simulated refresh rate for headless vsync pacing.
    pub refresh_hz: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fullscreen: true,
            pacing: PacingMode::Vsync,
            box_size: 100,
            headless: false,
            refresh_hz: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    #[default]
    Serial,
    Loopback,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub kind: TriggerKind,
    pub device: String,
    pub baud: u32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            kind: TriggerKind::Serial,
            device: "/dev/ttyACM0".to_string(),
            baud: 115_200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub log_path: PathBuf,
    pub summary_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("results.csv"),
            summary_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.experiment.validate()?;
        let d = &self.display;
        if d.width == 0 || d.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "display must not be zero-sized, got {}x{}",
                d.width, d.height
            )));
        }
        if d.box_size == 0 {
            return Err(ConfigError::Invalid("box_size must be at least 1".into()));
        }
        if !(d.refresh_hz.is_finite() && d.refresh_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "refresh_hz must be positive, got {}",
                d.refresh_hz
            )));
        }
        if self.trigger.kind == TriggerKind::Serial && self.trigger.device.is_empty() {
            return Err(ConfigError::Invalid("trigger device path is empty".into()));
        }
        Ok(())
    }
}
