//! Tracker that synthesizes gaze data, for dry runs without the hardware.
//!
//! After streaming starts the simulated eye fixates near the screen centre
//! with a little positional noise, then makes one saccade of a fixed amplitude
//! on both axes after a random delay and fixates there until streaming stops.

use std::time::{Duration, Instant};

use gazelat_core::{Eye, GazeSample, SampleSource, StreamFlags, TrackerError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedTrackerConfig {
    pub sample_rate_hz: f64,
    /// Inclusive range the saccade onset is drawn from, after streaming starts.
    pub saccade_after_ms: (u64, u64),
    pub saccade_amplitude: f32,
    pub fixation_noise: f32,
    pub dropout_probability: f64,
    pub screen_width: f32,
    pub screen_height: f32,
    pub seed: Option<u64>,
}

impl Default for SimulatedTrackerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 1000.0,
            saccade_after_ms: (500, 1500),
            saccade_amplitude: 120.0,
            fixation_noise: 2.0,
            dropout_probability: 0.01,
            screen_width: 1920.0,
            screen_height: 1080.0,
            seed: None,
        }
    }
}

struct Stream {
    started: Instant,
    last_sample: Option<Instant>,
    saccade_at: Duration,
    fixation: (f32, f32),
    target: (f32, f32),
}

pub struct SimulatedTracker {
    config: SimulatedTrackerConfig,
    rng: StdRng,
    connected: bool,
    stream: Option<Stream>,
}

impl SimulatedTracker {
    pub fn new(config: SimulatedTrackerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng,
            connected: false,
            stream: None,
        }
    }

    fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.sample_rate_hz.max(1.0))
    }
}

impl SampleSource for SimulatedTracker {
    fn connect(&mut self) -> Result<(), TrackerError> {
        self.connected = true;
        debug!(rate_hz = self.config.sample_rate_hz, "simulated tracker connected");
        Ok(())
    }

    fn set_offline_mode(&mut self) {
        self.stream = None;
    }

    fn start_streaming(&mut self, flags: StreamFlags) -> Result<(), TrackerError> {
        if !self.connected {
            return Err(TrackerError::Connect("not connected".into()));
        }
        if !flags.link_samples {
            return Ok(());
        }
        let (lo, hi) = self.config.saccade_after_ms;
        let saccade_ms = self.rng.random_range(lo.min(hi)..=hi.max(lo));
        let centre = (self.config.screen_width / 2.0, self.config.screen_height / 2.0);
        let amp = self.config.saccade_amplitude;
        let sx = if self.rng.random_bool(0.5) { amp } else { -amp };
        let sy = if self.rng.random_bool(0.5) { amp } else { -amp };
        self.stream = Some(Stream {
            started: Instant::now(),
            last_sample: None,
            saccade_at: Duration::from_millis(saccade_ms),
            fixation: centre,
            target: (centre.0 + sx, centre.1 + sy),
        });
        Ok(())
    }

    fn wait_for_stream_start(&mut self, _timeout: Duration) -> bool {
        self.stream.is_some()
    }

    fn poll_sample(&mut self) -> Option<GazeSample> {
        let period = self.sample_period();
        let noise = self.config.fixation_noise.abs();
        let dropout = self.config.dropout_probability.clamp(0.0, 1.0);

        let stream = self.stream.as_mut()?;
        let now = Instant::now();
        if stream
            .last_sample
            .is_some_and(|last| now.duration_since(last) < period)
        {
            return None;
        }
        stream.last_sample = Some(now);

        if self.rng.random_bool(dropout) {
            return Some(GazeSample::missing(Eye::Right));
        }

        let (x, y) = if now.duration_since(stream.started) >= stream.saccade_at {
            stream.target
        } else {
            stream.fixation
        };
        let (jx, jy) = if noise > 0.0 {
            (
                self.rng.random_range(-noise..=noise),
                self.rng.random_range(-noise..=noise),
            )
        } else {
            (0.0, 0.0)
        };
        let pupil = self.rng.random_range(800.0..1200.0);
        Some(GazeSample::new(x + jx, y + jy, pupil, Eye::Right))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn flush_input(&mut self) {}

    fn stop_streaming(&mut self) {
        self.stream = None;
    }
}
