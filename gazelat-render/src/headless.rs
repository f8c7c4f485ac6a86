use std::time::Duration;

use gazelat_core::{DisplayError, PacingMode, Stimulus, StimulusPresenter};
use gazelat_timing::{HighPrecisionTimer, Timer};
use tracing::debug;

use crate::frames::StimulusFrames;

/// Presenter without a window, for dry runs on machines with no display.
///
/// Frames are still copied into an offscreen framebuffer. With
/// [`PacingMode::Vsync`] each present waits for the next simulated refresh
/// at `refresh_hz`, so the controller's frame cadence matches a real panel.
pub struct HeadlessPresenter<C: Timer<Timestamp = u64> = HighPrecisionTimer> {
    frames: StimulusFrames,
    canvas: Vec<u8>,
    pacing: PacingMode,
    period_ns: u64,
    next_refresh: Option<u64>,
    last: Option<Stimulus>,
    presented: u64,
    timer: C,
}

impl HeadlessPresenter {
    pub fn new(frames: StimulusFrames, pacing: PacingMode, refresh_hz: f64) -> Self {
        Self::with_timer(frames, pacing, refresh_hz, HighPrecisionTimer::new())
    }
}

impl<C: Timer<Timestamp = u64>> HeadlessPresenter<C> {
    pub fn with_timer(frames: StimulusFrames, pacing: PacingMode, refresh_hz: f64, timer: C) -> Self {
        let layout = frames.layout();
        let period_ns = (1e9 / refresh_hz.max(1.0)) as u64;
        debug!(width = layout.width, height = layout.height, ?pacing, period_ns, "headless presenter ready");
        Self {
            canvas: vec![0; layout.width as usize * layout.height as usize * 4],
            frames,
            pacing,
            period_ns,
            next_refresh: None,
            last: None,
            presented: 0,
            timer,
        }
    }

    pub fn last_presented(&self) -> Option<Stimulus> {
        self.last
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    fn wait_for_refresh(&mut self) {
        let now = self.timer.now();
        let due = match self.next_refresh {
            Some(due) if due > now => {
                self.timer.sleep(Duration::from_nanos(due - now));
                due
            }
            _ => now,
        };
        self.next_refresh = Some(due + self.period_ns);
    }
}

impl<C: Timer<Timestamp = u64>> StimulusPresenter for HeadlessPresenter<C> {
    fn present(&mut self, stimulus: Stimulus) -> Result<(), DisplayError> {
        self.frames.blit(stimulus, &mut self.canvas)?;
        if self.pacing == PacingMode::Vsync {
            self.wait_for_refresh();
        }
        self.last = Some(stimulus);
        self.presented += 1;
        Ok(())
    }

    fn pacing(&self) -> PacingMode {
        self.pacing
    }
}
