//! Per-trial state machine.
//!
//! ```text
//! Init -> AwaitLink -> AwaitBaseline -> Armed -> Triggered -> Done
//!   \________\______________\______________\______________-> Aborted
//! ```
//!
//! While armed, every iteration checks the operator and the link, polls one
//! sample against the baseline and presents one idle frame. The idle flicker is
//! the fiducial the external device times against, so the order of those steps
//! must not change.

use std::time::Duration;

use gazelat_core::{
    FlickerPhase, GazeSample, OperatorSignals, SampleSource, Stimulus, StimulusPresenter,
    StreamFlags, TimingRecord, TrackerError, TriggerTransport, TrialFault, TrialOutcome, evaluate,
};
use gazelat_timing::{FrameLog, Timer};
use tracing::{debug, warn};

use crate::rig::LatencyRig;

#[derive(Debug, Clone, PartialEq)]
pub enum TrialState {
    Init,
    AwaitLink,
    AwaitBaseline,
    Armed {
        baseline: GazeSample,
        captured_at: u64,
    },
    Triggered {
        sensing_delay_us: u64,
        drawing_delay_us: u64,
    },
    Done(TrialOutcome),
    Aborted(TrialOutcome),
}

impl TrialState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrialState::Done(_) | TrialState::Aborted(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrialState::Init => "init",
            TrialState::AwaitLink => "await_link",
            TrialState::AwaitBaseline => "await_baseline",
            TrialState::Armed { .. } => "armed",
            TrialState::Triggered { .. } => "triggered",
            TrialState::Done(_) => "done",
            TrialState::Aborted(_) => "aborted",
        }
    }

    fn into_outcome(self) -> Option<TrialOutcome> {
        match self {
            TrialState::Done(outcome) | TrialState::Aborted(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Runs one trial against the rig's collaborators. Consumed by [`run`](Self::run).
pub struct TrialController<'r, S, T, P, G, C> {
    rig: &'r mut LatencyRig<S, T, P, G, C>,
    ordinal: u32,
    phase: FlickerPhase,
    frames: FrameLog,
    cadence: FlickerCadence,
    last_frame_at: Option<u64>,
}

impl<'r, S, T, P, G, C> TrialController<'r, S, T, P, G, C>
where
    S: SampleSource,
    T: TriggerTransport,
    P: StimulusPresenter,
    G: OperatorSignals,
    C: Timer<Timestamp = u64>,
{
    pub fn new(rig: &'r mut LatencyRig<S, T, P, G, C>, ordinal: u32) -> Self {
        let cadence = FlickerCadence::new(rig.config.fps_report_interval);
        Self {
            rig,
            ordinal,
            phase: FlickerPhase::White,
            frames: FrameLog::default(),
            cadence,
            last_frame_at: None,
        }
    }

    pub fn run(mut self) -> TrialOutcome {
        let mut state = TrialState::Init;
        while !state.is_terminal() {
            let next = self.step(state);
            debug!(trial = self.ordinal, state = next.name(), "trial state");
            state = next;
        }
        self.teardown();
        state
            .into_outcome()
            .unwrap_or(TrialOutcome::Abort)
    }

    fn step(&mut self, state: TrialState) -> TrialState {
        match state {
            TrialState::Init => self.start_streaming(),
            TrialState::AwaitLink => self.await_link(),
            TrialState::AwaitBaseline => self.await_baseline(),
            TrialState::Armed {
                baseline,
                captured_at,
            } => self.armed(baseline, captured_at),
            TrialState::Triggered {
                sensing_delay_us,
                drawing_delay_us,
            } => self.await_ack(sensing_delay_us, drawing_delay_us),
            terminal => terminal,
        }
    }

    fn start_streaming(&mut self) -> TrialState {
        if let Err(state) = self.show(Stimulus::IdleBlack) {
            return state;
        }

        let rig = &mut *self.rig;
        rig.tracker.set_offline_mode();
        rig.timer.sleep(rig.config.mode_switch_delay());

        match rig.tracker.start_streaming(StreamFlags::LINK_ONLY) {
            Ok(()) => TrialState::AwaitLink,
            // a dead link ends the run, not just the trial
            Err(e @ TrackerError::Connect(_)) => {
                warn!(trial = self.ordinal, error = %e, "tracker link lost");
                TrialState::Aborted(TrialOutcome::Abort)
            }
            Err(e) => {
                warn!(trial = self.ordinal, error = %e, "tracker did not start streaming");
                TrialState::Aborted(TrialOutcome::Error(TrialFault::StartStreaming(e.code())))
            }
        }
    }

    fn await_link(&mut self) -> TrialState {
        let timeout = self.rig.config.sample_wait_timeout();
        if !self.rig.tracker.wait_for_stream_start(timeout) {
            if let Err(state) = self.show(Stimulus::IdleBlack) {
                return state;
            }
            warn!(trial = self.ordinal, "no link samples received");
            return TrialState::Aborted(TrialOutcome::Error(TrialFault::NoLinkSamples(
                timeout.as_millis() as u64,
            )));
        }
        self.rig.tracker.flush_input();
        TrialState::AwaitBaseline
    }

    fn await_baseline(&mut self) -> TrialState {
        let rig = &mut *self.rig;
        let limit = rig.config.baseline_timeout();
        let started = rig.timer.now();
        loop {
            if let Some(sample) = rig.tracker.poll_sample() {
                if sample.valid {
                    return TrialState::Armed {
                        baseline: sample,
                        captured_at: rig.timer.now(),
                    };
                }
            }
            if let Some(limit) = limit {
                if rig.timer.elapsed(started) >= limit {
                    warn!(trial = self.ordinal, "no valid baseline sample");
                    return TrialState::Aborted(TrialOutcome::Error(TrialFault::NoBaseline(
                        limit.as_millis() as u64,
                    )));
                }
            }
            std::hint::spin_loop();
        }
    }

    fn armed(&mut self, baseline: GazeSample, captured_at: u64) -> TrialState {
        let threshold = self.rig.config.threshold;
        loop {
            if let Some(outcome) = self.interruption() {
                return TrialState::Aborted(outcome);
            }

            if let Some(candidate) = self.rig.tracker.poll_sample() {
                if evaluate(&baseline, &candidate, threshold) {
                    let sensing_delay_us = self.rig.timer.elapsed(captured_at).as_micros() as u64;
                    debug!(
                        trial = self.ordinal,
                        dx = candidate.x - baseline.x,
                        dy = candidate.y - baseline.y,
                        sensing_delay_us,
                        "gaze shift detected"
                    );
                    return self.fire(sensing_delay_us);
                }
            }

            if let Err(state) = self.show_idle() {
                return state;
            }
        }
    }

    /// Operator and link checks done at the top of every armed iteration.
    fn interruption(&mut self) -> Option<TrialOutcome> {
        let rig = &mut *self.rig;
        if !rig.tracker.is_connected() {
            warn!(trial = self.ordinal, "tracker link lost");
            return Some(TrialOutcome::Abort);
        }
        if rig.signals.abort_requested() {
            return Some(TrialOutcome::Abort);
        }
        if rig.signals.skip_requested() {
            return Some(TrialOutcome::Skip);
        }
        if rig.signals.repeat_requested() {
            return Some(TrialOutcome::Repeat);
        }
        None
    }

    fn fire(&mut self, sensing_delay_us: u64) -> TrialState {
        let mut phase = FlickerPhase::White;

        let started = self.rig.timer.now();
        if let Err(state) = self.show(Stimulus::triggered(phase)) {
            return state;
        }
        let drawing_delay_us = self.rig.timer.elapsed(started).as_micros() as u64;

        for _ in 1..self.rig.config.triggered_frames {
            phase = phase.next();
            if let Err(state) = self.show(Stimulus::triggered(phase)) {
                return state;
            }
        }

        match self.rig.transport.send_trigger() {
            Ok(()) => TrialState::Triggered {
                sensing_delay_us,
                drawing_delay_us,
            },
            Err(e) => {
                warn!(trial = self.ordinal, error = %e, "trigger not sent");
                TrialState::Aborted(TrialOutcome::Error(TrialFault::TransportWrite(
                    e.to_string(),
                )))
            }
        }
    }

    fn await_ack(&mut self, sensing_delay_us: u64, drawing_delay_us: u64) -> TrialState {
        match self.rig.transport.receive_ack() {
            Ok(raw) => TrialState::Done(TrialOutcome::Ok(TimingRecord {
                sensing_delay_us,
                drawing_delay_us,
                e2e_token: terminate_token(&raw),
            })),
            Err(e) => {
                warn!(trial = self.ordinal, error = %e, "acknowledgement not received");
                TrialState::Done(TrialOutcome::Error(TrialFault::TransportRead(e.to_string())))
            }
        }
    }

    fn show(&mut self, stimulus: Stimulus) -> Result<(), TrialState> {
        self.rig.presenter.present(stimulus).map_err(|e| {
            warn!(trial = self.ordinal, error = %e, "display failed");
            TrialState::Aborted(TrialOutcome::Abort)
        })
    }

    fn show_idle(&mut self) -> Result<(), TrialState> {
        self.show(Stimulus::idle(self.phase))?;
        self.phase = self.phase.next();

        let now = self.rig.timer.now();
        if let Some(prev) = self.last_frame_at {
            self.frames
                .record_frame(Duration::from_nanos(now.saturating_sub(prev)));
        }
        self.last_frame_at = Some(now);

        if let Some(report) = self.cadence.tick(now) {
            debug!(
                trial = self.ordinal,
                frames = report.frames,
                ms_elapsed = report.ms_elapsed,
                fps = report.fps,
                "flicker cadence"
            );
        }
        Ok(())
    }

    fn teardown(&mut self) {
        let rig = &mut *self.rig;
        rig.timer.sleep(rig.config.trailing_window());
        rig.tracker.stop_streaming();
        rig.tracker.flush_input();
        rig.signals.drain();

        if !self.frames.is_empty() {
            let stats = self.frames.stats();
            debug!(
                trial = self.ordinal,
                frames = self.cadence.frames(),
                mean_ms = stats.average_frame_time_ns / 1e6,
                jitter_ms = stats.jitter_ns / 1e6,
                min_ms = stats.min_frame_time_ns / 1e6,
                max_ms = stats.max_frame_time_ns / 1e6,
                fps = stats.effective_fps,
                "idle frame intervals"
            );
        }
    }
}

/// Frame-rate report emitted every `interval` idle frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadenceReport {
    pub frames: u64,
    pub ms_elapsed: u64,
    pub fps: f64,
}

/// Counts idle frames since the first one; 0 disables the report.
#[derive(Debug, Clone)]
pub struct FlickerCadence {
    interval: u64,
    frames: u64,
    first_at: Option<u64>,
}

impl FlickerCadence {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            frames: 0,
            first_at: None,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Counts a frame presented at `now` (ns) and returns a report when one
    /// is due.
    pub fn tick(&mut self, now: u64) -> Option<CadenceReport> {
        let first = *self.first_at.get_or_insert(now);
        self.frames += 1;
        if self.interval == 0 || self.frames % self.interval != 0 {
            return None;
        }
        let ms_elapsed = Duration::from_nanos(now.saturating_sub(first)).as_millis() as u64;
        let fps = if ms_elapsed > 0 {
            1000.0 * self.frames as f64 / ms_elapsed as f64
        } else {
            0.0
        };
        Some(CadenceReport {
            frames: self.frames,
            ms_elapsed,
            fps,
        })
    }
}

/// Applies the NUL termination of the fixed read buffer and drops the line
/// ending so the token cannot split a CSV row.
fn terminate_token(raw: &str) -> String {
    let payload = raw.split('\0').next().unwrap_or_default();
    payload.trim_end_matches(['\r', '\n']).to_string()
}
