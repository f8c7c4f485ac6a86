#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use gazelat_core::{
    DisplayError, Eye, GazeSample, OperatorSignals, PacingMode, SampleSource, SignalFlags,
    Stimulus, StimulusPresenter, StreamFlags, TrackerError, TransportError, TriggerTransport,
};
use gazelat_experiment::{ExperimentConfig, LatencyRig};
use gazelat_timing::Timer;

pub const FRAME_NS: u64 = 16_667_000;

/// Every externally visible action, in the order the controller made it.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Offline,
    StartStreaming,
    Poll(Option<GazeSample>),
    FlushInput,
    StopStreaming,
    Present(Stimulus),
    SendTrigger,
    ReceiveAck,
    Sleep(Duration),
}

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    pub fn push(&self, e: Event) {
        self.0.borrow_mut().push(e);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn presented(&self) -> Vec<Stimulus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Present(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, wanted: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == wanted)
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }
}

/// Clock that only moves when a fake says so.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
    journal: Journal,
}

impl ManualClock {
    pub fn new(journal: Journal) -> Self {
        Self {
            now: Rc::new(Cell::new(0)),
            journal,
        }
    }

    pub fn advance(&self, ns: u64) {
        self.now.set(self.now.get() + ns);
    }
}

impl Timer for ManualClock {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.now.get()
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now.get().saturating_sub(ts))
    }

    fn sleep(&self, d: Duration) {
        self.journal.push(Event::Sleep(d));
        self.advance(d.as_nanos() as u64);
    }
}

pub fn sample(x: f32, y: f32) -> GazeSample {
    GazeSample::new(x, y, 10.0, Eye::Right)
}

pub struct ScriptedTracker {
    pub polls: VecDeque<Option<GazeSample>>,
    pub stream_starts: VecDeque<bool>,
    pub start_error: Option<TrackerError>,
    pub connected: Rc<Cell<bool>>,
    pub poll_cost_ns: u64,
    clock: ManualClock,
    journal: Journal,
}

impl ScriptedTracker {
    pub fn new(clock: ManualClock, journal: Journal) -> Self {
        Self {
            polls: VecDeque::new(),
            stream_starts: VecDeque::new(),
            start_error: None,
            connected: Rc::new(Cell::new(true)),
            poll_cost_ns: 0,
            clock,
            journal,
        }
    }

    pub fn script(&mut self, polls: impl IntoIterator<Item = Option<GazeSample>>) {
        self.polls.extend(polls);
    }
}

impl SampleSource for ScriptedTracker {
    fn connect(&mut self) -> Result<(), TrackerError> {
        Ok(())
    }

    fn set_offline_mode(&mut self) {
        self.journal.push(Event::Offline);
    }

    fn start_streaming(&mut self, flags: StreamFlags) -> Result<(), TrackerError> {
        assert_eq!(flags, StreamFlags::LINK_ONLY);
        self.journal.push(Event::StartStreaming);
        match self.start_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn wait_for_stream_start(&mut self, _timeout: Duration) -> bool {
        self.stream_starts.pop_front().unwrap_or(true)
    }

    fn poll_sample(&mut self) -> Option<GazeSample> {
        self.clock.advance(self.poll_cost_ns);
        let next = self.polls.pop_front().flatten();
        self.journal.push(Event::Poll(next));
        next
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }

    fn flush_input(&mut self) {
        self.journal.push(Event::FlushInput);
    }

    fn stop_streaming(&mut self) {
        self.journal.push(Event::StopStreaming);
    }
}

pub struct FakeTransport {
    pub send_error: Option<TransportError>,
    pub acks: VecDeque<Result<String, TransportError>>,
    journal: Journal,
}

impl FakeTransport {
    pub fn new(journal: Journal) -> Self {
        Self {
            send_error: None,
            acks: VecDeque::new(),
            journal,
        }
    }
}

impl TriggerTransport for FakeTransport {
    fn send_trigger(&mut self) -> Result<(), TransportError> {
        self.journal.push(Event::SendTrigger);
        match self.send_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn receive_ack(&mut self) -> Result<String, TransportError> {
        self.journal.push(Event::ReceiveAck);
        self.acks
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Io(io::ErrorKind::BrokenPipe.into())))
    }
}

/// Presents by advancing the clock one refresh period, and can raise operator
/// signals after a given number of frames.
pub struct FakePresenter {
    pub frame_ns: u64,
    pub fail_at: Option<usize>,
    pub skip_at: Option<usize>,
    pub abort_at: Option<usize>,
    pub repeat_at: Option<usize>,
    pub drop_link_at: Option<(usize, Rc<Cell<bool>>)>,
    frames: usize,
    signals: SignalFlags,
    clock: ManualClock,
    journal: Journal,
}

impl FakePresenter {
    pub fn new(clock: ManualClock, signals: SignalFlags, journal: Journal) -> Self {
        Self {
            frame_ns: FRAME_NS,
            fail_at: None,
            skip_at: None,
            abort_at: None,
            repeat_at: None,
            drop_link_at: None,
            frames: 0,
            signals,
            clock,
            journal,
        }
    }
}

impl StimulusPresenter for FakePresenter {
    fn present(&mut self, stimulus: Stimulus) -> Result<(), DisplayError> {
        self.frames += 1;
        if self.fail_at == Some(self.frames) {
            return Err(DisplayError("surface lost".into()));
        }
        self.journal.push(Event::Present(stimulus));
        self.clock.advance(self.frame_ns);

        if self.skip_at == Some(self.frames) {
            self.signals.raise_skip();
        }
        if self.abort_at == Some(self.frames) {
            self.signals.raise_abort();
        }
        if self.repeat_at == Some(self.frames) {
            self.signals.raise_repeat();
        }
        if let Some((at, link)) = &self.drop_link_at {
            if *at == self.frames {
                link.set(false);
            }
        }
        Ok(())
    }

    fn pacing(&self) -> PacingMode {
        PacingMode::Vsync
    }
}

pub type FakeRig = LatencyRig<ScriptedTracker, FakeTransport, FakePresenter, SignalFlags, ManualClock>;

pub struct Harness {
    pub rig: FakeRig,
    pub journal: Journal,
    pub clock: ManualClock,
    pub signals: SignalFlags,
}

impl Harness {
    pub fn new(config: ExperimentConfig) -> Self {
        let journal = Journal::default();
        let clock = ManualClock::new(journal.clone());
        let signals = SignalFlags::new();
        let rig = LatencyRig::new(
            ScriptedTracker::new(clock.clone(), journal.clone()),
            FakeTransport::new(journal.clone()),
            FakePresenter::new(clock.clone(), signals.clone(), journal.clone()),
            signals.clone(),
            clock.clone(),
            config,
        );
        Self {
            rig,
            journal,
            clock,
            signals,
        }
    }
}

/// Quick config: no settle delays so journal timings stay readable.
pub fn config(trial_count: u32) -> ExperimentConfig {
    ExperimentConfig {
        trial_count,
        mode_switch_delay_ms: 0,
        trailing_window_ms: 0,
        ..ExperimentConfig::default()
    }
}
