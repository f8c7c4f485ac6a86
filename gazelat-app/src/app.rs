//! Opens the rig's devices, runs the experiment and writes the results.

use std::fs;

use anyhow::Context;
use gazelat_core::{
    DisplayError, PacingMode, SampleSource, SignalFlags, Stimulus, StimulusPresenter,
    TransportError, TriggerTransport,
};
use gazelat_devices::{LoopbackTrigger, SerialTrigger, SimulatedTracker};
use gazelat_experiment::{ExperimentRunner, LatencyRig, RunReport, TimingRecorder};
use gazelat_render::{FrameLayout, HeadlessPresenter, StimulusFrames, WindowOptions, WindowPresenter};
use gazelat_timing::HighPrecisionTimer;
use tracing::info;

use crate::config::{AppConfig, TriggerKind};

pub enum Trigger {
    Serial(SerialTrigger),
    Loopback(LoopbackTrigger),
}

impl TriggerTransport for Trigger {
    fn send_trigger(&mut self) -> Result<(), TransportError> {
        match self {
            Trigger::Serial(t) => t.send_trigger(),
            Trigger::Loopback(t) => t.send_trigger(),
        }
    }

    fn receive_ack(&mut self) -> Result<String, TransportError> {
        match self {
            Trigger::Serial(t) => t.receive_ack(),
            Trigger::Loopback(t) => t.receive_ack(),
        }
    }
}

pub enum Presenter {
    Window(WindowPresenter),
    Headless(HeadlessPresenter),
}

impl StimulusPresenter for Presenter {
    fn present(&mut self, stimulus: Stimulus) -> Result<(), DisplayError> {
        match self {
            Presenter::Window(p) => p.present(stimulus),
            Presenter::Headless(p) => p.present(stimulus),
        }
    }

    fn pacing(&self) -> PacingMode {
        match self {
            Presenter::Window(p) => p.pacing(),
            Presenter::Headless(p) => p.pacing(),
        }
    }
}

/// Runs the configured experiment. `signals` is shared with whatever listens
/// to the operator outside the display, such as the Ctrl-C handler.
pub fn run(config: &AppConfig, signals: SignalFlags) -> anyhow::Result<RunReport> {
    config.validate().context("invalid configuration")?;

    let tracker = open_tracker(config)?;
    let transport = open_trigger(config)?;
    let presenter = open_presenter(config, signals.clone())?;
    let recorder = TimingRecorder::create(&config.output.log_path).with_context(|| {
        format!("failed to create results log {}", config.output.log_path.display())
    })?;

    info!(
        trials = config.experiment.trial_count,
        threshold = config.experiment.threshold.axis_threshold,
        pacing = ?presenter.pacing(),
        log = %config.output.log_path.display(),
        "starting experiment"
    );

    let mut rig = LatencyRig::new(
        tracker,
        transport,
        presenter,
        signals,
        HighPrecisionTimer::new(),
        config.experiment.clone(),
    );
    let mut runner = ExperimentRunner::new(config.experiment.clone(), recorder);
    let report = runner.run(&mut rig).context("failed to write results log")?;

    if let Some(path) = &config.output.summary_path {
        let json = report.to_json().context("failed to serialize run report")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write run summary {}", path.display()))?;
    }
    Ok(report)
}

fn open_tracker(config: &AppConfig) -> anyhow::Result<SimulatedTracker> {
    let mut params = config.tracker.clone();
    params.screen_width = config.display.width as f32;
    params.screen_height = config.display.height as f32;

    let mut tracker = SimulatedTracker::new(params);
    tracker.connect().context("failed to connect to the tracker")?;
    tracker.set_offline_mode();
    tracker.flush_input();
    Ok(tracker)
}

fn open_trigger(config: &AppConfig) -> anyhow::Result<Trigger> {
    let t = &config.trigger;
    Ok(match t.kind {
        TriggerKind::Serial => Trigger::Serial(
            SerialTrigger::open(&t.device, t.baud, config.experiment.ack_timeout())
                .with_context(|| format!("failed to open trigger port {}", t.device))?,
        ),
        TriggerKind::Loopback => Trigger::Loopback(LoopbackTrigger::new()),
    })
}

fn open_presenter(config: &AppConfig, signals: SignalFlags) -> anyhow::Result<Presenter> {
    let d = &config.display;
    let frames = StimulusFrames::build(FrameLayout {
        width: d.width,
        height: d.height,
        box_size: d.box_size,
    })
    .context("failed to build stimulus frames")?;

    if d.headless {
        return Ok(Presenter::Headless(HeadlessPresenter::new(
            frames,
            d.pacing,
            d.refresh_hz,
        )));
    }
    let options = WindowOptions {
        fullscreen: d.fullscreen,
        pacing: d.pacing,
    };
    let window = WindowPresenter::open(frames, options, signals).context("failed to open the display")?;
    Ok(Presenter::Window(window))
}
