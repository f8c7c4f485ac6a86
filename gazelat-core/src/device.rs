//! Narrow interfaces to the three pieces of hardware a trial touches, plus the
//! operator's keyboard.
//!
//! The trial controller only sees these traits, so every implementation can be
//! swapped for a scripted fake.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DisplayError, TrackerError, TransportError};
use crate::sample::GazeSample;
use crate::stimulus::Stimulus;

/// What the tracker should produce once streaming starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFlags {
    pub file_samples: bool,
    pub file_events: bool,
    pub link_samples: bool,
    pub link_events: bool,
}

impl StreamFlags {
    /// Samples and events over the link only; nothing recorded on the tracker.
    pub const LINK_ONLY: StreamFlags = StreamFlags {
        file_samples: false,
        file_events: false,
        link_samples: true,
        link_events: true,
    };
}

/// Gaze tracker link.
pub trait SampleSource {
    fn connect(&mut self) -> Result<(), TrackerError>;

    /// Idle mode; the tracker must be offline before streaming can restart.
    fn set_offline_mode(&mut self);

    fn start_streaming(&mut self, flags: StreamFlags) -> Result<(), TrackerError>;

    /// Blocks until sample data is flowing, or `timeout` passes.
    fn wait_for_stream_start(&mut self, timeout: Duration) -> bool;

    /// Newest sample if one arrived since the last poll. Never blocks.
    fn poll_sample(&mut self) -> Option<GazeSample>;

    fn is_connected(&self) -> bool;

    /// Discards queued key and button events from the tracker side.
    fn flush_input(&mut self);

    fn stop_streaming(&mut self);
}

/// Serial link to the microcontroller that measures end-to-end delay.
pub trait TriggerTransport {
    /// Sends the single trigger byte and drains the output queue.
    fn send_trigger(&mut self) -> Result<(), TransportError>;

    /// Reads the device's acknowledgement. An empty string means the stream
    /// ended without payload.
    fn receive_ack(&mut self) -> Result<String, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    /// Return as soon as the frame is submitted.
    Immediate,
    /// Block until the frame is scanned out at the next vertical refresh.
    #[default]
    Vsync,
}

pub trait StimulusPresenter {
    fn present(&mut self, stimulus: Stimulus) -> Result<(), DisplayError>;

    fn pacing(&self) -> PacingMode;
}

/// Operator requests, polled between frames.
pub trait OperatorSignals {
    /// Terminate the whole run.
    fn abort_requested(&mut self) -> bool;

    /// Terminate the current trial only.
    fn skip_requested(&mut self) -> bool;

    /// Re-run the current trial without consuming its slot.
    fn repeat_requested(&mut self) -> bool;

    /// Forget pending skip/repeat requests. Abort is sticky.
    fn drain(&mut self);
}
