use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("tracker connection failed: {0}")]
    Connect(String),

    #[error("start of data streaming failed with code {code}")]
    StartStreaming { code: i32 },
}

impl TrackerError {
    /// Code the tracker reported, or -1 when the link itself failed.
    pub fn code(&self) -> i32 {
        match self {
            TrackerError::Connect(_) => -1,
            TrackerError::StartStreaming { code } => *code,
        }
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("trigger write consumed {written} bytes, expected 1")]
    ShortWrite { written: usize },

    #[error("no acknowledgement within {timeout_ms} ms")]
    AckTimeout { timeout_ms: u64 },

    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
#[error("presentation failed: {0}")]
pub struct DisplayError(pub String);

/// Why a trial ended with `TrialOutcome::Error`.
///
/// Hardware errors are flattened to text here so outcomes stay cloneable and
/// comparable; the original error is logged where it is caught.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrialFault {
    #[error("start of data streaming failed with code {0}")]
    StartStreaming(i32),

    #[error("no link samples received within {0} ms")]
    NoLinkSamples(u64),

    #[error("no valid baseline sample within {0} ms")]
    NoBaseline(u64),

    #[error("trigger write failed: {0}")]
    TransportWrite(String),

    #[error("acknowledgement read failed: {0}")]
    TransportRead(String),
}

impl TrialFault {
    /// Numeric category shown on the status line.
    pub fn code(&self) -> i32 {
        match self {
            TrialFault::StartStreaming(code) => *code,
            TrialFault::NoLinkSamples(_) => -2,
            TrialFault::NoBaseline(_) => -3,
            TrialFault::TransportWrite(_) => -4,
            TrialFault::TransportRead(_) => -5,
        }
    }
}
