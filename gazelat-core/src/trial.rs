use serde::{Deserialize, Serialize};

use crate::error::TrialFault;

/// Latencies measured by one successful trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub sensing_delay_us: u64,
    pub drawing_delay_us: u64,
    /// Free text echoed by the external device; kept verbatim.
    pub e2e_token: String,
}

/// Terminal result of one trial attempt.
///
/// A [`TimingRecord`] only exists inside `Ok`, so a record can never be
/// written for a trial that did not complete.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Ok(TimingRecord),
    Repeat,
    Skip,
    Abort,
    Error(TrialFault),
}

impl TrialOutcome {
    pub fn record(&self) -> Option<&TimingRecord> {
        match self {
            TrialOutcome::Ok(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, TrialOutcome::Ok(_))
    }

    /// Status line printed once the trial is over.
    pub fn status_line(&self) -> &'static str {
        match self {
            TrialOutcome::Ok(_) => "TRIAL OK",
            TrialOutcome::Repeat => "TRIAL REPEATED",
            TrialOutcome::Skip => "TRIAL ABORTED",
            TrialOutcome::Abort => "EXPERIMENT ABORTED",
            TrialOutcome::Error(_) => "TRIAL ERROR",
        }
    }
}

/// How a whole run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Aborted,
}
