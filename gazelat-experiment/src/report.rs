use gazelat_core::{RunStatus, TrialOutcome};
use serde::{Deserialize, Serialize};

/// Tally of one run, written next to the results log when requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    /// Controller invocations, repeats included.
    pub attempts: u32,
    pub ok: u32,
    pub repeated: u32,
    pub skipped: u32,
    pub errors: u32,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            status: RunStatus::Completed,
            attempts: 0,
            ok: 0,
            repeated: 0,
            skipped: 0,
            errors: 0,
        }
    }

    pub fn count(&mut self, outcome: &TrialOutcome) {
        self.attempts += 1;
        match outcome {
            TrialOutcome::Ok(_) => self.ok += 1,
            TrialOutcome::Repeat => self.repeated += 1,
            TrialOutcome::Skip => self.skipped += 1,
            TrialOutcome::Error(_) => self.errors += 1,
            TrialOutcome::Abort => self.status = RunStatus::Aborted,
        }
    }

    /// Trials that consumed a slot.
    pub fn completed(&self) -> u32 {
        self.ok + self.skipped + self.errors
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
