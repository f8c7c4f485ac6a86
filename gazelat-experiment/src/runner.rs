use std::io::Write;

use gazelat_core::{RunStatus, TrialOutcome};
use tracing::{info, warn};

use crate::config::ExperimentConfig;
use crate::error::RecorderError;
use crate::recorder::TimingRecorder;
use crate::report::RunReport;

/// One trial attempt plus the pre-trial checks the runner makes.
pub trait TrialExecutor {
    fn link_alive(&mut self) -> bool;
    fn abort_requested(&mut self) -> bool;
    fn execute(&mut self, ordinal: u32) -> TrialOutcome;
}

/// Drives `trial_count` trials and dispatches their outcomes.
pub struct ExperimentRunner<W: Write> {
    config: ExperimentConfig,
    recorder: TimingRecorder<W>,
}

impl<W: Write> ExperimentRunner<W> {
    pub fn new(config: ExperimentConfig, recorder: TimingRecorder<W>) -> Self {
        Self { config, recorder }
    }

    /// Runs until `trial_count` trials have consumed their slot or one aborts.
    ///
    /// Only a failure to write the results log is returned as an error; every
    /// hardware problem arrives here already folded into a [`TrialOutcome`].
    pub fn run<E: TrialExecutor>(&mut self, trials: &mut E) -> Result<RunReport, RecorderError> {
        let mut report = RunReport::new();
        let mut trial = 0;

        while trial < self.config.trial_count {
            if !trials.link_alive() || trials.abort_requested() {
                info!(trial, "EXPERIMENT ABORTED");
                report.status = RunStatus::Aborted;
                break;
            }

            let outcome = trials.execute(trial);
            report.count(&outcome);

            match &outcome {
                TrialOutcome::Abort => {
                    info!(trial, "{}", outcome.status_line());
                    break;
                }
                TrialOutcome::Repeat => {
                    info!(trial, "{}", outcome.status_line());
                    continue;
                }
                TrialOutcome::Skip => info!(trial, "{}", outcome.status_line()),
                TrialOutcome::Error(fault) => {
                    warn!(trial, code = fault.code(), reason = %fault, "{}", outcome.status_line());
                }
                TrialOutcome::Ok(record) => {
                    self.recorder.append(record)?;
                    info!(
                        trial,
                        sensing_delay_us = record.sensing_delay_us,
                        drawing_delay_us = record.drawing_delay_us,
                        token = %record.e2e_token,
                        "{}",
                        outcome.status_line()
                    );
                }
            }
            trial += 1;
        }

        info!(
            status = ?report.status,
            attempts = report.attempts,
            ok = report.ok,
            repeated = report.repeated,
            skipped = report.skipped,
            errors = report.errors,
            "run finished"
        );
        Ok(report)
    }

    pub fn recorder(&self) -> &TimingRecorder<W> {
        &self.recorder
    }
}
