use gazelat_core::{
    OperatorSignals, SampleSource, StimulusPresenter, TriggerTransport, TrialOutcome,
};
use gazelat_timing::Timer;

use crate::config::ExperimentConfig;
use crate::controller::TrialController;
use crate::runner::TrialExecutor;

/// Everything a trial touches, opened once and lent to each trial in turn.
pub struct LatencyRig<S, T, P, G, C> {
    pub tracker: S,
    pub transport: T,
    pub presenter: P,
    pub signals: G,
    pub timer: C,
    pub config: ExperimentConfig,
}

impl<S, T, P, G, C> LatencyRig<S, T, P, G, C>
where
    S: SampleSource,
    T: TriggerTransport,
    P: StimulusPresenter,
    G: OperatorSignals,
    C: Timer<Timestamp = u64>,
{
    pub fn new(
        tracker: S,
        transport: T,
        presenter: P,
        signals: G,
        timer: C,
        config: ExperimentConfig,
    ) -> Self {
        Self {
            tracker,
            transport,
            presenter,
            signals,
            timer,
            config,
        }
    }
}

impl<S, T, P, G, C> TrialExecutor for LatencyRig<S, T, P, G, C>
where
    S: SampleSource,
    T: TriggerTransport,
    P: StimulusPresenter,
    G: OperatorSignals,
    C: Timer<Timestamp = u64>,
{
    fn link_alive(&mut self) -> bool {
        self.tracker.is_connected()
    }

    fn abort_requested(&mut self) -> bool {
        self.signals.abort_requested()
    }

    fn execute(&mut self, ordinal: u32) -> TrialOutcome {
        TrialController::new(self, ordinal).run()
    }
}
