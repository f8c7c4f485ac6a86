pub mod detector;
pub mod device;
pub mod error;
pub mod sample;
pub mod signals;
pub mod stimulus;
pub mod trial;

pub use detector::{TriggerThreshold, evaluate};
pub use device::{OperatorSignals, PacingMode, SampleSource, StimulusPresenter, StreamFlags, TriggerTransport};
pub use error::{DisplayError, TrackerError, TransportError, TrialFault};
pub use sample::{Eye, GazeSample, MISSING_DATA};
pub use signals::SignalFlags;
pub use stimulus::{FlickerPhase, Stimulus};
pub use trial::{RunStatus, TimingRecord, TrialOutcome};
