pub mod config;
pub mod controller;
pub mod error;
pub mod recorder;
pub mod report;
pub mod rig;
pub mod runner;

pub use config::ExperimentConfig;
pub use controller::{TrialController, TrialState};
pub use error::{ConfigError, RecorderError};
pub use recorder::{TimingRecorder, HEADER};
pub use report::RunReport;
pub use rig::LatencyRig;
pub use runner::{ExperimentRunner, TrialExecutor};
