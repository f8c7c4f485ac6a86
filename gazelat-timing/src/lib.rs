pub mod frames;
pub mod timer;

pub use frames::{FrameLog, FrameStats};
pub use timer::{HighPrecisionTimer, Timer};
