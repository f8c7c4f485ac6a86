pub mod frames;
pub mod headless;
pub mod window;

pub use frames::{FrameLayout, StimulusFrames};
pub use headless::HeadlessPresenter;
pub use window::{WindowOptions, WindowPresenter};
