pub mod loopback;
pub mod serial;
pub mod simulated;

pub use loopback::LoopbackTrigger;
pub use serial::{ACK_CAPACITY, SerialTrigger, TRIGGER_BYTE};
pub use simulated::{SimulatedTracker, SimulatedTrackerConfig};
