use std::time::Instant;

use gazelat_core::{TransportError, TriggerTransport};

/// In-process stand-in for the microcontroller: acknowledges with the
/// microseconds elapsed since the trigger was sent.
#[derive(Debug, Default)]
pub struct LoopbackTrigger {
    sent_at: Option<Instant>,
}

impl LoopbackTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerTransport for LoopbackTrigger {
    fn send_trigger(&mut self) -> Result<(), TransportError> {
        self.sent_at = Some(Instant::now());
        Ok(())
    }

    fn receive_ack(&mut self) -> Result<String, TransportError> {
        Ok(self
            .sent_at
            .take()
            .map(|t| t.elapsed().as_micros().to_string())
            .unwrap_or_default())
    }
}
