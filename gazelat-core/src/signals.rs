use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::device::OperatorSignals;

/// Shared flags raised by whatever listens to the operator (window keys, a
/// Ctrl-C handler) and consumed by the trial controller.
#[derive(Debug, Clone, Default)]
pub struct SignalFlags {
    abort: Arc<AtomicBool>,
    skip: Arc<AtomicBool>,
    repeat: Arc<AtomicBool>,
}

impl SignalFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise_abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn raise_skip(&self) {
        self.skip.store(true, Ordering::SeqCst);
    }

    pub fn raise_repeat(&self) {
        self.repeat.store(true, Ordering::SeqCst);
    }
}

impl OperatorSignals for SignalFlags {
    fn abort_requested(&mut self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    // skip and repeat are one-shot: reading them consumes the request
    fn skip_requested(&mut self) -> bool {
        self.skip.swap(false, Ordering::SeqCst)
    }

    fn repeat_requested(&mut self) -> bool {
        self.repeat.swap(false, Ordering::SeqCst)
    }

    fn drain(&mut self) {
        self.skip.store(false, Ordering::SeqCst);
        self.repeat.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let mut flags = SignalFlags::new();
        let listener = flags.clone();
        listener.raise_skip();
        assert!(flags.skip_requested());
        assert!(!flags.skip_requested());
    }

    #[test]
    fn drain_keeps_abort() {
        let mut flags = SignalFlags::new();
        flags.raise_abort();
        flags.raise_repeat();
        flags.drain();
        assert!(!flags.repeat_requested());
        assert!(flags.abort_requested());
    }
}
