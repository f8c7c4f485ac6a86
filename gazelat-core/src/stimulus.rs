/// Which half of the flicker cycle is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlickerPhase {
    White,
    #[default]
    Black,
}

impl FlickerPhase {
    pub fn next(self) -> Self {
        match self {
            FlickerPhase::White => FlickerPhase::Black,
            FlickerPhase::Black => FlickerPhase::White,
        }
    }
}

/// The four canonical frames of a trial. Presenters precompute one buffer per
/// variant; the controller only ever selects among them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stimulus {
    IdleWhite,
    IdleBlack,
    TriggeredWhite,
    TriggeredBlack,
}

impl Stimulus {
    pub const ALL: [Stimulus; 4] = [
        Stimulus::IdleWhite,
        Stimulus::IdleBlack,
        Stimulus::TriggeredWhite,
        Stimulus::TriggeredBlack,
    ];

    pub fn idle(phase: FlickerPhase) -> Self {
        match phase {
            FlickerPhase::White => Stimulus::IdleWhite,
            FlickerPhase::Black => Stimulus::IdleBlack,
        }
    }

    pub fn triggered(phase: FlickerPhase) -> Self {
        match phase {
            FlickerPhase::White => Stimulus::TriggeredWhite,
            FlickerPhase::Black => Stimulus::TriggeredBlack,
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, Stimulus::TriggeredWhite | Stimulus::TriggeredBlack)
    }

    pub fn index(&self) -> usize {
        match self {
            Stimulus::IdleWhite => 0,
            Stimulus::IdleBlack => 1,
            Stimulus::TriggeredWhite => 2,
            Stimulus::TriggeredBlack => 3,
        }
    }
}
