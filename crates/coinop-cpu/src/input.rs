use std::cell::Cell;
use std::rc::Rc;

use coinop_types::LineState;

/// A shared input-line latch.
///
/// Devices and the scheduler set the level from outside at any time; the
/// owning core samples it at instruction boundaries. Peers never hold a
/// borrow of the core itself, only of the shared `Cell`, so a line may be
/// flipped while the core is mid-burst.
#[derive(Debug, Clone, Default)]
pub struct InputLine {
    state: Rc<Cell<LineState>>,
}

impl InputLine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, state: LineState) {
        self.state.set(state);
    }

    #[must_use]
    pub fn get(&self) -> LineState {
        self.state.get()
    }

    #[inline]
    #[must_use]
    pub fn is_asserted(&self) -> bool {
        self.state.get().is_asserted()
    }
}
