use std::cell::Cell;
use std::rc::Rc;

/// Reset request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Restore every device's runtime state (what a watchdog trip or the
    /// service-panel reset button does).
    Soft,
    /// Full power cycle: soft reset plus cancellation of all scheduled
    /// timer events and cycle counters.
    Hard,
}

/// Cloneable latch bridging device reset requests into the machine loop.
///
/// A device must not reset the machine from inside an access handler; the
/// handler runs under borrows that a reset would re-enter. It requests
/// through the latch instead, and the machine applies the reset at the next
/// slice boundary. The latch stores at most one pending request; if several
/// arrive before the machine consumes it, [`ResetKind::Hard`] wins.
#[derive(Debug, Clone, Default)]
pub struct ResetLatch {
    pending: Rc<Cell<Option<ResetKind>>>,
}

impl ResetLatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, kind: ResetKind) {
        let merged = match (self.pending.get(), kind) {
            (Some(ResetKind::Hard), _) | (_, ResetKind::Hard) => ResetKind::Hard,
            _ => ResetKind::Soft,
        };
        self.pending.set(Some(merged));
    }

    /// Currently pending request, left in place.
    #[must_use]
    pub fn peek(&self) -> Option<ResetKind> {
        self.pending.get()
    }

    /// Takes and clears the pending request.
    #[must_use]
    pub fn take(&self) -> Option<ResetKind> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_wins_over_soft_in_either_order() {
        let latch = ResetLatch::new();
        latch.request(ResetKind::Soft);
        latch.request(ResetKind::Hard);
        assert_eq!(latch.peek(), Some(ResetKind::Hard));

        let latch = ResetLatch::new();
        latch.request(ResetKind::Hard);
        latch.request(ResetKind::Soft);
        assert_eq!(latch.take(), Some(ResetKind::Hard));
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn clones_share_the_pending_slot() {
        let latch = ResetLatch::new();
        let device_side = latch.clone();
        device_side.request(ResetKind::Soft);
        assert_eq!(latch.take(), Some(ResetKind::Soft));
        assert_eq!(device_side.peek(), None);
    }
}
