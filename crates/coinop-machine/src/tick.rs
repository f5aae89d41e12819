//! Clock-driven devices the machine advances between bursts.

use std::cell::RefCell;
use std::rc::Rc;

use coinop_maple::MapleDma;
use coinop_mem::AddressSpace;

/// Contract of devices that advance on the machine clock: bus controllers
/// whose waits are timer events rather than blocking calls. The machine
/// ticks every registered device at each slice boundary and uses the
/// deadlines to jump over stretches where every core is parked.
pub trait TickDevice {
    /// Runs all work due at or before `now`.
    fn tick(&mut self, now: u64);

    /// Earliest pending deadline, if any work is scheduled.
    fn next_deadline(&self) -> Option<u64>;
}

/// [`MapleDma`] driven against the space its descriptor lists live in.
///
/// The controller only latches register writes during CPU bursts; the
/// actual walk happens here, where the space is free of handler borrows.
pub struct MapleTicker {
    dma: Rc<RefCell<MapleDma>>,
    space: Rc<RefCell<AddressSpace>>,
}

impl MapleTicker {
    #[must_use]
    pub fn new(dma: Rc<RefCell<MapleDma>>, space: Rc<RefCell<AddressSpace>>) -> Self {
        Self { dma, space }
    }
}

impl TickDevice for MapleTicker {
    fn tick(&mut self, now: u64) {
        let mut space = self.space.borrow_mut();
        self.dma.borrow_mut().tick(&mut space, now);
    }

    fn next_deadline(&self) -> Option<u64> {
        self.dma.borrow().next_deadline()
    }
}
