use coinop_types::{Cycles, LineState};

use crate::state::{StateError, StateIndex, StateTable};

/// Why a burst ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The cycle budget ran out. The final instruction may have overshot;
    /// `consumed` reflects the overshoot.
    BudgetExhausted,
    /// The core halted itself and will not run again until reset.
    Halted,
    /// The core is idle until an input line wakes it. The scheduler may
    /// skip it ahead to the next event instead of burning budget.
    WaitForInterrupt,
}

/// Result of one [`ExecuteDevice::execute_run`] burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstExit {
    /// Cycles actually consumed. At least `budget` when the exit reason is
    /// `BudgetExhausted`; possibly less for `Halted`/`WaitForInterrupt`.
    pub consumed: Cycles,
    pub reason: ExitReason,
}

/// Scheduler-facing contract of an executable core.
pub trait ExecuteDevice {
    /// Runs instructions until at least `budget` cycles are consumed or the
    /// core stops making progress. Instruction cycle costs include memory
    /// wait-states.
    ///
    /// Input lines asserted during the burst (by handlers the core itself
    /// invoked) are honored at the next instruction boundary.
    fn execute_run(&mut self, budget: Cycles) -> BurstExit;

    /// Latches an input line level. Takes effect at the next instruction
    /// boundary; never mid-instruction.
    fn execute_set_input(&mut self, line: usize, state: LineState);

    /// Total cycles consumed since reset. Monotonic; the scheduler uses it
    /// for bookkeeping and tests use it to pin down determinism.
    fn total_cycles(&self) -> u64;

    /// The core's registered state table: the named-register surface used
    /// by the debugger and save states.
    fn state_table(&self) -> &StateTable;

    /// Exports every table entry's current value, in table order.
    fn state_export(&self) -> Vec<(StateIndex, u64)>;

    /// Imports values by state index. Importing a full prior export must
    /// reproduce it bit for bit.
    fn state_import(&mut self, values: &[(StateIndex, u64)]) -> Result<(), StateError>;
}
