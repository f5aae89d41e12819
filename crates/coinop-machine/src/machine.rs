//! The cooperative driver.
//!
//! One logical thread of emulated time: every execute device gets a burst of
//! at most `min_slice` cycles per round, in device id order, and the round
//! order never depends on anything but the machine's own state. Timer-driven
//! devices advance at slice boundaries. Resets requested from handler
//! context are latched and applied between rounds, never mid-burst.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use coinop_cpu::{ExecuteDevice, ExitReason};
use coinop_device::{
    ConfigError, DeviceId, DeviceTree, MachineConfig, MachineOptions, ResetKind,
};
use coinop_types::{Cycles, LineState};
use tracing::{debug, info, trace};

use crate::tick::TickDevice;

/// Burst granted to each core per round unless a boost is active.
pub const DEFAULT_MIN_SLICE: Cycles = 100;

/// How a [`Machine::run`] span ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The span elapsed with at least one core still consuming budget.
    Completed,
    /// Every core parked and no timer fires inside the span. The clock
    /// still advanced to the end of the span.
    Idle,
    /// A latched hard reset was applied. The span ended early and the
    /// clock rewound to zero.
    PowerCycled,
}

/// A built device tree plus the scheduler that drives it.
pub struct Machine {
    tree: DeviceTree,
    cpus: Vec<(DeviceId, Rc<RefCell<dyn ExecuteDevice>>)>,
    tickers: Vec<Box<dyn TickDevice>>,
    min_slice: Cycles,
    boost_until: Option<u64>,
    now: u64,
}

impl Machine {
    /// Builds the device tree from its description and wraps it in a
    /// scheduler. Wiring mistakes surface here, never at run time.
    pub fn build(config: MachineConfig, options: &MachineOptions) -> Result<Self, ConfigError> {
        Ok(Self::new(config.build(options)?))
    }

    #[must_use]
    pub fn new(tree: DeviceTree) -> Self {
        let cpus: Vec<_> = tree.execute_devices().collect();
        debug!(devices = tree.len(), cores = cpus.len(), "machine assembled");
        Self {
            tree,
            cpus,
            tickers: Vec::new(),
            min_slice: DEFAULT_MIN_SLICE,
            boost_until: None,
            now: 0,
        }
    }

    #[must_use]
    pub fn tree(&self) -> &DeviceTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DeviceTree {
        &mut self.tree
    }

    /// Emulated cycles elapsed since power-on.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    #[must_use]
    pub fn min_slice(&self) -> Cycles {
        self.min_slice
    }

    pub fn set_min_slice(&mut self, slice: Cycles) {
        self.min_slice = slice.max(1);
    }

    /// Registers a timer-driven device. Tick order is registration order.
    pub fn add_ticker(&mut self, ticker: impl TickDevice + 'static) {
        self.tickers.push(Box::new(ticker));
    }

    /// Shrinks bursts to one cycle for the next `duration` cycles,
    /// tightening the interleave while two cores handshake through shared
    /// memory. Repeated requests extend the window; the normal slice
    /// restores itself when the window elapses.
    pub fn boost_interleave(&mut self, duration: u64) {
        let until = self.now.saturating_add(duration);
        let until = match self.boost_until {
            Some(current) => current.max(until),
            None => until,
        };
        self.boost_until = Some(until);
        debug!(until, "interleave boosted");
    }

    /// Latches an input-line level on the execute device at `tag`. Returns
    /// false when the tag does not name an execute device. The core honors
    /// the level at its next instruction boundary.
    pub fn set_input_line(&mut self, tag: &str, line: usize, state: LineState) -> bool {
        let Some(id) = self.tree.lookup(tag) else {
            return false;
        };
        let Some(cpu) = self.tree.query_execute(id) else {
            return false;
        };
        cpu.borrow_mut().execute_set_input(line, state);
        true
    }

    pub(crate) fn boost_until(&self) -> Option<u64> {
        self.boost_until
    }

    pub(crate) fn set_clock(&mut self, now: u64, boost_until: Option<u64>) {
        self.now = now;
        self.boost_until = boost_until;
    }

    /// Runs `span` emulated cycles. Same machine state and same inputs
    /// always produce the same interleave and the same device traffic.
    pub fn run(&mut self, span: u64) -> RunExit {
        let end = self.now.saturating_add(span);
        while self.now < end {
            if let Some(kind) = self.tree.reset_latch().take() {
                if self.apply_reset(kind) == RunExit::PowerCycled {
                    return RunExit::PowerCycled;
                }
            }

            let slice = self.slice(end);
            let mut progress = false;
            for (id, cpu) in &self.cpus {
                let burst = cpu.borrow_mut().execute_run(slice);
                trace!(
                    core = id.index(),
                    consumed = burst.consumed,
                    reason = ?burst.reason,
                    "burst"
                );
                if burst.consumed > 0 || burst.reason == ExitReason::BudgetExhausted {
                    progress = true;
                }
            }

            self.now += slice as u64;
            self.tick_all();
            self.expire_boost();

            if !progress {
                // Every core is parked. Only a timer can change anything,
                // so jump straight to the next one instead of spinning
                // through empty slices.
                match self.next_timer() {
                    Some(deadline) if deadline <= end => {
                        if deadline > self.now {
                            trace!(from = self.now, to = deadline, "idle skip");
                            self.now = deadline;
                            self.expire_boost();
                        }
                        self.tick_all();
                    }
                    _ => {
                        self.now = end;
                        self.expire_boost();
                        return RunExit::Idle;
                    }
                }
            }
        }
        RunExit::Completed
    }

    fn slice(&self, end: u64) -> Cycles {
        let base = if matches!(self.boost_until, Some(until) if until > self.now) {
            1
        } else {
            self.min_slice
        };
        (base as u64).min(end - self.now).max(1) as Cycles
    }

    fn tick_all(&mut self) {
        for ticker in &mut self.tickers {
            ticker.tick(self.now);
        }
    }

    fn expire_boost(&mut self) {
        if matches!(self.boost_until, Some(until) if until <= self.now) {
            self.boost_until = None;
            debug!(now = self.now, "interleave boost expired");
        }
    }

    fn next_timer(&self) -> Option<u64> {
        self.tickers
            .iter()
            .filter_map(|ticker| ticker.next_deadline())
            .min()
    }

    fn apply_reset(&mut self, kind: ResetKind) -> RunExit {
        info!(?kind, now = self.now, "applying latched reset");
        self.tree.reset();
        if kind == ResetKind::Hard {
            self.now = 0;
            self.boost_until = None;
            return RunExit::PowerCycled;
        }
        RunExit::Completed
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("now", &self.now)
            .field("cores", &self.cpus.len())
            .field("tickers", &self.tickers.len())
            .field("min_slice", &self.min_slice)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinop_cpu::{BurstExit, InputLine, StateError, StateIndex, StateTable};

    type Log = Rc<RefCell<Vec<(&'static str, Cycles)>>>;

    struct ScriptCore {
        name: &'static str,
        log: Log,
        line: InputLine,
        park_when_clear: bool,
        total: u64,
        table: StateTable,
    }

    impl ScriptCore {
        fn shared(name: &'static str, log: &Log) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self {
                name,
                log: log.clone(),
                line: InputLine::new(),
                park_when_clear: false,
                total: 0,
                table: StateTable::new(),
            }))
        }

        fn parked(name: &'static str, log: &Log) -> Rc<RefCell<Self>> {
            let core = Self::shared(name, log);
            core.borrow_mut().park_when_clear = true;
            core
        }
    }

    impl ExecuteDevice for ScriptCore {
        fn execute_run(&mut self, budget: Cycles) -> BurstExit {
            if self.park_when_clear && !self.line.is_asserted() {
                return BurstExit {
                    consumed: 0,
                    reason: ExitReason::WaitForInterrupt,
                };
            }
            self.log.borrow_mut().push((self.name, budget));
            self.total += budget as u64;
            BurstExit {
                consumed: budget,
                reason: ExitReason::BudgetExhausted,
            }
        }

        fn execute_set_input(&mut self, _line: usize, state: LineState) {
            self.line.set(state);
        }

        fn total_cycles(&self) -> u64 {
            self.total
        }

        fn state_table(&self) -> &StateTable {
            &self.table
        }

        fn state_export(&self) -> Vec<(StateIndex, u64)> {
            Vec::new()
        }

        fn state_import(&mut self, _values: &[(StateIndex, u64)]) -> Result<(), StateError> {
            Ok(())
        }
    }

    struct PokeTicker {
        deadline: Option<u64>,
        line: InputLine,
        ticks: Rc<RefCell<Vec<u64>>>,
    }

    impl TickDevice for PokeTicker {
        fn tick(&mut self, now: u64) {
            self.ticks.borrow_mut().push(now);
            if matches!(self.deadline, Some(due) if now >= due) {
                self.line.set(LineState::Assert);
                self.deadline = None;
            }
        }

        fn next_deadline(&self) -> Option<u64> {
            self.deadline
        }
    }

    fn two_core_machine(log: &Log) -> Machine {
        let mut cfg = MachineConfig::new();
        cfg.add_device("maincpu", 1_000_000)
            .execute(ScriptCore::shared("main", log));
        cfg.add_device("audiocpu", 1_000_000)
            .execute(ScriptCore::shared("audio", log));
        Machine::build(cfg, &MachineOptions::default()).unwrap()
    }

    #[test]
    fn bursts_round_robin_in_device_order() {
        let log: Log = Log::default();
        let mut machine = two_core_machine(&log);

        assert_eq!(machine.run(200), RunExit::Completed);
        assert_eq!(machine.now(), 200);
        assert_eq!(
            *log.borrow(),
            vec![("main", 100), ("audio", 100), ("main", 100), ("audio", 100)]
        );
    }

    #[test]
    fn a_boost_tightens_the_weave_then_restores_itself() {
        let log: Log = Log::default();
        let mut machine = two_core_machine(&log);

        machine.boost_interleave(3);
        assert_eq!(machine.run(5), RunExit::Completed);
        assert_eq!(
            *log.borrow(),
            vec![
                ("main", 1),
                ("audio", 1),
                ("main", 1),
                ("audio", 1),
                ("main", 1),
                ("audio", 1),
                ("main", 2),
                ("audio", 2),
            ]
        );
        assert_eq!(machine.boost_until(), None);
    }

    #[test]
    fn identical_machines_produce_identical_traces() {
        let log_a: Log = Log::default();
        let log_b: Log = Log::default();
        let mut a = two_core_machine(&log_a);
        let mut b = two_core_machine(&log_b);

        a.boost_interleave(7);
        b.boost_interleave(7);
        a.run(64);
        b.run(64);
        assert_eq!(*log_a.borrow(), *log_b.borrow());
    }

    #[test]
    fn a_parked_machine_jumps_to_the_next_timer() {
        let log: Log = Log::default();
        let core = ScriptCore::parked("main", &log);
        let line = core.borrow().line.clone();
        let mut cfg = MachineConfig::new();
        cfg.add_device("maincpu", 1_000_000).execute(core);
        let mut machine = Machine::build(cfg, &MachineOptions::default()).unwrap();

        let ticks = Rc::new(RefCell::new(Vec::new()));
        machine.add_ticker(PokeTicker {
            deadline: Some(250),
            line,
            ticks: ticks.clone(),
        });

        assert_eq!(machine.run(1000), RunExit::Completed);
        assert_eq!(machine.now(), 1000);
        // The wake tick happened at exactly the deadline, not at a later
        // slice boundary.
        assert!(ticks.borrow().contains(&250));
        // Before the wake the core never burned budget; afterwards it ran.
        assert_eq!(log.borrow().first(), Some(&("main", 100)));
    }

    #[test]
    fn a_machine_with_nothing_scheduled_exits_idle() {
        let log: Log = Log::default();
        let core = ScriptCore::parked("main", &log);
        let mut cfg = MachineConfig::new();
        cfg.add_device("maincpu", 1_000_000).execute(core);
        let mut machine = Machine::build(cfg, &MachineOptions::default()).unwrap();

        assert_eq!(machine.run(500), RunExit::Idle);
        assert_eq!(machine.now(), 500);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn a_soft_reset_applies_at_the_boundary_and_the_run_continues() {
        let log: Log = Log::default();
        let resets = Rc::new(RefCell::new(0u32));
        let seen = resets.clone();
        let mut cfg = MachineConfig::new();
        cfg.add_device("maincpu", 1_000_000)
            .execute(ScriptCore::shared("main", &log))
            .on_reset(move || *seen.borrow_mut() += 1);
        let mut machine = Machine::build(cfg, &MachineOptions::default()).unwrap();

        machine.tree().reset_latch().request(ResetKind::Soft);
        assert_eq!(machine.run(200), RunExit::Completed);
        assert_eq!(*resets.borrow(), 1);
        assert_eq!(machine.now(), 200);
    }

    #[test]
    fn a_hard_reset_power_cycles_and_rewinds_the_clock() {
        let log: Log = Log::default();
        let resets = Rc::new(RefCell::new(0u32));
        let seen = resets.clone();
        let mut cfg = MachineConfig::new();
        cfg.add_device("maincpu", 1_000_000)
            .execute(ScriptCore::shared("main", &log))
            .on_reset(move || *seen.borrow_mut() += 1);
        let mut machine = Machine::build(cfg, &MachineOptions::default()).unwrap();

        machine.run(300);
        machine.boost_interleave(50);
        machine.tree().reset_latch().request(ResetKind::Hard);
        assert_eq!(machine.run(200), RunExit::PowerCycled);
        assert_eq!(*resets.borrow(), 1);
        assert_eq!(machine.now(), 0);
        assert_eq!(machine.boost_until(), None);

        assert_eq!(machine.run(100), RunExit::Completed);
        assert_eq!(machine.now(), 100);
    }

    #[test]
    fn input_lines_reach_the_named_core() {
        let log: Log = Log::default();
        let core = ScriptCore::parked("main", &log);
        let mut cfg = MachineConfig::new();
        cfg.add_device("maincpu", 1_000_000).execute(core);
        let mut machine = Machine::build(cfg, &MachineOptions::default()).unwrap();

        assert!(!machine.set_input_line("nosuch", 0, LineState::Assert));
        assert_eq!(machine.run(100), RunExit::Idle);
        assert!(log.borrow().is_empty());

        assert!(machine.set_input_line("maincpu", 0, LineState::Assert));
        assert_eq!(machine.run(100), RunExit::Completed);
        assert_eq!(*log.borrow(), vec![("main", 100)]);
    }
}
