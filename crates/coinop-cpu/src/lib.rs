//! The execution contract between CPU cores and the scheduler.
//!
//! A core is driven in bursts: the scheduler hands it a cycle budget,
//! [`ExecuteDevice::execute_run`] consumes instructions until the budget is
//! spent (or the core halts), and reports what actually happened. Everything
//! asynchronous (interrupt lines, reset requests) is latched from outside
//! and observed by the core at instruction boundaries, never mid-instruction.
//!
//! Architectural faults (illegal opcode, syscall, division traps) are not
//! errors at this layer. A real CPU redirects control flow to a vector and
//! keeps running; cores here do the same, so `execute_run` has no error
//! path.

#![forbid(unsafe_code)]

mod exec;
mod input;
mod state;

pub use exec::{BurstExit, ExecuteDevice, ExitReason};
pub use input::InputLine;
pub use state::{StateEntry, StateError, StateIndex, StateTable};
