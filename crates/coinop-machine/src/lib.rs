//! Top-level driver: owns a built device tree, runs its execute devices
//! round-robin on a deterministic cooperative schedule, ticks timer-driven
//! bus controllers at slice boundaries, and serializes whole-machine save
//! states and NVRAM.
//!
//! The scheduler grants each core a burst of at most `min_slice` cycles,
//! always in device id order. Cross-core effects (shared memory writes,
//! input lines) land at burst boundaries, so a given machine state plus a
//! given input script replays to the identical trace every time. When two
//! cores handshake through shared memory faster than the normal slice
//! allows, [`Machine::boost_interleave`] shrinks bursts to one cycle for a
//! bounded window.

#![forbid(unsafe_code)]

mod machine;
mod snapshot;
mod tick;

pub use machine::{Machine, RunExit, DEFAULT_MIN_SLICE};
pub use snapshot::RestoreError;
pub use tick::{MapleTicker, TickDevice};
