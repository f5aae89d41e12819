//! The device object model.
//!
//! A machine is a tree of devices: CPUs, bus controllers, peripherals,
//! cards plugged into slots. Devices are developed independently and
//! composed without a common base class; what a device can *do* is expressed
//! through capability interfaces registered per kind (execute, slot, nvram,
//! rtc, sound, snapshot) and discovered by query at run time.
//!
//! Lifecycle is two-phase:
//!
//! 1. **configure**: [`MachineConfig`] collects devices, their clocks, their
//!    interfaces and hooks. Nothing cross-device is resolved yet, so
//!    front-of-tree devices can reference back-of-tree devices freely.
//! 2. **build/start**: [`MachineConfig::build`] validates the whole
//!    description (tag syntax and uniqueness, parent existence, one
//!    interface per kind, slot option validity), assembles the
//!    [`DeviceTree`], and runs every device's start hook, which is the first
//!    point where tag lookups are guaranteed to resolve.
//!
//! Wiring mistakes are [`ConfigError`]s out of `build`, never runtime
//! surprises. After start, [`DeviceTree::reset`] is repeatable and restores
//! runtime state without touching tree shape.

#![forbid(unsafe_code)]

mod config;
mod interface;
mod options;
mod reset;
mod tag;
mod tree;

pub use config::{ConfigError, DeviceBuilder, MachineConfig};
pub use interface::{
    InterfaceKind, InterfaceSet, NvramDevice, RtcDevice, RtcTime, SlotInterface, SoundDevice,
};
pub use options::MachineOptions;
pub use reset::{ResetKind, ResetLatch};
pub use tag::DeviceTag;
pub use tree::{DeviceId, DeviceNode, DeviceTree};
