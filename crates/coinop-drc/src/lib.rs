//! Recompiler front-end scaffolding.
//!
//! A translation pass wants to see a run of instructions before emitting
//! code for them, so it can prune register writes and flag updates nothing
//! downstream consumes. This crate owns the ISA-independent half of that:
//! the per-instruction [`OpcodeDescriptor`] record, the
//! [`InstructionDescriber`] trait an ISA plugs in, and the
//! [`describe_sequence`] walk that strings descriptors into a bounded,
//! linked scan window. Nothing here executes or emits code; the output is
//! input for a generator living elsewhere.

#![forbid(unsafe_code)]

mod desc;
mod walker;
mod window;

pub use desc::{DescFlags, OpcodeDescriptor, RegUsage, SpecialReg};
pub use walker::{describe_sequence, DescriptorList, InstructionDescriber};
pub use window::{WindowConfig, WindowError};
