//! PowerPC 403 interpreter core.
//!
//! Implements the execution contract from `coinop-cpu` over a big-endian
//! `coinop-mem` address space: budget-driven bursts, input lines sampled at
//! instruction boundaries, interrupts as state transitions through the
//! EVPR-relative vectors, and a full named-register state table.
//!
//! The integer subset covers what 4xx-era arcade firmware leans on:
//! D/X-form arithmetic and logicals, `rlwinm`, compares, the four branch
//! forms, byte/half/word loads and stores (displacement, indexed, and the
//! update variants of both), and the supervisor set
//! (`mfspr`/`mtspr`/`mfmsr`/`mtmsr`/`sc`/`rfi`). Anything outside it takes
//! the program interrupt, same as reserved encodings.

#![forbid(unsafe_code)]

mod alu;
mod interp;
mod regs;
mod snapshot;

pub use interp::{Ppc403, EXT_IRQ_LINE, RESET_PC};
pub use regs::{Regs, MSR_EE, MSR_PR, MSR_WE, PVR_VALUE, XER_CA, XER_OV, XER_SO};
pub use regs::{VECTOR_EXTERNAL, VECTOR_PROGRAM, VECTOR_SYSCALL};
