//! PowerPC front-end for the recompiler scaffolding.
//!
//! [`PpcDescriber`] classifies the same integer subset the interpreter
//! executes, one flavor per instance, and plugs into
//! `coinop_drc::describe_sequence`. Opcodes outside the subset, invalid
//! forms, and SPRs the flavor does not carry are refused rather than
//! guessed at, which sends those addresses back to the interpreter.

#![forbid(unsafe_code)]

mod describe;

pub use describe::PpcDescriber;
