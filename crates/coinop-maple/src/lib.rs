//! Polling-bus controller for pad-class peripherals.
//!
//! The bus is host-driven: the controller walks a descriptor list in guest
//! memory, sends one framed command per entry to the peripheral on the
//! addressed port, and copies each reply to the destination the descriptor
//! names. Peripherals never initiate traffic. A silent port runs the
//! transaction into a bounded timeout instead of stalling the machine.
//!
//! [`MapleDma`] is the controller, [`MapleDevice`] the peripheral contract,
//! and [`MaplePad`] the standard controller pad.

#![forbid(unsafe_code)]

mod device;
mod dma;
pub mod frame;

pub use device::{MapleDevice, MaplePad, PadButton};
pub use dma::{
    nop_descriptor, reset_descriptor, transfer_descriptor, DmaState, MapleConfig, MapleDma,
    DMA_TIMEOUT, PORT_COUNT, REG_ENABLE, REG_LIST, REG_START, REG_STATUS, REG_WINDOW_LEN,
    STATUS_BUSY, STATUS_DONE,
};
