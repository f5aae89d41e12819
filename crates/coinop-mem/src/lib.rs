//! Memory spaces and handler dispatch.
//!
//! A CPU core or DMA engine sees one flat [`AddressSpace`] per bus it drives.
//! The space is populated at machine-configuration time with RAM, ROM and
//! handler regions; accesses at run time route to the covering region, and
//! accesses that hit nothing follow the configured unmapped policy (fill byte
//! on read, discard on write) instead of failing.
//!
//! Handler regions dispatch through [`ReadHandler`]/[`WriteHandler`]: small
//! clonable values that bind an arbitrary callable once and invoke it through
//! a single uniform shape, so a register block backed by a device method and
//! one backed by a free function look identical to the space.

#![forbid(unsafe_code)]

mod handler;
mod space;

pub use handler::{ReadHandler, WriteHandler};
pub use space::{AddressSpace, MapError};
