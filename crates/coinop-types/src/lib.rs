//! Shared vocabulary types for the coinop emulation core.
//!
//! Kept dependency-free so every layer (memory, devices, CPU cores, bus
//! controllers) can speak the same primitives without pulling in anything
//! else.

#![forbid(unsafe_code)]

/// Guest physical address. All the systems this core targets have 32-bit
/// physical address spaces.
pub type Addr = u32;

/// Signed cycle count. Execution budgets count down through zero, so the
/// scheduler-facing type is signed even though totals are non-negative.
pub type Cycles = i64;

/// State of a device input line (interrupt request, reset request, coin
/// switch, ...). Lines are level-sensitive at this layer; edge detection is
/// the consumer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineState {
    #[default]
    Clear,
    Assert,
}

impl LineState {
    #[inline]
    #[must_use]
    pub fn is_asserted(self) -> bool {
        matches!(self, LineState::Assert)
    }
}

/// Width of a single memory access.
///
/// `Half` and `Word` follow the PowerPC naming (16 and 32 bits); the memory
/// layer only cares about the byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessWidth {
    Byte,
    Half,
    Word,
}

impl AccessWidth {
    #[inline]
    #[must_use]
    pub fn bytes(self) -> u32 {
        match self {
            AccessWidth::Byte => 1,
            AccessWidth::Half => 2,
            AccessWidth::Word => 4,
        }
    }

    #[inline]
    #[must_use]
    pub fn bits(self) -> u32 {
        self.bytes() * 8
    }

    /// Mask covering the low `bits()` of a value.
    #[inline]
    #[must_use]
    pub fn mask(self) -> u64 {
        match self {
            AccessWidth::Byte => 0xff,
            AccessWidth::Half => 0xffff,
            AccessWidth::Word => 0xffff_ffff,
        }
    }
}

/// Byte order of a memory space. Fixed per space at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}
