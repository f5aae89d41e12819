//! SPR numbering.
//!
//! The instruction encodes the 10-bit SPR number with its halves swapped;
//! [`compute_spr`] undoes the split. The constants below are the
//! architectural numbers, i.e. what `compute_spr` returns.

/// Undoes the split SPR encoding of `mfspr`/`mtspr`/`mftb`.
#[inline]
#[must_use]
pub const fn compute_spr(field: u32) -> u32 {
    ((field >> 5) | (field << 5)) & 0x3ff
}

// User-level, all flavors.
pub const XER: u32 = 1;
pub const LR: u32 = 8;
pub const CTR: u32 = 9;

// Supervisor-level, all flavors.
pub const SRR0: u32 = 26;
pub const SRR1: u32 = 27;
pub const SPRG0: u32 = 272;
pub const SPRG1: u32 = 273;
pub const SPRG2: u32 = 274;
pub const SPRG3: u32 = 275;
pub const PVR: u32 = 287;

// 601 only.
pub const MQ: u32 = 0;
pub const RTCU: u32 = 4;
pub const RTCL: u32 = 5;

// 60x memory management / exception state.
pub const DSISR: u32 = 18;
pub const DAR: u32 = 19;
pub const DEC: u32 = 22;
pub const SDR1: u32 = 25;

// Time base (write side; the read side goes through `mftb`).
pub const TBL_W: u32 = 284;
pub const TBU_W: u32 = 285;

// 4xx embedded family.
pub const ESR: u32 = 980;
pub const DEAR: u32 = 981;
pub const EVPR: u32 = 982;
pub const TSR: u32 = 984;
pub const TCR: u32 = 986;
pub const PIT: u32 = 987;
pub const SRR2: u32 = 990;
pub const SRR3: u32 = 991;
