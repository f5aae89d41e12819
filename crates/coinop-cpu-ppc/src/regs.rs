//! PowerPC 4xx architected register file.
//!
//! CR is stored as one `u32` with field 0 in the most significant nibble,
//! matching the architectural bit numbering (bit 0 = MSB).

/// MSR wait-state enable. While set the core fetches nothing and reports
/// itself idle; an enabled interrupt clears it on entry.
pub const MSR_WE: u32 = 0x0004_0000;
/// MSR external-interrupt enable.
pub const MSR_EE: u32 = 0x0000_8000;
/// MSR problem state (user mode). Cleared on interrupt entry.
pub const MSR_PR: u32 = 0x0000_4000;

pub const XER_SO: u32 = 0x8000_0000;
pub const XER_OV: u32 = 0x4000_0000;
pub const XER_CA: u32 = 0x2000_0000;

/// ESR bit flagging an illegal-instruction program interrupt.
pub const ESR_PIL: u32 = 0x0800_0000;

/// Read-only processor version word reported through `mfspr PVR`.
pub const PVR_VALUE: u32 = 0x0020_0100;

/// Interrupt vector offsets, applied to the EVPR page.
pub const VECTOR_EXTERNAL: u32 = 0x0500;
pub const VECTOR_PROGRAM: u32 = 0x0700;
pub const VECTOR_SYSCALL: u32 = 0x0C00;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regs {
    pub gpr: [u32; 32],
    pub pc: u32,
    pub msr: u32,
    pub cr: u32,
    pub lr: u32,
    pub ctr: u32,
    pub xer: u32,
    pub srr0: u32,
    pub srr1: u32,
    pub srr2: u32,
    pub srr3: u32,
    pub sprg: [u32; 4],
    pub evpr: u32,
    pub esr: u32,
    pub dear: u32,
    pub pit: u32,
    pub tsr: u32,
    pub tcr: u32,
}

impl Regs {
    pub fn new() -> Self {
        Regs {
            gpr: [0; 32],
            pc: 0,
            msr: 0,
            cr: 0,
            lr: 0,
            ctr: 0,
            xer: 0,
            srr0: 0,
            srr1: 0,
            srr2: 0,
            srr3: 0,
            sprg: [0; 4],
            evpr: 0,
            esr: 0,
            dear: 0,
            pit: 0,
            tsr: 0,
            tcr: 0,
        }
    }

    /// The 4-bit CR field `crf` (0 = most significant).
    #[inline]
    pub fn cr_field(&self, crf: u32) -> u32 {
        (self.cr >> ((7 - crf) * 4)) & 0xf
    }

    #[inline]
    pub fn set_cr_field(&mut self, crf: u32, bits: u32) {
        let shift = (7 - crf) * 4;
        self.cr = (self.cr & !(0xf << shift)) | ((bits & 0xf) << shift);
    }

    /// The single CR bit addressed the way branch BI fields do: bit 0 is
    /// CR0[LT], bit 31 is CR7[SO].
    #[inline]
    pub fn cr_bit(&self, bi: u32) -> bool {
        (self.cr >> (31 - bi)) & 1 != 0
    }

    #[inline]
    pub fn interrupts_enabled(&self) -> bool {
        self.msr & MSR_EE != 0
    }

    #[inline]
    pub fn waiting(&self) -> bool {
        self.msr & MSR_WE != 0
    }
}

impl Default for Regs {
    fn default() -> Self {
        Regs::new()
    }
}
