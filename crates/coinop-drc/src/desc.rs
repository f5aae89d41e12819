//! Per-instruction analysis records.
//!
//! A describer fills one [`OpcodeDescriptor`] per instruction; the code
//! generator downstream reads the chain to prune dead register writes and
//! unneeded flag computations. Usage masks are deliberately conservative:
//! when an opcode family's exact behavior varies by silicon flavor, the
//! describer reports the union, never a subset. Over-reporting costs the
//! optimizer an opportunity; under-reporting miscompiles.

use bitflags::bitflags;

bitflags! {
    /// Special registers an instruction touches beyond the numbered files.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct SpecialReg: u32 {
        const XER = 1 << 0;
        const CTR = 1 << 1;
        const LR = 1 << 2;
        const MSR = 1 << 3;
        const FPSCR = 1 << 4;
        /// 601-era MQ register; only silicon that has it reports it.
        const MQ = 1 << 5;
    }
}

bitflags! {
    /// Flow-control and side-effect classification of one instruction.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct DescFlags: u32 {
        const READS_MEMORY = 1 << 0;
        const WRITES_MEMORY = 1 << 1;
        const IS_BRANCH = 1 << 2;
        const IS_CONDITIONAL = 1 << 3;
        const IS_UNCONDITIONAL = 1 << 4;
        const CAN_CAUSE_EXCEPTION = 1 << 5;
        /// The walk must not continue past this instruction.
        const END_SEQUENCE = 1 << 6;
        /// The describer did not recognize the opcode; the caller falls
        /// back to interpretation for it.
        const INVALID = 1 << 7;
    }
}

/// Register read/write masks for one instruction.
///
/// Bit `r` of a GPR/FPR mask is register `r`; bit `f` of a CR mask is
/// condition field `f` (field 0 holds the `Rc`-form result bits).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegUsage {
    pub gpr_in: u32,
    pub gpr_out: u32,
    pub fpr_in: u32,
    pub fpr_out: u32,
    pub cr_in: u8,
    pub cr_out: u8,
    pub special_in: SpecialReg,
    pub special_out: SpecialReg,
}

impl Default for RegUsage {
    fn default() -> Self {
        Self {
            gpr_in: 0,
            gpr_out: 0,
            fpr_in: 0,
            fpr_out: 0,
            cr_in: 0,
            cr_out: 0,
            special_in: SpecialReg::empty(),
            special_out: SpecialReg::empty(),
        }
    }
}

impl RegUsage {
    #[must_use]
    pub fn reads_gpr(&self, r: u32) -> bool {
        self.gpr_in & (1 << r) != 0
    }

    #[must_use]
    pub fn writes_gpr(&self, r: u32) -> bool {
        self.gpr_out & (1 << r) != 0
    }

    #[must_use]
    pub fn reads_cr_field(&self, f: u32) -> bool {
        self.cr_in & (1 << f) != 0
    }

    #[must_use]
    pub fn writes_cr_field(&self, f: u32) -> bool {
        self.cr_out & (1 << f) != 0
    }
}

/// One described instruction.
///
/// `prev`/`next` are indices into the owning [`DescriptorList`]; the list
/// never reorders, so the links stay valid for its lifetime.
///
/// [`DescriptorList`]: crate::DescriptorList
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    /// Address the opcode was fetched from.
    pub address: u32,
    /// Raw opcode bits.
    pub opcode: u32,
    /// Instruction length in bytes. The describer must set this; the
    /// walker advances by it.
    pub length: u32,
    /// Describer's cycle estimate, for the generator's epilogue counting.
    pub cycles: u32,
    pub regs: RegUsage,
    pub flags: DescFlags,
    /// Statically known branch target, when the instruction is a branch
    /// whose destination does not depend on runtime state.
    pub target_pc: Option<u32>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

impl OpcodeDescriptor {
    /// A blank descriptor for the opcode fetched at `address`. The
    /// describer fills in everything else.
    #[must_use]
    pub fn new(address: u32, opcode: u32) -> Self {
        Self {
            address,
            opcode,
            length: 0,
            cycles: 0,
            regs: RegUsage::default(),
            flags: DescFlags::empty(),
            target_pc: None,
            prev: None,
            next: None,
        }
    }

    /// The walk stops after this instruction.
    #[must_use]
    pub fn ends_sequence(&self) -> bool {
        self.flags.contains(DescFlags::END_SEQUENCE)
    }

    /// The describer could not classify this opcode.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.flags.contains(DescFlags::INVALID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_descriptor_has_no_usage() {
        let desc = OpcodeDescriptor::new(0x1000, 0xdead_beef);
        assert_eq!(desc.address, 0x1000);
        assert_eq!(desc.opcode, 0xdead_beef);
        assert_eq!(desc.regs, RegUsage::default());
        assert!(desc.flags.is_empty());
        assert_eq!(desc.target_pc, None);
        assert!(!desc.ends_sequence());
        assert!(!desc.is_invalid());
    }

    #[test]
    fn reg_usage_masks_answer_per_register_queries() {
        let mut regs = RegUsage::default();
        regs.gpr_in |= 1 << 3;
        regs.gpr_out |= 1 << 31;
        regs.cr_out |= 1 << 0;
        assert!(regs.reads_gpr(3));
        assert!(!regs.reads_gpr(4));
        assert!(regs.writes_gpr(31));
        assert!(regs.writes_cr_field(0));
        assert!(!regs.reads_cr_field(0));
    }
}
