//! The describer proper.

use coinop_drc::{DescFlags, InstructionDescriber, OpcodeDescriptor, SpecialReg};
use coinop_ppc::spr;
use coinop_ppc::{
    aa, bi, bo, bo_decrements_ctr, bo_tests_cr, branch_displacement, branch_displacement_li, crfd,
    lk, oe, primary, ra, rb, rc, rd, rs, spr_field, xo, Flavor,
};

// Cycle estimates track the interpreter's charge for the fall-through
// path, so the generated epilogues count the same time the interpreter
// would.
const CYCLES_DEFAULT: u32 = 1;
const CYCLES_MEM: u32 = 2;
const CYCLES_MUL: u32 = 4;
const CYCLES_DIV: u32 = 33;
const CYCLES_TRAP: u32 = 3;

/// PowerPC instruction describer, parameterized on the silicon flavor.
///
/// Flavor decides which SPRs exist and which implicit registers an opcode
/// family drags in. Where a family's exact behavior differs across
/// steppings, the masks report the union; the generator may only prune a
/// register this describer is certain the instruction ignores.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PpcDescriber {
    flavor: Flavor,
}

fn gpr(r: u32) -> u32 {
    1 << r
}

/// rA as an input mask, honoring the literal-zero forms.
fn base_in(op: u32) -> u32 {
    if ra(op) == 0 {
        0
    } else {
        gpr(ra(op))
    }
}

/// `Rc` record forms write CR0 and copy the sticky SO bit out of XER.
fn record_rc(desc: &mut OpcodeDescriptor, op: u32) {
    if rc(op) {
        desc.regs.cr_out |= 1;
        desc.regs.special_in |= SpecialReg::XER;
    }
}

/// `OE` forms update XER[OV] and accumulate XER[SO].
fn record_oe(desc: &mut OpcodeDescriptor, op: u32) {
    if oe(op) {
        desc.regs.special_in |= SpecialReg::XER;
        desc.regs.special_out |= SpecialReg::XER;
    }
}

/// BO/BI condition plumbing shared by `bc`, `bclr`, and `bcctr`.
fn record_branch_condition(desc: &mut OpcodeDescriptor, op: u32) {
    let b = bo(op);
    if bo_tests_cr(b) {
        desc.regs.cr_in |= 1 << (bi(op) >> 2);
    }
    if bo_decrements_ctr(b) {
        desc.regs.special_in |= SpecialReg::CTR;
        desc.regs.special_out |= SpecialReg::CTR;
    }
    if lk(op) {
        desc.regs.special_out |= SpecialReg::LR;
    }
    if !bo_tests_cr(b) && !bo_decrements_ctr(b) {
        desc.flags |= DescFlags::IS_UNCONDITIONAL | DescFlags::END_SEQUENCE;
    } else {
        desc.flags |= DescFlags::IS_CONDITIONAL;
    }
}

fn branch_target(address: u32, disp: i32, absolute: bool) -> u32 {
    let target = if absolute {
        disp as u32
    } else {
        address.wrapping_add(disp as u32)
    };
    target & !3
}

/// SpecialReg mask an SPR access maps onto, if any.
fn spr_special(n: u32) -> SpecialReg {
    match n {
        spr::XER => SpecialReg::XER,
        spr::LR => SpecialReg::LR,
        spr::CTR => SpecialReg::CTR,
        spr::MQ => SpecialReg::MQ,
        _ => SpecialReg::empty(),
    }
}

/// SPRs readable from user mode; everything else can take a privilege trap.
fn user_spr(n: u32) -> bool {
    matches!(
        n,
        spr::XER | spr::LR | spr::CTR | spr::MQ | spr::RTCU | spr::RTCL
    )
}

impl PpcDescriber {
    #[must_use]
    pub fn new(flavor: Flavor) -> Self {
        Self { flavor }
    }

    #[must_use]
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// The 601 routes its multiply/divide array through MQ; report the
    /// dependence so the generator never caches a stale copy.
    fn record_muldiv(&self, desc: &mut OpcodeDescriptor) {
        if self.flavor == Flavor::Ppc601 {
            desc.regs.special_in |= SpecialReg::MQ;
            desc.regs.special_out |= SpecialReg::MQ;
        }
    }

    fn describe_ext(&self, desc: &mut OpcodeDescriptor, op: u32) -> bool {
        match xo(op) {
            0 | 32 => {
                // cmp / cmpl
                desc.regs.gpr_in |= gpr(ra(op)) | gpr(rb(op));
                desc.regs.cr_out |= 1 << crfd(op);
                desc.regs.special_in |= SpecialReg::XER;
            }
            28 | 444 | 316 | 476 | 124 => {
                // and / or / xor / nand / nor
                desc.regs.gpr_in |= gpr(rs(op)) | gpr(rb(op));
                desc.regs.gpr_out |= gpr(ra(op));
                record_rc(desc, op);
            }
            266 | 778 | 40 | 552 => {
                // add / subf
                desc.regs.gpr_in |= gpr(ra(op)) | gpr(rb(op));
                desc.regs.gpr_out |= gpr(rd(op));
                record_oe(desc, op);
                record_rc(desc, op);
            }
            104 | 616 => {
                // neg
                desc.regs.gpr_in |= gpr(ra(op));
                desc.regs.gpr_out |= gpr(rd(op));
                record_oe(desc, op);
                record_rc(desc, op);
            }
            235 | 747 => {
                // mullw
                desc.regs.gpr_in |= gpr(ra(op)) | gpr(rb(op));
                desc.regs.gpr_out |= gpr(rd(op));
                desc.cycles = CYCLES_MUL;
                record_oe(desc, op);
                record_rc(desc, op);
                self.record_muldiv(desc);
            }
            491 | 1003 => {
                // divw
                desc.regs.gpr_in |= gpr(ra(op)) | gpr(rb(op));
                desc.regs.gpr_out |= gpr(rd(op));
                desc.cycles = CYCLES_DIV;
                record_oe(desc, op);
                record_rc(desc, op);
                self.record_muldiv(desc);
            }
            23 | 87 | 279 => {
                // lwzx / lbzx / lhzx
                desc.regs.gpr_in |= base_in(op) | gpr(rb(op));
                desc.regs.gpr_out |= gpr(rd(op));
                desc.flags |= DescFlags::READS_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
                desc.cycles = CYCLES_MEM;
            }
            55 | 119 | 311 => {
                // lwzux / lbzux / lhzux
                if ra(op) == 0 || ra(op) == rd(op) {
                    return false;
                }
                desc.regs.gpr_in |= gpr(ra(op)) | gpr(rb(op));
                desc.regs.gpr_out |= gpr(rd(op)) | gpr(ra(op));
                desc.flags |= DescFlags::READS_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
                desc.cycles = CYCLES_MEM;
            }
            151 | 215 | 407 => {
                // stwx / stbx / sthx
                desc.regs.gpr_in |= base_in(op) | gpr(rb(op)) | gpr(rs(op));
                desc.flags |= DescFlags::WRITES_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
                desc.cycles = CYCLES_MEM;
            }
            183 | 247 | 439 => {
                // stwux / stbux / sthux
                if ra(op) == 0 {
                    return false;
                }
                desc.regs.gpr_in |= gpr(ra(op)) | gpr(rb(op)) | gpr(rs(op));
                desc.regs.gpr_out |= gpr(ra(op));
                desc.flags |= DescFlags::WRITES_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
                desc.cycles = CYCLES_MEM;
            }
            339 => {
                // mfspr
                let n = spr::compute_spr(spr_field(op));
                if !self.flavor.has_spr(n) {
                    return false;
                }
                desc.regs.gpr_out |= gpr(rd(op));
                desc.regs.special_in |= spr_special(n);
                if !user_spr(n) {
                    desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;
                }
            }
            467 => {
                // mtspr; writes to the read-only PVR are left to the
                // interpreter, which raises the program interrupt.
                let n = spr::compute_spr(spr_field(op));
                if !self.flavor.has_spr(n) || n == spr::PVR {
                    return false;
                }
                desc.regs.gpr_in |= gpr(rs(op));
                desc.regs.special_out |= spr_special(n);
                if !user_spr(n) {
                    desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;
                }
            }
            83 => {
                // mfmsr
                desc.regs.gpr_out |= gpr(rd(op));
                desc.regs.special_in |= SpecialReg::MSR;
                desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION;
            }
            146 => {
                // mtmsr can unmask interrupts or park the core, so the
                // block must not run past it.
                desc.regs.gpr_in |= gpr(rs(op));
                desc.regs.special_out |= SpecialReg::MSR;
                desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE;
            }
            _ => return false,
        }
        true
    }
}

impl InstructionDescriber for PpcDescriber {
    fn describe(&self, desc: &mut OpcodeDescriptor, _prev: Option<&OpcodeDescriptor>) -> bool {
        let op = desc.opcode;
        desc.length = 4;
        desc.cycles = CYCLES_DEFAULT;
        match primary(op) {
            7 => {
                // mulli
                desc.regs.gpr_in |= gpr(ra(op));
                desc.regs.gpr_out |= gpr(rd(op));
                desc.cycles = CYCLES_MUL;
                self.record_muldiv(desc);
            }
            10 | 11 => {
                // cmpli / cmpi
                desc.regs.gpr_in |= gpr(ra(op));
                desc.regs.cr_out |= 1 << crfd(op);
                desc.regs.special_in |= SpecialReg::XER;
            }
            12 | 13 => {
                // addic / addic.
                desc.regs.gpr_in |= gpr(ra(op));
                desc.regs.gpr_out |= gpr(rd(op));
                desc.regs.special_in |= SpecialReg::XER;
                desc.regs.special_out |= SpecialReg::XER;
                if primary(op) == 13 {
                    desc.regs.cr_out |= 1;
                }
            }
            14 | 15 => {
                // addi / addis
                desc.regs.gpr_in |= base_in(op);
                desc.regs.gpr_out |= gpr(rd(op));
            }
            16 => {
                // bc; displacement targets are static even when conditional
                desc.flags |= DescFlags::IS_BRANCH;
                record_branch_condition(desc, op);
                desc.target_pc = Some(branch_target(
                    desc.address,
                    branch_displacement(op),
                    aa(op),
                ));
            }
            17 if op & 2 != 0 => {
                // sc
                desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE;
                desc.regs.special_in |= SpecialReg::MSR;
                desc.regs.special_out |= SpecialReg::MSR;
                desc.cycles = CYCLES_TRAP;
            }
            18 => {
                // b / bl / ba / bla
                desc.flags |=
                    DescFlags::IS_BRANCH | DescFlags::IS_UNCONDITIONAL | DescFlags::END_SEQUENCE;
                if lk(op) {
                    desc.regs.special_out |= SpecialReg::LR;
                }
                desc.target_pc = Some(branch_target(
                    desc.address,
                    branch_displacement_li(op),
                    aa(op),
                ));
            }
            19 => match xo(op) {
                16 => {
                    // bclr; the target comes out of LR at run time
                    desc.flags |= DescFlags::IS_BRANCH;
                    desc.regs.special_in |= SpecialReg::LR;
                    record_branch_condition(desc, op);
                }
                528 => {
                    // bcctr
                    desc.flags |= DescFlags::IS_BRANCH;
                    desc.regs.special_in |= SpecialReg::CTR;
                    record_branch_condition(desc, op);
                }
                50 => {
                    // rfi
                    desc.flags |= DescFlags::CAN_CAUSE_EXCEPTION | DescFlags::END_SEQUENCE;
                    desc.regs.special_in |= SpecialReg::MSR;
                    desc.regs.special_out |= SpecialReg::MSR;
                    desc.cycles = CYCLES_TRAP;
                }
                _ => return false,
            },
            21 => {
                // rlwinm
                desc.regs.gpr_in |= gpr(rs(op));
                desc.regs.gpr_out |= gpr(ra(op));
                record_rc(desc, op);
            }
            24..=27 => {
                // ori / oris / xori / xoris
                desc.regs.gpr_in |= gpr(rs(op));
                desc.regs.gpr_out |= gpr(ra(op));
            }
            28 | 29 => {
                // andi. / andis. always record CR0
                desc.regs.gpr_in |= gpr(rs(op));
                desc.regs.gpr_out |= gpr(ra(op));
                desc.regs.cr_out |= 1;
                desc.regs.special_in |= SpecialReg::XER;
            }
            31 => return self.describe_ext(desc, op),
            32 | 34 | 40 => {
                // lwz / lbz / lhz
                desc.regs.gpr_in |= base_in(op);
                desc.regs.gpr_out |= gpr(rd(op));
                desc.flags |= DescFlags::READS_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
                desc.cycles = CYCLES_MEM;
            }
            33 | 35 | 41 => {
                // lwzu / lbzu / lhzu; invalid forms fall back
                if ra(op) == 0 || ra(op) == rd(op) {
                    return false;
                }
                desc.regs.gpr_in |= gpr(ra(op));
                desc.regs.gpr_out |= gpr(rd(op)) | gpr(ra(op));
                desc.flags |= DescFlags::READS_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
                desc.cycles = CYCLES_MEM;
            }
            36 | 38 | 44 => {
                // stw / stb / sth
                desc.regs.gpr_in |= base_in(op) | gpr(rs(op));
                desc.flags |= DescFlags::WRITES_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
                desc.cycles = CYCLES_MEM;
            }
            37 | 39 | 45 => {
                // stwu / stbu / sthu
                if ra(op) == 0 {
                    return false;
                }
                desc.regs.gpr_in |= gpr(ra(op)) | gpr(rs(op));
                desc.regs.gpr_out |= gpr(ra(op));
                desc.flags |= DescFlags::WRITES_MEMORY | DescFlags::CAN_CAUSE_EXCEPTION;
                desc.cycles = CYCLES_MEM;
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(flavor: Flavor, op: u32) -> (OpcodeDescriptor, bool) {
        let mut desc = OpcodeDescriptor::new(0x1000, op);
        let ok = PpcDescriber::new(flavor).describe(&mut desc, None);
        (desc, ok)
    }

    fn on_403(op: u32) -> OpcodeDescriptor {
        let (desc, ok) = describe(Flavor::Ppc403, op);
        assert!(ok, "opcode {op:#010x} should be described");
        desc
    }

    fn d_form(op: u32, rt: u32, ra: u32, imm: u16) -> u32 {
        (op << 26) | (rt << 21) | (ra << 16) | u32::from(imm)
    }

    fn x_form(xo: u32, rt: u32, ra: u32, rb: u32, rc: bool) -> u32 {
        (31 << 26) | (rt << 21) | (ra << 16) | (rb << 11) | (xo << 1) | u32::from(rc)
    }

    fn bc(bo: u32, bi: u32, bd: i16) -> u32 {
        (16 << 26) | (bo << 21) | (bi << 16) | ((bd as u16 as u32) & 0xfffc)
    }

    fn mfspr(rt: u32, n: u32) -> u32 {
        x_form(339, rt, 0, 0, false) | (spr::compute_spr(n) << 11)
    }

    fn mtspr(n: u32, rs: u32) -> u32 {
        x_form(467, rs, 0, 0, false) | (spr::compute_spr(n) << 11)
    }

    #[test]
    fn addi_with_zero_base_reads_no_register() {
        let desc = on_403(d_form(14, 3, 0, 5));
        assert_eq!(desc.regs.gpr_in, 0);
        assert!(desc.regs.writes_gpr(3));

        let desc = on_403(d_form(14, 3, 4, 5));
        assert!(desc.regs.reads_gpr(4));
        assert_eq!(desc.length, 4);
        assert_eq!(desc.cycles, 1);
    }

    #[test]
    fn record_forms_write_cr0_and_read_the_sticky_so() {
        let desc = on_403(x_form(444, 3, 4, 5, true)); // or.
        assert!(desc.regs.writes_cr_field(0));
        assert!(desc.regs.special_in.contains(SpecialReg::XER));

        let desc = on_403(x_form(444, 3, 4, 5, false)); // or
        assert_eq!(desc.regs.cr_out, 0);
        assert!(desc.regs.special_in.is_empty());
    }

    #[test]
    fn carry_and_overflow_families_claim_xer() {
        let desc = on_403(d_form(12, 3, 4, 1)); // addic
        assert!(desc.regs.special_in.contains(SpecialReg::XER));
        assert!(desc.regs.special_out.contains(SpecialReg::XER));

        let desc = on_403(x_form(778, 3, 4, 5, false)); // addo
        assert!(desc.regs.special_out.contains(SpecialReg::XER));

        let desc = on_403(x_form(266, 3, 4, 5, false)); // add
        assert!(desc.regs.special_out.is_empty());
    }

    #[test]
    fn compares_write_their_named_field() {
        let desc = on_403(d_form(11, 3 << 2, 7, 0)); // cmpi crf3, r7
        assert!(desc.regs.writes_cr_field(3));
        assert!(!desc.regs.writes_cr_field(0));
        assert!(desc.regs.reads_gpr(7));
        assert!(desc.regs.special_in.contains(SpecialReg::XER));
    }

    #[test]
    fn conditional_branches_read_the_tested_field() {
        // bc with BO = 12: condition only, field from BI.
        let desc = on_403(bc(12, 4 * 2, 8)); // tests cr field 2
        assert!(desc.regs.reads_cr_field(2));
        assert!(!desc.regs.special_in.contains(SpecialReg::CTR));
        assert!(desc.flags.contains(DescFlags::IS_CONDITIONAL));
        assert!(!desc.ends_sequence());
        assert_eq!(desc.target_pc, Some(0x1008));

        // bdnz: BO = 16 decrements CTR, ignores CR.
        let desc = on_403(bc(16, 0, -4));
        assert_eq!(desc.regs.cr_in, 0);
        assert!(desc.regs.special_in.contains(SpecialReg::CTR));
        assert!(desc.regs.special_out.contains(SpecialReg::CTR));
        assert_eq!(desc.target_pc, Some(0x0ffc));

        // Branch-always collapses to an unconditional block end.
        let desc = on_403(bc(20, 0, 8));
        assert!(desc.flags.contains(DescFlags::IS_UNCONDITIONAL));
        assert!(desc.ends_sequence());
    }

    #[test]
    fn link_forms_write_lr_and_register_indirect_forms_read_it() {
        let bl = (18 << 26) | 16 | 1;
        let desc = on_403(bl);
        assert!(desc.regs.special_out.contains(SpecialReg::LR));
        assert!(desc.ends_sequence());
        assert_eq!(desc.target_pc, Some(0x1010));

        let blr = (19 << 26) | (20 << 21) | (16 << 1);
        let desc = on_403(blr);
        assert!(desc.regs.special_in.contains(SpecialReg::LR));
        assert_eq!(desc.target_pc, None);

        let bctr = (19 << 26) | (20 << 21) | (528 << 1);
        let desc = on_403(bctr);
        assert!(desc.regs.special_in.contains(SpecialReg::CTR));
        assert_eq!(desc.target_pc, None);
    }

    #[test]
    fn absolute_branches_ignore_the_scan_address() {
        let ba = (18 << 26) | 0x2000 | 2;
        let desc = on_403(ba);
        assert_eq!(desc.target_pc, Some(0x2000));
    }

    #[test]
    fn memory_forms_classify_traffic_and_cost() {
        let desc = on_403(d_form(32, 3, 4, 8)); // lwz
        assert!(desc.flags.contains(DescFlags::READS_MEMORY));
        assert!(desc.flags.contains(DescFlags::CAN_CAUSE_EXCEPTION));
        assert!(desc.regs.reads_gpr(4));
        assert!(desc.regs.writes_gpr(3));
        assert_eq!(desc.cycles, 2);

        let desc = on_403(d_form(36, 3, 4, 8)); // stw
        assert!(desc.flags.contains(DescFlags::WRITES_MEMORY));
        assert!(desc.regs.reads_gpr(3));
        assert!(desc.regs.reads_gpr(4));
        assert_eq!(desc.regs.gpr_out, 0);

        // Update forms also write the base back.
        let desc = on_403(d_form(33, 3, 4, 8)); // lwzu
        assert!(desc.regs.writes_gpr(3));
        assert!(desc.regs.writes_gpr(4));

        // Invalid update forms are not claimed.
        let (_, ok) = describe(Flavor::Ppc403, d_form(33, 3, 0, 8));
        assert!(!ok);
        let (_, ok) = describe(Flavor::Ppc403, d_form(33, 3, 3, 8));
        assert!(!ok);
        let (_, ok) = describe(Flavor::Ppc403, d_form(37, 3, 0, 8));
        assert!(!ok);
    }

    #[test]
    fn spr_access_is_flavor_gated() {
        let (desc, ok) = describe(Flavor::Ppc403, mfspr(3, spr::ESR));
        assert!(ok);
        assert!(desc.flags.contains(DescFlags::CAN_CAUSE_EXCEPTION));

        let (_, ok) = describe(Flavor::Ppc603, mfspr(3, spr::ESR));
        assert!(!ok);

        let (_, ok) = describe(Flavor::Ppc603, mfspr(3, spr::DEC));
        assert!(ok);
        let (_, ok) = describe(Flavor::Ppc403, mfspr(3, spr::DEC));
        assert!(!ok);

        // XER/LR/CTR map onto the special masks and need no privilege.
        let (desc, ok) = describe(Flavor::Ppc403, mfspr(3, spr::XER));
        assert!(ok);
        assert!(desc.regs.special_in.contains(SpecialReg::XER));
        assert!(!desc.flags.contains(DescFlags::CAN_CAUSE_EXCEPTION));

        let (desc, ok) = describe(Flavor::Ppc403, mtspr(spr::CTR, 5));
        assert!(ok);
        assert!(desc.regs.special_out.contains(SpecialReg::CTR));
        assert!(desc.regs.reads_gpr(5));
    }

    #[test]
    fn the_read_only_pvr_is_not_claimed_for_writing() {
        for flavor in [
            Flavor::Ppc403,
            Flavor::Ppc601,
            Flavor::Ppc602,
            Flavor::Ppc603,
        ] {
            let (_, ok) = describe(flavor, mtspr(spr::PVR, 3));
            assert!(!ok, "{}", flavor.name());
            let (_, ok) = describe(flavor, mfspr(3, spr::PVR));
            assert!(ok, "{}", flavor.name());
        }
    }

    #[test]
    fn the_601_routes_multiply_and_divide_through_mq() {
        let mullw = x_form(235, 3, 4, 5, false);
        let divw = x_form(491, 3, 4, 5, false);
        let mulli = d_form(7, 3, 4, 9);

        for op in [mullw, divw, mulli] {
            let (desc, ok) = describe(Flavor::Ppc601, op);
            assert!(ok);
            assert!(desc.regs.special_in.contains(SpecialReg::MQ));
            assert!(desc.regs.special_out.contains(SpecialReg::MQ));

            let (desc, ok) = describe(Flavor::Ppc403, op);
            assert!(ok);
            assert!(!desc.regs.special_in.contains(SpecialReg::MQ));
        }
    }

    #[test]
    fn system_forms_end_the_sequence() {
        let sc = (17 << 26) | 2;
        let desc = on_403(sc);
        assert!(desc.ends_sequence());
        assert!(desc.flags.contains(DescFlags::CAN_CAUSE_EXCEPTION));
        assert_eq!(desc.cycles, 3);

        let rfi = (19 << 26) | (50 << 1);
        let desc = on_403(rfi);
        assert!(desc.ends_sequence());
        assert!(desc.regs.special_out.contains(SpecialReg::MSR));

        let mtmsr = x_form(146, 4, 0, 0, false);
        let desc = on_403(mtmsr);
        assert!(desc.ends_sequence());
        assert!(desc.regs.special_out.contains(SpecialReg::MSR));
        assert!(desc.regs.reads_gpr(4));
    }

    #[test]
    fn unrecognized_opcodes_are_refused() {
        let (_, ok) = describe(Flavor::Ppc403, 0);
        assert!(!ok);
        // An extended opcode outside the integer subset.
        let (_, ok) = describe(Flavor::Ppc403, x_form(922, 3, 4, 0, false)); // extsh
        assert!(!ok);
    }
}
