//! The PowerPC 403 interpreter core.
//!
//! One `step` executes one instruction against the big-endian program
//! space: fetch at PC, decode through the field helpers, execute, charge
//! cycles. Asserted input lines and the MSR wait bit are sampled between
//! instructions only, so a line raised by a handler the core itself
//! invoked lands at the next boundary, never mid-instruction.
//!
//! Interrupts are state transitions. Entry saves PC/MSR into SRR0/SRR1,
//! clears EE/WE/PR and vectors through the EVPR page; `rfi` restores. No
//! path through the core returns an error to the scheduler.

use std::cell::RefCell;
use std::rc::Rc;

use coinop_cpu::{BurstExit, ExecuteDevice, ExitReason, InputLine, StateError, StateIndex, StateTable};
use coinop_mem::AddressSpace;
use coinop_ppc::spr;
use coinop_ppc::{
    aa, bi, bo, bo_cr_sense, bo_ctr_zero, bo_decrements_ctr, bo_tests_cr, branch_displacement,
    branch_displacement_li, crfd, lk, mb, me, oe, primary, ra, rb, rc, rd, rotate_mask, rs, sh,
    simm, spr_field, uimm, xo,
};
use coinop_types::{Cycles, LineState};
use tracing::debug;

use crate::alu;
use crate::regs::{
    Regs, ESR_PIL, MSR_EE, MSR_PR, MSR_WE, PVR_VALUE, VECTOR_EXTERNAL, VECTOR_PROGRAM,
    VECTOR_SYSCALL,
};

/// System reset fetch address.
pub const RESET_PC: u32 = 0xffff_fffc;

/// Input line index of the external interrupt request. The line is level
/// sensitive: it stays pending until the device drops it.
pub const EXT_IRQ_LINE: usize = 0;

// 4xx-class integer costs: multiply 4, divide 33, memory access 2 plus
// region wait-states, taken branch +1 refill, interrupt entry and rfi 3.
const COST_DEFAULT: Cycles = 1;
const COST_MEM: Cycles = 2;
const COST_MUL: Cycles = 4;
const COST_DIV: Cycles = 33;
const COST_TRAP: Cycles = 3;

pub struct Ppc403 {
    regs: Regs,
    space: Rc<RefCell<AddressSpace>>,
    irq: InputLine,
    icount: Cycles,
    total: u64,
    table: StateTable,
}

impl Ppc403 {
    pub fn new(space: Rc<RefCell<AddressSpace>>) -> Self {
        Ppc403 {
            regs: Regs::new(),
            space,
            irq: InputLine::new(),
            icount: 0,
            total: 0,
            table: build_state_table(),
        }
    }

    /// A shared handle to the external interrupt line. Devices keep a clone
    /// and assert or clear it; the core samples at instruction boundaries.
    pub fn irq_line(&self) -> InputLine {
        self.irq.clone()
    }

    pub fn regs(&self) -> &Regs {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut Regs {
        &mut self.regs
    }

    /// Puts the architected state back at the reset vector. Line levels are
    /// external and survive; whoever drives them decides.
    pub fn reset(&mut self) {
        self.regs = Regs::new();
        self.regs.pc = RESET_PC;
        self.total = 0;
    }

    pub(crate) fn irq_level(&self) -> LineState {
        self.irq.get()
    }

    pub(crate) fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// Interrupt entry: save, mask, vector. `srr0` is the resume address
    /// the `rfi` at the end of the handler goes back to.
    fn raise(&mut self, vector: u32, srr0: u32) {
        self.regs.srr1 = self.regs.msr;
        self.regs.srr0 = srr0;
        self.regs.msr &= !(MSR_EE | MSR_WE | MSR_PR);
        self.regs.pc = (self.regs.evpr & 0xffff_0000) | vector;
    }

    fn illegal(&mut self, op: u32, pc: u32) -> Cycles {
        debug!(pc, op, "illegal opcode, taking program interrupt");
        self.regs.esr = ESR_PIL;
        self.raise(VECTOR_PROGRAM, pc);
        COST_TRAP
    }

    /// Shared tail of `bc`/`bclr`/`bcctr`. Decrements CTR and evaluates the
    /// BO/BI condition; LK writes LR whether or not the branch is taken.
    /// Returns the extra cycle for a taken branch.
    fn branch_conditional(&mut self, op: u32, target: u32, next: u32) -> Cycles {
        let bo = bo(op);
        let mut ctr_ok = true;
        if bo_decrements_ctr(bo) {
            self.regs.ctr = self.regs.ctr.wrapping_sub(1);
            ctr_ok = (self.regs.ctr == 0) == bo_ctr_zero(bo);
        }
        let cond_ok = !bo_tests_cr(bo) || self.regs.cr_bit(bi(op)) == bo_cr_sense(bo);
        if lk(op) {
            self.regs.lr = next;
        }
        if ctr_ok && cond_ok {
            self.regs.pc = target & !3;
            1
        } else {
            0
        }
    }

    fn ea_d(&self, op: u32) -> u32 {
        let base = if ra(op) == 0 {
            0
        } else {
            self.regs.gpr[ra(op) as usize]
        };
        base.wrapping_add(simm(op) as u32)
    }

    fn ea_x(&self, op: u32) -> u32 {
        let base = if ra(op) == 0 {
            0
        } else {
            self.regs.gpr[ra(op) as usize]
        };
        base.wrapping_add(self.regs.gpr[rb(op) as usize])
    }

    fn read_spr(&self, spr: u32) -> Option<u32> {
        Some(match spr {
            spr::XER => self.regs.xer,
            spr::LR => self.regs.lr,
            spr::CTR => self.regs.ctr,
            spr::SRR0 => self.regs.srr0,
            spr::SRR1 => self.regs.srr1,
            spr::SRR2 => self.regs.srr2,
            spr::SRR3 => self.regs.srr3,
            spr::SPRG0 => self.regs.sprg[0],
            spr::SPRG1 => self.regs.sprg[1],
            spr::SPRG2 => self.regs.sprg[2],
            spr::SPRG3 => self.regs.sprg[3],
            spr::PVR => PVR_VALUE,
            spr::EVPR => self.regs.evpr,
            spr::ESR => self.regs.esr,
            spr::DEAR => self.regs.dear,
            spr::PIT => self.regs.pit,
            spr::TSR => self.regs.tsr,
            spr::TCR => self.regs.tcr,
            _ => return None,
        })
    }

    fn write_spr(&mut self, spr: u32, value: u32) -> Option<()> {
        match spr {
            spr::XER => self.regs.xer = value,
            spr::LR => self.regs.lr = value,
            spr::CTR => self.regs.ctr = value,
            spr::SRR0 => self.regs.srr0 = value,
            spr::SRR1 => self.regs.srr1 = value,
            spr::SRR2 => self.regs.srr2 = value,
            spr::SRR3 => self.regs.srr3 = value,
            spr::SPRG0 => self.regs.sprg[0] = value,
            spr::SPRG1 => self.regs.sprg[1] = value,
            spr::SPRG2 => self.regs.sprg[2] = value,
            spr::SPRG3 => self.regs.sprg[3] = value,
            // Only the high half of EVPR is architected.
            spr::EVPR => self.regs.evpr = value & 0xffff_0000,
            spr::ESR => self.regs.esr = value,
            spr::DEAR => self.regs.dear = value,
            spr::PIT => self.regs.pit = value,
            spr::TSR => self.regs.tsr = value,
            spr::TCR => self.regs.tcr = value,
            // PVR is read-only; everything else is not an SPR here.
            _ => return None,
        }
        Some(())
    }

    /// Executes the instruction at PC and returns its cost, wait-states
    /// included. PC is pre-advanced; branch and interrupt arms overwrite it.
    fn step(&mut self, space: &mut AddressSpace) -> Cycles {
        let pc = self.regs.pc;
        let op = space.read_u32(pc);
        let next = pc.wrapping_add(4);
        self.regs.pc = next;
        let mut cost = COST_DEFAULT;

        match primary(op) {
            7 => {
                // mulli
                let a = self.regs.gpr[ra(op) as usize] as i32 as i64;
                let prod = a.wrapping_mul(i64::from(simm(op)));
                self.regs.gpr[rd(op) as usize] = prod as u32;
                cost = COST_MUL;
            }
            12 | 13 => {
                // addic / addic.
                let a = self.regs.gpr[ra(op) as usize];
                let (r, carry) = a.overflowing_add(simm(op) as u32);
                self.regs.gpr[rd(op) as usize] = r;
                alu::set_ca(&mut self.regs, carry);
                if primary(op) == 13 {
                    alu::set_cr0(&mut self.regs, r);
                }
            }
            14 => {
                // addi; rA = 0 reads as literal zero
                let base = if ra(op) == 0 {
                    0
                } else {
                    self.regs.gpr[ra(op) as usize]
                };
                self.regs.gpr[rd(op) as usize] = base.wrapping_add(simm(op) as u32);
            }
            15 => {
                // addis
                let base = if ra(op) == 0 {
                    0
                } else {
                    self.regs.gpr[ra(op) as usize]
                };
                self.regs.gpr[rd(op) as usize] = base.wrapping_add((simm(op) as u32) << 16);
            }
            10 => {
                // cmpli
                let a = self.regs.gpr[ra(op) as usize];
                alu::set_cr_unsigned(&mut self.regs, crfd(op), a, uimm(op));
            }
            11 => {
                // cmpi
                let a = self.regs.gpr[ra(op) as usize] as i32;
                alu::set_cr_signed(&mut self.regs, crfd(op), a, simm(op));
            }
            16 => {
                // bc
                let disp = branch_displacement(op) as u32;
                let target = if aa(op) { disp } else { pc.wrapping_add(disp) };
                cost += self.branch_conditional(op, target, next);
            }
            17 if op & 2 != 0 => {
                // sc resumes after the syscall
                self.raise(VECTOR_SYSCALL, next);
                cost = COST_TRAP;
            }
            18 => {
                // b / bl / ba / bla
                let disp = branch_displacement_li(op) as u32;
                let target = if aa(op) { disp } else { pc.wrapping_add(disp) };
                if lk(op) {
                    self.regs.lr = next;
                }
                self.regs.pc = target & !3;
                cost += 1;
            }
            19 => match xo(op) {
                16 => {
                    // bclr; old LR is the target even when LK rewrites it
                    let target = self.regs.lr & !3;
                    cost += self.branch_conditional(op, target, next);
                }
                528 => {
                    // bcctr
                    let target = self.regs.ctr & !3;
                    cost += self.branch_conditional(op, target, next);
                }
                50 => {
                    // rfi
                    self.regs.msr = self.regs.srr1;
                    self.regs.pc = self.regs.srr0 & !3;
                    cost = COST_TRAP;
                }
                _ => cost = self.illegal(op, pc),
            },
            21 => {
                // rlwinm rA,rS,SH,MB,ME
                let rotated = self.regs.gpr[rs(op) as usize].rotate_left(sh(op));
                let r = rotated & rotate_mask(mb(op), me(op));
                self.regs.gpr[ra(op) as usize] = r;
                if rc(op) {
                    alu::set_cr0(&mut self.regs, r);
                }
            }
            24 => {
                // ori
                let r = self.regs.gpr[rs(op) as usize] | uimm(op);
                self.regs.gpr[ra(op) as usize] = r;
            }
            25 => {
                // oris
                let r = self.regs.gpr[rs(op) as usize] | (uimm(op) << 16);
                self.regs.gpr[ra(op) as usize] = r;
            }
            26 => {
                // xori
                let r = self.regs.gpr[rs(op) as usize] ^ uimm(op);
                self.regs.gpr[ra(op) as usize] = r;
            }
            27 => {
                // xoris
                let r = self.regs.gpr[rs(op) as usize] ^ (uimm(op) << 16);
                self.regs.gpr[ra(op) as usize] = r;
            }
            28 => {
                // andi. always records CR0
                let r = self.regs.gpr[rs(op) as usize] & uimm(op);
                self.regs.gpr[ra(op) as usize] = r;
                alu::set_cr0(&mut self.regs, r);
            }
            29 => {
                // andis.
                let r = self.regs.gpr[rs(op) as usize] & (uimm(op) << 16);
                self.regs.gpr[ra(op) as usize] = r;
                alu::set_cr0(&mut self.regs, r);
            }
            31 => cost = self.step_ext(space, op, pc, cost),
            32 => {
                // lwz
                let ea = self.ea_d(op);
                self.regs.gpr[rd(op) as usize] = space.read_u32(ea);
                cost = COST_MEM;
            }
            34 => {
                // lbz
                let ea = self.ea_d(op);
                self.regs.gpr[rd(op) as usize] = u32::from(space.read_u8(ea));
                cost = COST_MEM;
            }
            40 => {
                // lhz
                let ea = self.ea_d(op);
                self.regs.gpr[rd(op) as usize] = u32::from(space.read_u16(ea));
                cost = COST_MEM;
            }
            36 => {
                // stw
                space.write_u32(self.ea_d(op), self.regs.gpr[rs(op) as usize]);
                cost = COST_MEM;
            }
            38 => {
                // stb
                space.write_u8(self.ea_d(op), self.regs.gpr[rs(op) as usize] as u8);
                cost = COST_MEM;
            }
            44 => {
                // sth
                space.write_u16(self.ea_d(op), self.regs.gpr[rs(op) as usize] as u16);
                cost = COST_MEM;
            }
            33 | 35 | 41 => {
                // lwzu / lbzu / lhzu; rA keeps the EA afterwards. The
                // rA = 0 and rA = rD forms are invalid and trap.
                if ra(op) == 0 || ra(op) == rd(op) {
                    cost = self.illegal(op, pc);
                } else {
                    let ea = self.regs.gpr[ra(op) as usize].wrapping_add(simm(op) as u32);
                    self.regs.gpr[rd(op) as usize] = match primary(op) {
                        33 => space.read_u32(ea),
                        35 => u32::from(space.read_u8(ea)),
                        _ => u32::from(space.read_u16(ea)),
                    };
                    self.regs.gpr[ra(op) as usize] = ea;
                    cost = COST_MEM;
                }
            }
            37 | 39 | 45 => {
                // stwu / stbu / sthu; the stored value is read before rA
                // updates, so rS = rA stores the old base.
                if ra(op) == 0 {
                    cost = self.illegal(op, pc);
                } else {
                    let ea = self.regs.gpr[ra(op) as usize].wrapping_add(simm(op) as u32);
                    match primary(op) {
                        37 => space.write_u32(ea, self.regs.gpr[rs(op) as usize]),
                        39 => space.write_u8(ea, self.regs.gpr[rs(op) as usize] as u8),
                        _ => space.write_u16(ea, self.regs.gpr[rs(op) as usize] as u16),
                    }
                    self.regs.gpr[ra(op) as usize] = ea;
                    cost = COST_MEM;
                }
            }
            _ => cost = self.illegal(op, pc),
        }

        cost + space.take_waits() as Cycles
    }

    /// Primary opcode 31: the X-form group. OE-capable arithmetic matches
    /// both extended-opcode values because OE lives in the top bit of the
    /// 10-bit field.
    fn step_ext(&mut self, space: &mut AddressSpace, op: u32, pc: u32, cost: Cycles) -> Cycles {
        let mut cost = cost;
        match xo(op) {
            0 => {
                // cmp
                let a = self.regs.gpr[ra(op) as usize] as i32;
                let b = self.regs.gpr[rb(op) as usize] as i32;
                alu::set_cr_signed(&mut self.regs, crfd(op), a, b);
            }
            32 => {
                // cmpl
                let a = self.regs.gpr[ra(op) as usize];
                let b = self.regs.gpr[rb(op) as usize];
                alu::set_cr_unsigned(&mut self.regs, crfd(op), a, b);
            }
            28 | 444 | 316 | 476 | 124 => {
                // and / or / xor / nand / nor: rA = rS op rB
                let s = self.regs.gpr[rs(op) as usize];
                let b = self.regs.gpr[rb(op) as usize];
                let r = match xo(op) {
                    28 => s & b,
                    444 => s | b,
                    316 => s ^ b,
                    476 => !(s & b),
                    _ => !(s | b),
                };
                self.regs.gpr[ra(op) as usize] = r;
                if rc(op) {
                    alu::set_cr0(&mut self.regs, r);
                }
            }
            266 | 778 => {
                // add / addo
                let a = self.regs.gpr[ra(op) as usize];
                let b = self.regs.gpr[rb(op) as usize];
                let r = a.wrapping_add(b);
                self.regs.gpr[rd(op) as usize] = r;
                if oe(op) {
                    alu::set_ov(&mut self.regs, alu::add_overflows(a, b, r));
                }
                if rc(op) {
                    alu::set_cr0(&mut self.regs, r);
                }
            }
            40 | 552 => {
                // subf: rD = rB - rA
                let a = self.regs.gpr[ra(op) as usize];
                let b = self.regs.gpr[rb(op) as usize];
                let r = b.wrapping_sub(a);
                self.regs.gpr[rd(op) as usize] = r;
                if oe(op) {
                    alu::set_ov(&mut self.regs, alu::sub_overflows(b, a, r));
                }
                if rc(op) {
                    alu::set_cr0(&mut self.regs, r);
                }
            }
            104 | 616 => {
                // neg; negating i32::MIN overflows back to itself
                let a = self.regs.gpr[ra(op) as usize];
                let r = a.wrapping_neg();
                self.regs.gpr[rd(op) as usize] = r;
                if oe(op) {
                    alu::set_ov(&mut self.regs, a == 0x8000_0000);
                }
                if rc(op) {
                    alu::set_cr0(&mut self.regs, r);
                }
            }
            235 | 747 => {
                // mullw
                let a = self.regs.gpr[ra(op) as usize] as i32 as i64;
                let b = self.regs.gpr[rb(op) as usize] as i32 as i64;
                let prod = a.wrapping_mul(b);
                let r = prod as u32;
                self.regs.gpr[rd(op) as usize] = r;
                if oe(op) {
                    alu::set_ov(&mut self.regs, prod != i64::from(prod as i32));
                }
                if rc(op) {
                    alu::set_cr0(&mut self.regs, r);
                }
                cost = COST_MUL;
            }
            491 | 1003 => {
                // divw; the quotient is architecturally undefined for divide
                // by zero and MIN/-1, pinned to zero here
                let a = self.regs.gpr[ra(op) as usize] as i32;
                let b = self.regs.gpr[rb(op) as usize] as i32;
                let (r, invalid) = if b == 0 || (a == i32::MIN && b == -1) {
                    (0, true)
                } else {
                    ((a / b) as u32, false)
                };
                self.regs.gpr[rd(op) as usize] = r;
                if oe(op) {
                    alu::set_ov(&mut self.regs, invalid);
                }
                if rc(op) {
                    alu::set_cr0(&mut self.regs, r);
                }
                cost = COST_DIV;
            }
            23 => {
                // lwzx
                let ea = self.ea_x(op);
                self.regs.gpr[rd(op) as usize] = space.read_u32(ea);
                cost = COST_MEM;
            }
            87 => {
                // lbzx
                let ea = self.ea_x(op);
                self.regs.gpr[rd(op) as usize] = u32::from(space.read_u8(ea));
                cost = COST_MEM;
            }
            279 => {
                // lhzx
                let ea = self.ea_x(op);
                self.regs.gpr[rd(op) as usize] = u32::from(space.read_u16(ea));
                cost = COST_MEM;
            }
            151 => {
                // stwx
                space.write_u32(self.ea_x(op), self.regs.gpr[rs(op) as usize]);
                cost = COST_MEM;
            }
            215 => {
                // stbx
                space.write_u8(self.ea_x(op), self.regs.gpr[rs(op) as usize] as u8);
                cost = COST_MEM;
            }
            407 => {
                // sthx
                space.write_u16(self.ea_x(op), self.regs.gpr[rs(op) as usize] as u16);
                cost = COST_MEM;
            }
            55 | 119 | 311 => {
                // lwzux / lbzux / lhzux
                if ra(op) == 0 || ra(op) == rd(op) {
                    cost = self.illegal(op, pc);
                } else {
                    let ea = self.regs.gpr[ra(op) as usize]
                        .wrapping_add(self.regs.gpr[rb(op) as usize]);
                    self.regs.gpr[rd(op) as usize] = match xo(op) {
                        55 => space.read_u32(ea),
                        119 => u32::from(space.read_u8(ea)),
                        _ => u32::from(space.read_u16(ea)),
                    };
                    self.regs.gpr[ra(op) as usize] = ea;
                    cost = COST_MEM;
                }
            }
            183 | 247 | 439 => {
                // stwux / stbux / sthux
                if ra(op) == 0 {
                    cost = self.illegal(op, pc);
                } else {
                    let ea = self.regs.gpr[ra(op) as usize]
                        .wrapping_add(self.regs.gpr[rb(op) as usize]);
                    match xo(op) {
                        183 => space.write_u32(ea, self.regs.gpr[rs(op) as usize]),
                        247 => space.write_u8(ea, self.regs.gpr[rs(op) as usize] as u8),
                        _ => space.write_u16(ea, self.regs.gpr[rs(op) as usize] as u16),
                    }
                    self.regs.gpr[ra(op) as usize] = ea;
                    cost = COST_MEM;
                }
            }
            339 => {
                // mfspr
                let spr = spr::compute_spr(spr_field(op));
                match self.read_spr(spr) {
                    Some(v) => self.regs.gpr[rd(op) as usize] = v,
                    None => {
                        debug!(pc, spr, "mfspr of unimplemented SPR");
                        cost = self.illegal(op, pc);
                    }
                }
            }
            467 => {
                // mtspr
                let spr = spr::compute_spr(spr_field(op));
                let v = self.regs.gpr[rs(op) as usize];
                if self.write_spr(spr, v).is_none() {
                    debug!(pc, spr, "mtspr of unimplemented SPR");
                    cost = self.illegal(op, pc);
                }
            }
            83 => {
                // mfmsr
                self.regs.gpr[rd(op) as usize] = self.regs.msr;
            }
            146 => {
                // mtmsr; setting WE parks the core at the next boundary
                self.regs.msr = self.regs.gpr[rs(op) as usize];
            }
            _ => cost = self.illegal(op, pc),
        }
        cost
    }
}

impl ExecuteDevice for Ppc403 {
    fn execute_run(&mut self, budget: Cycles) -> BurstExit {
        let space = Rc::clone(&self.space);
        let mut space = space.borrow_mut();

        self.icount = budget;
        let mut reason = ExitReason::BudgetExhausted;
        loop {
            // Boundary sampling: a pending enabled interrupt preempts both
            // the wait state and the next instruction.
            if self.irq.is_asserted() && self.regs.interrupts_enabled() {
                self.raise(VECTOR_EXTERNAL, self.regs.pc);
                self.icount -= COST_TRAP;
            }
            if self.regs.waiting() {
                reason = ExitReason::WaitForInterrupt;
                break;
            }
            if self.icount <= 0 {
                break;
            }
            let cost = self.step(&mut space);
            self.icount -= cost;
        }

        let consumed = budget - self.icount;
        self.total = self.total.wrapping_add(consumed.max(0) as u64);
        BurstExit { consumed, reason }
    }

    fn execute_set_input(&mut self, line: usize, state: LineState) {
        if line == EXT_IRQ_LINE {
            self.irq.set(state);
        } else {
            debug!(line, "input line outside the modeled set, ignored");
        }
    }

    fn total_cycles(&self) -> u64 {
        self.total
    }

    fn state_table(&self) -> &StateTable {
        &self.table
    }

    fn state_export(&self) -> Vec<(StateIndex, u64)> {
        self.table
            .entries()
            .iter()
            .map(|e| (e.index, self.state_value(e.index)))
            .collect()
    }

    fn state_import(&mut self, values: &[(StateIndex, u64)]) -> Result<(), StateError> {
        for &(index, value) in values {
            self.table.check(index, value)?;
            self.apply_state(index, value as u32);
        }
        Ok(())
    }
}

const IDX_PC: StateIndex = 32;
const IDX_MSR: StateIndex = 33;
const IDX_CR: StateIndex = 34;
const IDX_LR: StateIndex = 35;
const IDX_CTR: StateIndex = 36;
const IDX_XER: StateIndex = 37;
const IDX_SRR0: StateIndex = 38;
const IDX_SRR1: StateIndex = 39;
const IDX_SRR2: StateIndex = 40;
const IDX_SRR3: StateIndex = 41;
const IDX_SPRG0: StateIndex = 42;
const IDX_EVPR: StateIndex = 46;
const IDX_ESR: StateIndex = 47;
const IDX_DEAR: StateIndex = 48;
const IDX_PIT: StateIndex = 49;
const IDX_TSR: StateIndex = 50;
const IDX_TCR: StateIndex = 51;

#[rustfmt::skip]
const GPR_NAMES: [&str; 32] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7",
    "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
    "r16", "r17", "r18", "r19", "r20", "r21", "r22", "r23",
    "r24", "r25", "r26", "r27", "r28", "r29", "r30", "r31",
];

fn build_state_table() -> StateTable {
    let mut table = StateTable::new();
    for (i, name) in GPR_NAMES.iter().enumerate() {
        table.add(i as StateIndex, name, 32);
    }
    table
        .add(IDX_PC, "pc", 32)
        .add(IDX_MSR, "msr", 32)
        .add(IDX_CR, "cr", 32)
        .add(IDX_LR, "lr", 32)
        .add(IDX_CTR, "ctr", 32)
        .add(IDX_XER, "xer", 32)
        .add(IDX_SRR0, "srr0", 32)
        .add(IDX_SRR1, "srr1", 32)
        .add(IDX_SRR2, "srr2", 32)
        .add(IDX_SRR3, "srr3", 32)
        .add(IDX_SPRG0, "sprg0", 32)
        .add(IDX_SPRG0 + 1, "sprg1", 32)
        .add(IDX_SPRG0 + 2, "sprg2", 32)
        .add(IDX_SPRG0 + 3, "sprg3", 32)
        .add(IDX_EVPR, "evpr", 32)
        .add(IDX_ESR, "esr", 32)
        .add(IDX_DEAR, "dear", 32)
        .add(IDX_PIT, "pit", 32)
        .add(IDX_TSR, "tsr", 32)
        .add(IDX_TCR, "tcr", 32);
    table
}

impl Ppc403 {
    fn state_value(&self, index: StateIndex) -> u64 {
        let v = match index {
            0..=31 => self.regs.gpr[index as usize],
            IDX_PC => self.regs.pc,
            IDX_MSR => self.regs.msr,
            IDX_CR => self.regs.cr,
            IDX_LR => self.regs.lr,
            IDX_CTR => self.regs.ctr,
            IDX_XER => self.regs.xer,
            IDX_SRR0 => self.regs.srr0,
            IDX_SRR1 => self.regs.srr1,
            IDX_SRR2 => self.regs.srr2,
            IDX_SRR3 => self.regs.srr3,
            IDX_SPRG0..=45 => self.regs.sprg[(index - IDX_SPRG0) as usize],
            IDX_EVPR => self.regs.evpr,
            IDX_ESR => self.regs.esr,
            IDX_DEAR => self.regs.dear,
            IDX_PIT => self.regs.pit,
            IDX_TSR => self.regs.tsr,
            IDX_TCR => self.regs.tcr,
            _ => 0,
        };
        u64::from(v)
    }

    fn apply_state(&mut self, index: StateIndex, value: u32) {
        match index {
            0..=31 => self.regs.gpr[index as usize] = value,
            IDX_PC => self.regs.pc = value,
            IDX_MSR => self.regs.msr = value,
            IDX_CR => self.regs.cr = value,
            IDX_LR => self.regs.lr = value,
            IDX_CTR => self.regs.ctr = value,
            IDX_XER => self.regs.xer = value,
            IDX_SRR0 => self.regs.srr0 = value,
            IDX_SRR1 => self.regs.srr1 = value,
            IDX_SRR2 => self.regs.srr2 = value,
            IDX_SRR3 => self.regs.srr3 = value,
            IDX_SPRG0..=45 => self.regs.sprg[(index - IDX_SPRG0) as usize] = value,
            IDX_EVPR => self.regs.evpr = value,
            IDX_ESR => self.regs.esr = value,
            IDX_DEAR => self.regs.dear = value,
            IDX_PIT => self.regs.pit = value,
            IDX_TSR => self.regs.tsr = value,
            IDX_TCR => self.regs.tcr = value,
            _ => {}
        }
    }
}

impl std::fmt::Debug for Ppc403 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ppc403")
            .field("pc", &format_args!("{:#010x}", self.regs.pc))
            .field("msr", &format_args!("{:#010x}", self.regs.msr))
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}
