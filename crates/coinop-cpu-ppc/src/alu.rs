//! CR/XER condition recording shared by the instruction arms.

use crate::regs::{Regs, XER_CA, XER_OV, XER_SO};

/// Records the signed comparison of `value` against zero into CR0, with
/// SO copied from XER. This is the `Rc`-form side effect.
pub fn set_cr0(regs: &mut Regs, value: u32) {
    set_cr_signed(regs, 0, value as i32, 0);
}

pub fn set_cr_signed(regs: &mut Regs, crf: u32, a: i32, b: i32) {
    let mut bits = match a.cmp(&b) {
        std::cmp::Ordering::Less => 0b1000,
        std::cmp::Ordering::Greater => 0b0100,
        std::cmp::Ordering::Equal => 0b0010,
    };
    if regs.xer & XER_SO != 0 {
        bits |= 0b0001;
    }
    regs.set_cr_field(crf, bits);
}

pub fn set_cr_unsigned(regs: &mut Regs, crf: u32, a: u32, b: u32) {
    let mut bits = match a.cmp(&b) {
        std::cmp::Ordering::Less => 0b1000,
        std::cmp::Ordering::Greater => 0b0100,
        std::cmp::Ordering::Equal => 0b0010,
    };
    if regs.xer & XER_SO != 0 {
        bits |= 0b0001;
    }
    regs.set_cr_field(crf, bits);
}

/// Records OV and the sticky SO. Only `OE`-form arithmetic calls this.
pub fn set_ov(regs: &mut Regs, overflow: bool) {
    if overflow {
        regs.xer |= XER_OV | XER_SO;
    } else {
        regs.xer &= !XER_OV;
    }
}

pub fn set_ca(regs: &mut Regs, carry: bool) {
    if carry {
        regs.xer |= XER_CA;
    } else {
        regs.xer &= !XER_CA;
    }
}

/// Signed 32-bit addition overflow: both operands share a sign the result
/// doesn't.
#[inline]
pub fn add_overflows(a: u32, b: u32, result: u32) -> bool {
    (a ^ result) & (b ^ result) & 0x8000_0000 != 0
}

/// Signed overflow of `minuend - subtrahend`.
#[inline]
pub fn sub_overflows(minuend: u32, subtrahend: u32, result: u32) -> bool {
    (minuend ^ subtrahend) & (minuend ^ result) & 0x8000_0000 != 0
}
