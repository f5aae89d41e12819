//! PowerPC instruction-word plumbing shared by the interpreter core and the
//! recompiler front-end: field extraction, SPR numbering, silicon flavors.
//!
//! Instructions are fixed 32-bit words. Field helpers follow the
//! architecture books' bit numbering (bit 0 is the most significant), so
//! cross-checking against the manuals is mechanical.

#![forbid(unsafe_code)]

mod flavor;
pub mod spr;

pub use flavor::Flavor;

/// Primary opcode, bits 0..5.
#[inline]
#[must_use]
pub fn primary(op: u32) -> u32 {
    op >> 26
}

/// rD/rT target register, bits 6..10.
#[inline]
#[must_use]
pub fn rd(op: u32) -> u32 {
    (op >> 21) & 0x1f
}

/// rS source register; same bits as [`rd`], named per the store forms.
#[inline]
#[must_use]
pub fn rs(op: u32) -> u32 {
    (op >> 21) & 0x1f
}

/// rA register, bits 11..15.
#[inline]
#[must_use]
pub fn ra(op: u32) -> u32 {
    (op >> 16) & 0x1f
}

/// rB register, bits 16..20.
#[inline]
#[must_use]
pub fn rb(op: u32) -> u32 {
    (op >> 11) & 0x1f
}

/// X-form extended opcode, bits 21..30.
#[inline]
#[must_use]
pub fn xo(op: u32) -> u32 {
    (op >> 1) & 0x3ff
}

/// Record bit (`.` forms), bit 31.
#[inline]
#[must_use]
pub fn rc(op: u32) -> bool {
    op & 1 != 0
}

/// Overflow-enable bit of XO-form arithmetic, bit 21.
#[inline]
#[must_use]
pub fn oe(op: u32) -> bool {
    op & 0x400 != 0
}

/// Sign-extended 16-bit immediate, bits 16..31.
#[inline]
#[must_use]
pub fn simm(op: u32) -> i32 {
    i32::from(op as u16 as i16)
}

/// Zero-extended 16-bit immediate, bits 16..31.
#[inline]
#[must_use]
pub fn uimm(op: u32) -> u32 {
    op & 0xffff
}

/// CR field selector of compares and `mcrf`, bits 6..8.
#[inline]
#[must_use]
pub fn crfd(op: u32) -> u32 {
    (op >> 23) & 0x7
}

/// BO field of conditional branches, bits 6..10.
#[inline]
#[must_use]
pub fn bo(op: u32) -> u32 {
    (op >> 21) & 0x1f
}

/// BI field of conditional branches, bits 11..15.
#[inline]
#[must_use]
pub fn bi(op: u32) -> u32 {
    (op >> 16) & 0x1f
}

/// Shift amount of the rotate family, bits 16..20.
#[inline]
#[must_use]
pub fn sh(op: u32) -> u32 {
    (op >> 11) & 0x1f
}

/// Mask-begin bit of the rotate family, bits 21..25.
#[inline]
#[must_use]
pub fn mb(op: u32) -> u32 {
    (op >> 6) & 0x1f
}

/// Mask-end bit of the rotate family, bits 26..30.
#[inline]
#[must_use]
pub fn me(op: u32) -> u32 {
    (op >> 1) & 0x1f
}

/// Raw split SPR field of `mfspr`/`mtspr`, bits 11..20. Feed through
/// [`spr::compute_spr`] before comparing against SPR numbers.
#[inline]
#[must_use]
pub fn spr_field(op: u32) -> u32 {
    (op >> 11) & 0x3ff
}

/// Absolute-address bit of branches, bit 30.
#[inline]
#[must_use]
pub fn aa(op: u32) -> bool {
    op & 2 != 0
}

/// Link bit of branches, bit 31.
#[inline]
#[must_use]
pub fn lk(op: u32) -> bool {
    op & 1 != 0
}

/// Sign-extended `bc` displacement (bits 16..29, low two bits zero).
#[inline]
#[must_use]
pub fn branch_displacement(op: u32) -> i32 {
    i32::from((op & 0xfffc) as i16)
}

/// Sign-extended `b` displacement (bits 6..29, low two bits zero).
#[inline]
#[must_use]
pub fn branch_displacement_li(op: u32) -> i32 {
    (((op & 0x03ff_fffc) << 6) as i32) >> 6
}

/// BO[0] clear: the branch tests the CR bit selected by BI.
#[inline]
#[must_use]
pub fn bo_tests_cr(bo: u32) -> bool {
    bo & 0x10 == 0
}

/// BO[1]: required value of the tested CR bit.
#[inline]
#[must_use]
pub fn bo_cr_sense(bo: u32) -> bool {
    bo & 0x08 != 0
}

/// BO[2] clear: the branch decrements CTR and tests it.
#[inline]
#[must_use]
pub fn bo_decrements_ctr(bo: u32) -> bool {
    bo & 0x04 == 0
}

/// BO[3]: branch when the decremented CTR is zero (else non-zero).
#[inline]
#[must_use]
pub fn bo_ctr_zero(bo: u32) -> bool {
    bo & 0x02 != 0
}

/// Rotate-family mask from mask-begin to mask-end, inclusive, in the
/// books' numbering (bit 0 = MSB). `mb > me` wraps.
#[must_use]
pub fn rotate_mask(mb: u32, me: u32) -> u32 {
    let head = u32::MAX >> mb;
    let tail = u32::MAX << (31 - me);
    if mb <= me {
        head & tail
    } else {
        head | tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_extraction_matches_known_encodings() {
        // addi r3, r4, -2 => 0x3864FFFE
        let op = 0x3864_FFFE;
        assert_eq!(primary(op), 14);
        assert_eq!(rd(op), 3);
        assert_eq!(ra(op), 4);
        assert_eq!(simm(op), -2);

        // or r5, r6, r7 (rc=0) => primary 31, xo 444, rS=6 rA=5 rB=7
        let op = (31 << 26) | (6 << 21) | (5 << 16) | (7 << 11) | (444 << 1);
        assert_eq!(primary(op), 31);
        assert_eq!(xo(op), 444);
        assert_eq!(rs(op), 6);
        assert_eq!(ra(op), 5);
        assert_eq!(rb(op), 7);
        assert!(!rc(op));
        assert!(rc(op | 1));
    }

    #[test]
    fn branch_displacements_sign_extend() {
        // b .-4 => 0x4BFFFFFC
        assert_eq!(branch_displacement_li(0x4BFF_FFFC), -4);
        // b .+8 => 0x48000008
        assert_eq!(branch_displacement_li(0x4800_0008), 8);
        // bc displacement -8 => low half 0xFFF8
        assert_eq!(branch_displacement(0x4200_FFF8), -8);
        assert_eq!(branch_displacement(0x4200_0010), 16);
        assert!(lk(0x4800_0009));
        assert!(aa(0x4800_000A));
    }

    #[test]
    fn bo_field_semantics() {
        // bdnz: BO=16 (0b10000) decrements CTR, ignores CR.
        assert!(!bo_tests_cr(16));
        assert!(bo_decrements_ctr(16));
        assert!(!bo_ctr_zero(16));
        // blt: BO=12 (0b01100) tests CR true, leaves CTR alone.
        assert!(bo_tests_cr(12));
        assert!(bo_cr_sense(12));
        assert!(!bo_decrements_ctr(12));
        // Unconditional: BO=20 (0b10100).
        assert!(!bo_tests_cr(20));
        assert!(!bo_decrements_ctr(20));
    }

    #[test]
    fn rotate_masks_match_the_books() {
        assert_eq!(rotate_mask(0, 31), 0xFFFF_FFFF);
        assert_eq!(rotate_mask(24, 31), 0x0000_00FF);
        assert_eq!(rotate_mask(0, 7), 0xFF00_0000);
        assert_eq!(rotate_mask(16, 23), 0x0000_FF00);
        // Wrapped mask.
        assert_eq!(rotate_mask(30, 1), 0xC000_0003);
    }
}
