//! The forward describe pass.

use crate::desc::{DescFlags, OpcodeDescriptor};
use crate::window::WindowConfig;

/// ISA-specific half of the front-end.
///
/// `describe` receives a blank descriptor holding `address` and the raw
/// `opcode` bits and fills in length, cycles, usage masks, flags, and the
/// static branch target when one exists. `prev` is the previously described
/// instruction in the same walk, for describers that model pairing or
/// pipeline effects. Returning `false` means the opcode is outside the
/// front-end's coverage; the walker records that and stops, and execution
/// falls back to the interpreter for that address.
pub trait InstructionDescriber {
    fn describe(&self, desc: &mut OpcodeDescriptor, prev: Option<&OpcodeDescriptor>) -> bool;
}

/// Descriptors in walk order, with `prev`/`next` links resolved.
#[derive(Debug, Default, Clone)]
pub struct DescriptorList {
    descs: Vec<OpcodeDescriptor>,
}

impl DescriptorList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.descs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[OpcodeDescriptor] {
        &self.descs
    }

    #[must_use]
    pub fn first(&self) -> Option<&OpcodeDescriptor> {
        self.descs.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&OpcodeDescriptor> {
        self.descs.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OpcodeDescriptor> {
        self.descs.iter()
    }

    fn push_linked(&mut self, mut desc: OpcodeDescriptor) {
        if let Some(prev_idx) = self.descs.len().checked_sub(1) {
            self.descs[prev_idx].next = Some(self.descs.len());
            desc.prev = Some(prev_idx);
        }
        self.descs.push(desc);
    }
}

impl std::ops::Index<usize> for DescriptorList {
    type Output = OpcodeDescriptor;

    fn index(&self, index: usize) -> &OpcodeDescriptor {
        &self.descs[index]
    }
}

impl<'a> IntoIterator for &'a DescriptorList {
    type Item = &'a OpcodeDescriptor;
    type IntoIter = std::slice::Iter<'a, OpcodeDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descs.iter()
    }
}

/// Walks forward from `start_pc`, describing one instruction per step.
///
/// `fetch` returns the raw opcode word at an address; it is only called
/// for addresses inside the window. The walk stops at an instruction
/// flagged [`DescFlags::END_SEQUENCE`], after `max_sequence` descriptors,
/// or at the window boundary, whichever comes first. The boundary cut
/// applies even in the middle of a basic block. An opcode the describer
/// rejects (or describes with zero length) is recorded as
/// `INVALID | END_SEQUENCE` so the caller knows to interpret it instead.
///
/// Pure analysis: nothing executes, and the only writes are into the
/// returned list.
pub fn describe_sequence<D, F>(
    describer: &D,
    mut fetch: F,
    start_pc: u32,
    config: &WindowConfig,
) -> DescriptorList
where
    D: InstructionDescriber,
    F: FnMut(u32) -> u32,
{
    let mut list = DescriptorList::default();
    let mut pc = start_pc;
    while (list.len() as u32) < config.max_sequence {
        if !config.contains(start_pc, pc) {
            break;
        }
        let mut desc = OpcodeDescriptor::new(pc, fetch(pc));
        let recognized = describer.describe(&mut desc, list.last());
        if !recognized || desc.length == 0 {
            desc.flags |= DescFlags::INVALID | DescFlags::END_SEQUENCE;
        }
        let advance = desc.length;
        let done = desc.ends_sequence();
        list.push_linked(desc);
        if done {
            break;
        }
        pc = pc.wrapping_add(advance);
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    // Toy fixed-width ISA for exercising the walker. The top byte of each
    // word selects the form:
    //   0x00 nop
    //   0x01 add  rd, ra, rb
    //   0x02 b    disp16      (unconditional)
    //   0x03 bc   disp16      (conditional, falls through)
    //   0x04 ld   rd, [ra]
    // Everything else is unrecognized.
    struct ToyDescriber;

    fn word(kind: u8, a: u8, b: u8, c: u8) -> u32 {
        u32::from_be_bytes([kind, a, b, c])
    }

    impl InstructionDescriber for ToyDescriber {
        fn describe(&self, desc: &mut OpcodeDescriptor, _prev: Option<&OpcodeDescriptor>) -> bool {
            let [kind, a, b, c] = desc.opcode.to_be_bytes();
            desc.length = 4;
            desc.cycles = 1;
            let disp = i32::from(i16::from_be_bytes([b, c]));
            match kind {
                0x00 => {}
                0x01 => {
                    desc.regs.gpr_out |= 1 << a;
                    desc.regs.gpr_in |= (1 << b) | (1 << c);
                }
                0x02 => {
                    desc.flags |= DescFlags::IS_BRANCH
                        | DescFlags::IS_UNCONDITIONAL
                        | DescFlags::END_SEQUENCE;
                    desc.target_pc = Some(desc.address.wrapping_add(disp as u32));
                }
                0x03 => {
                    desc.flags |= DescFlags::IS_BRANCH | DescFlags::IS_CONDITIONAL;
                    desc.target_pc = Some(desc.address.wrapping_add(disp as u32));
                }
                0x04 => {
                    desc.flags |= DescFlags::READS_MEMORY;
                    desc.regs.gpr_out |= 1 << a;
                    desc.regs.gpr_in |= 1 << b;
                }
                _ => return false,
            }
            true
        }
    }

    fn fetch_from(program: &[u32]) -> impl FnMut(u32) -> u32 + '_ {
        move |pc| program[(pc / 4) as usize]
    }

    fn wide_window(max_sequence: u32) -> WindowConfig {
        WindowConfig::new(0, 4096, max_sequence).unwrap()
    }

    #[test]
    fn a_straight_line_block_ends_at_the_branch() {
        let program = [
            word(0x01, 1, 2, 3), // add r1, r2, r3
            word(0x00, 0, 0, 0), // nop
            word(0x02, 0, 0, 8), // b +8
        ];
        let list = describe_sequence(&ToyDescriber, fetch_from(&program), 0, &wide_window(16));

        assert_eq!(list.len(), 3);
        assert_eq!(list[0].address, 0);
        assert_eq!(list[1].address, 4);
        assert_eq!(list[2].address, 8);

        assert!(list[0].regs.writes_gpr(1));
        assert!(list[0].regs.reads_gpr(2));
        assert!(list[0].regs.reads_gpr(3));

        assert!(list[2].ends_sequence());
        assert!(list[2].flags.contains(DescFlags::IS_UNCONDITIONAL));
        assert_eq!(list[2].target_pc, Some(16));

        // Chain links resolve in both directions.
        assert_eq!(list[0].prev, None);
        assert_eq!(list[0].next, Some(1));
        assert_eq!(list[1].prev, Some(0));
        assert_eq!(list[1].next, Some(2));
        assert_eq!(list[2].prev, Some(1));
        assert_eq!(list[2].next, None);
    }

    #[test]
    fn an_unrecognized_opcode_marks_invalid_and_stops() {
        let program = [
            word(0x00, 0, 0, 0),
            word(0xff, 0, 0, 0),
            word(0x00, 0, 0, 0),
        ];
        let list = describe_sequence(&ToyDescriber, fetch_from(&program), 0, &wide_window(16));

        assert_eq!(list.len(), 2);
        assert!(list[1].is_invalid());
        assert!(list[1].ends_sequence());
        assert_eq!(list[1].opcode, word(0xff, 0, 0, 0));
    }

    #[test]
    fn the_sequence_cap_cuts_an_endless_run() {
        let config = wide_window(5);
        let list = describe_sequence(&ToyDescriber, |_| word(0x00, 0, 0, 0), 0, &config);

        assert_eq!(list.len(), 5);
        // Cap cut, not a block end: the tail carries no end flag.
        assert!(!list[4].ends_sequence());
        assert_eq!(list[4].next, None);
    }

    #[test]
    fn the_window_boundary_cuts_even_mid_block() {
        let config = WindowConfig::new(0, 8, 100).unwrap();
        let list = describe_sequence(&ToyDescriber, |_| word(0x00, 0, 0, 0), 0x2000, &config);

        // 0x2000, 0x2004, 0x2008 fit; 0x200c is past the window.
        assert_eq!(list.len(), 3);
        assert_eq!(list.last().map(|d| d.address), Some(0x2008));
    }

    #[test]
    fn a_conditional_branch_does_not_end_the_walk() {
        let program = [
            word(0x03, 0, 0, 12), // bc +12
            word(0x00, 0, 0, 0),  // fall-through path
            word(0x02, 0, 0, 0),  // b .
        ];
        let list = describe_sequence(&ToyDescriber, fetch_from(&program), 0, &wide_window(16));

        assert_eq!(list.len(), 3);
        assert!(list[0].flags.contains(DescFlags::IS_CONDITIONAL));
        assert!(!list[0].ends_sequence());
        assert_eq!(list[0].target_pc, Some(12));
        assert_eq!(list[2].target_pc, Some(8));
    }

    #[test]
    fn a_zero_length_description_cannot_loop_the_walker() {
        struct Lengthless;
        impl InstructionDescriber for Lengthless {
            fn describe(
                &self,
                _desc: &mut OpcodeDescriptor,
                _prev: Option<&OpcodeDescriptor>,
            ) -> bool {
                true
            }
        }
        let list = describe_sequence(&Lengthless, |_| 0, 0, &wide_window(100));

        assert_eq!(list.len(), 1);
        assert!(list[0].is_invalid());
        assert!(list[0].ends_sequence());
    }

    #[test]
    fn the_previous_descriptor_is_visible_to_the_describer() {
        struct PrevProbe;
        impl InstructionDescriber for PrevProbe {
            fn describe(
                &self,
                desc: &mut OpcodeDescriptor,
                prev: Option<&OpcodeDescriptor>,
            ) -> bool {
                desc.length = 4;
                desc.cycles = prev.map_or(1, |p| p.cycles + 1);
                true
            }
        }
        let list = describe_sequence(&PrevProbe, |_| 0, 0, &wide_window(3));

        let cycles: Vec<u32> = list.iter().map(|d| d.cycles).collect();
        assert_eq!(cycles, [1, 2, 3]);
    }
}
