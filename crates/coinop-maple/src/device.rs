//! Peripheral side of the bus.

use bitflags::bitflags;

use crate::frame;

/// A peripheral attached to one bus port.
///
/// `process` receives the complete outgoing frame, header word included,
/// and returns the complete reply frame. `None` means the peripheral does
/// not answer that command; to the controller that is indistinguishable
/// from an empty port and runs the transaction into its timeout.
pub trait MapleDevice {
    fn process(&mut self, frame: &[u32]) -> Option<Vec<u32>>;
}

bitflags! {
    /// Digital pad buttons, in condition-word bit order.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct PadButton: u16 {
        const C = 1 << 0;
        const B = 1 << 1;
        const A = 1 << 2;
        const START = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const LEFT = 1 << 6;
        const RIGHT = 1 << 7;
        const Z = 1 << 8;
        const Y = 1 << 9;
        const X = 1 << 10;
    }
}

/// Standard controller pad.
///
/// Identity reports the controller function code; the condition packs
/// digital and analog state the way games poll it: button bits active low,
/// triggers 0..=255, sticks centered at 0x80.
#[derive(Debug)]
pub struct MaplePad {
    port: u8,
    buttons: PadButton,
    left_trigger: u8,
    right_trigger: u8,
    stick_x: u8,
    stick_y: u8,
}

impl MaplePad {
    #[must_use]
    pub fn new(port: u8) -> Self {
        Self {
            port: port & 3,
            buttons: PadButton::empty(),
            left_trigger: 0,
            right_trigger: 0,
            stick_x: 0x80,
            stick_y: 0x80,
        }
    }

    pub fn press(&mut self, buttons: PadButton) {
        self.buttons |= buttons;
    }

    pub fn release(&mut self, buttons: PadButton) {
        self.buttons &= !buttons;
    }

    pub fn set_triggers(&mut self, left: u8, right: u8) {
        self.left_trigger = left;
        self.right_trigger = right;
    }

    pub fn set_stick(&mut self, x: u8, y: u8) {
        self.stick_x = x;
        self.stick_y = y;
    }

    fn address(&self) -> u8 {
        frame::port_address(self.port)
    }

    /// Condition words for the controller function: word 0 is buttons
    /// (inverted) plus both triggers, word 1 the stick axes with the
    /// sub-stick pinned at center.
    fn condition(&self) -> [u32; 2] {
        let digital = u32::from(!self.buttons.bits());
        let word0 = digital
            | u32::from(self.right_trigger) << 16
            | u32::from(self.left_trigger) << 24;
        let word1 = u32::from(self.stick_x) | u32::from(self.stick_y) << 8 | 0x8080 << 16;
        [word0, word1]
    }
}

impl MapleDevice for MaplePad {
    fn process(&mut self, frame_words: &[u32]) -> Option<Vec<u32>> {
        let header = *frame_words.first()?;
        let host = frame::sender(header);
        let me = self.address();
        match frame::command(header) {
            frame::CMD_DEVICE_REQUEST => Some(frame::build(
                frame::REPLY_DEVICE_STATUS,
                host,
                me,
                &[frame::FUNC_CONTROLLER, 0, 0, 0],
            )),
            frame::CMD_ALL_STATUS => Some(frame::build(
                frame::REPLY_ALL_STATUS,
                host,
                me,
                &[frame::FUNC_CONTROLLER, 0, 0, 0, 0, 0],
            )),
            frame::CMD_RESET => {
                self.buttons = PadButton::empty();
                Some(frame::build(frame::REPLY_ACK, host, me, &[]))
            }
            frame::CMD_GET_CONDITION => {
                // The request names the function it polls; a pad only
                // answers for the controller function.
                if frame_words.get(1).copied() != Some(frame::FUNC_CONTROLLER) {
                    return None;
                }
                let [word0, word1] = self.condition();
                Some(frame::build(
                    frame::REPLY_DATA_TRANSFER,
                    host,
                    me,
                    &[frame::FUNC_CONTROLLER, word0, word1],
                ))
            }
            _ => None,
        }
    }
}
