//! Frame layout for the peripheral bus.
//!
//! A frame is a run of 32-bit words. Word 0 is the header: command byte,
//! recipient bus address, sender bus address, and the count of payload words
//! that follow. Peripheral addresses carry the port number in the top two
//! bits; the main peripheral on a port also sets bit 5.

/// Identify the peripheral on a port.
pub const CMD_DEVICE_REQUEST: u8 = 0x01;
/// Request the extended identity block.
pub const CMD_ALL_STATUS: u8 = 0x02;
/// Reset one peripheral.
pub const CMD_RESET: u8 = 0x03;
/// Poll the current input condition of one function.
pub const CMD_GET_CONDITION: u8 = 0x09;

/// Reply to [`CMD_DEVICE_REQUEST`].
pub const REPLY_DEVICE_STATUS: u8 = 0x05;
/// Reply to [`CMD_ALL_STATUS`].
pub const REPLY_ALL_STATUS: u8 = 0x06;
/// Bare acknowledge, the reply to [`CMD_RESET`].
pub const REPLY_ACK: u8 = 0x07;
/// Data-bearing reply, used for [`CMD_GET_CONDITION`].
pub const REPLY_DATA_TRANSFER: u8 = 0x08;

/// Function-code bit a controller-class peripheral reports in its identity
/// and expects in a get-condition request.
pub const FUNC_CONTROLLER: u32 = 1 << 24;

/// Word the controller writes to a destination whose transaction never got
/// an answer.
pub const NO_REPLY: u32 = 0xffff_ffff;

#[must_use]
pub fn header(command: u8, recipient: u8, sender: u8, payload_words: u8) -> u32 {
    u32::from(command)
        | u32::from(recipient) << 8
        | u32::from(sender) << 16
        | u32::from(payload_words) << 24
}

#[must_use]
pub fn command(word: u32) -> u8 {
    (word & 0xff) as u8
}

#[must_use]
pub fn recipient(word: u32) -> u8 {
    (word >> 8) as u8
}

#[must_use]
pub fn sender(word: u32) -> u8 {
    (word >> 16) as u8
}

#[must_use]
pub fn payload_words(word: u32) -> u8 {
    (word >> 24) as u8
}

/// Bus address of the main peripheral on `port` (0..=3).
#[must_use]
pub fn port_address(port: u8) -> u8 {
    (port & 3) << 6 | 0x20
}

/// Assemble a complete frame from a header and payload.
#[must_use]
pub fn build(command: u8, recipient: u8, sender: u8, payload: &[u32]) -> Vec<u32> {
    let mut words = Vec::with_capacity(1 + payload.len());
    words.push(header(command, recipient, sender, payload.len() as u8));
    words.extend_from_slice(payload);
    words
}
