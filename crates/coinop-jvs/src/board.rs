//! Standard two-player I/O board.

use bitflags::bitflags;

use coinop_snapshot::{
    codec, DeviceSnapshot, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};

use crate::node::JvsNode;

pub const PLAYER_COUNT: usize = 2;
pub const SWITCHES_PER_PLAYER: u8 = 12;
pub const COIN_SLOTS: usize = 2;
pub const ANALOG_CHANNELS: usize = 8;
/// Coin counters wrap at this modulus (14-bit counters).
pub const COIN_COUNTER_MODULUS: u16 = 16384;

bitflags! {
    /// Per-player switches, in wire bit order: the first reply byte is the
    /// high half, the second the low half.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct PlayerSwitch: u16 {
        const START = 1 << 15;
        const SERVICE = 1 << 14;
        const UP = 1 << 13;
        const DOWN = 1 << 12;
        const LEFT = 1 << 11;
        const RIGHT = 1 << 10;
        const PUSH1 = 1 << 9;
        const PUSH2 = 1 << 8;
        const PUSH3 = 1 << 7;
        const PUSH4 = 1 << 6;
        const PUSH5 = 1 << 5;
        const PUSH6 = 1 << 4;
    }
}

bitflags! {
    /// System switches in the byte that leads every switch read.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct SystemSwitch: u8 {
        const TEST = 1 << 7;
        const TILT1 = 1 << 6;
        const TILT2 = 1 << 5;
        const TILT3 = 1 << 4;
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct CoinSlot {
    count: u16,
    line: bool,
}

/// Two players of twelve switches, two coin slots, eight analog channels,
/// one eight-bit output latch.
#[derive(Debug)]
pub struct JvsIoBoard {
    system: SystemSwitch,
    players: [PlayerSwitch; PLAYER_COUNT],
    coins: [CoinSlot; COIN_SLOTS],
    analogs: [u16; ANALOG_CHANNELS],
    outputs: u8,
}

impl JvsIoBoard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: SystemSwitch::empty(),
            players: [PlayerSwitch::empty(); PLAYER_COUNT],
            coins: [CoinSlot::default(); COIN_SLOTS],
            analogs: [0; ANALOG_CHANNELS],
            outputs: 0,
        }
    }

    pub fn set_system(&mut self, switches: SystemSwitch, held: bool) {
        self.system.set(switches, held);
    }

    pub fn set_switch(&mut self, player: usize, switches: PlayerSwitch, held: bool) {
        if let Some(bits) = self.players.get_mut(player) {
            bits.set(switches, held);
        }
    }

    pub fn set_analog(&mut self, channel: usize, value: u16) {
        if let Some(slot) = self.analogs.get_mut(channel) {
            *slot = value;
        }
    }

    /// Drive the physical coin line. Only the rising edge counts a coin;
    /// a level held high never double-counts.
    pub fn set_coin_line(&mut self, slot: usize, level: bool) {
        let Some(coin) = self.coins.get_mut(slot) else {
            return;
        };
        let rising = level && !coin.line;
        coin.line = level;
        if rising {
            coin.count = (coin.count + 1) % COIN_COUNTER_MODULUS;
        }
    }

    #[must_use]
    pub fn coin_counter(&self, slot: usize) -> u16 {
        self.coins.get(slot).map_or(0, |coin| coin.count)
    }

    #[must_use]
    pub fn outputs(&self) -> u8 {
        self.outputs
    }
}

impl Default for JvsIoBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl JvsNode for JvsIoBoard {
    fn io_id(&self) -> &str {
        "COINOP;IOBD-2P;Ver1.00;2p 12sw 2cn 8an"
    }

    fn function_list(&self) -> Vec<u8> {
        vec![
            0x01,
            PLAYER_COUNT as u8,
            SWITCHES_PER_PLAYER,
            0,
            0x02,
            COIN_SLOTS as u8,
            0,
            0,
            0x03,
            ANALOG_CHANNELS as u8,
            16,
            0,
            0x12,
            8,
            0,
            0,
        ]
    }

    fn switches(&self, players: u8, bytes_per_player: u8) -> Option<Vec<u8>> {
        if players as usize > PLAYER_COUNT || !(1..=2).contains(&bytes_per_player) {
            return None;
        }
        let mut out = Vec::with_capacity(1 + players as usize * bytes_per_player as usize);
        out.push(self.system.bits());
        for player in &self.players[..players as usize] {
            let bits = player.bits();
            out.push((bits >> 8) as u8);
            if bytes_per_player == 2 {
                out.push(bits as u8);
            }
        }
        Some(out)
    }

    fn coin_counts(&self, slots: u8) -> Option<Vec<u8>> {
        if slots as usize > COIN_SLOTS {
            return None;
        }
        let mut out = Vec::with_capacity(slots as usize * 2);
        for coin in &self.coins[..slots as usize] {
            // Condition bits (top two) read normal; the count is 14 bits.
            out.push((coin.count >> 8) as u8 & 0x3f);
            out.push(coin.count as u8);
        }
        Some(out)
    }

    fn analogs(&self, channels: u8) -> Option<Vec<u8>> {
        if channels as usize > ANALOG_CHANNELS {
            return None;
        }
        let mut out = Vec::with_capacity(channels as usize * 2);
        for &value in &self.analogs[..channels as usize] {
            out.push((value >> 8) as u8);
            out.push(value as u8);
        }
        Some(out)
    }

    fn set_outputs(&mut self, data: &[u8]) -> bool {
        let Some(&latch) = data.first() else {
            return false;
        };
        self.outputs = latch;
        true
    }

    fn coin_add(&mut self, slot: u8, amount: i16) -> bool {
        let Some(index) = slot.checked_sub(1) else {
            return false;
        };
        let Some(coin) = self.coins.get_mut(index as usize) else {
            return false;
        };
        let modulus = i32::from(COIN_COUNTER_MODULUS);
        let next = (i32::from(coin.count) + i32::from(amount)).rem_euclid(modulus);
        coin.count = next as u16;
        true
    }

    fn reset(&mut self) {
        self.outputs = 0;
    }
}

const TAG_COINS: u16 = 1;
const TAG_LINES: u16 = 2;
const TAG_OUTPUTS: u16 = 3;

/// Coin counts, line levels, and the output latch are guest-visible state;
/// switch and analog levels are host input that the frontend re-feeds.
impl DeviceSnapshot for JvsIoBoard {
    const DEVICE_ID: [u8; 4] = *b"JVIO";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    fn save_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        let mut counts = codec::Encoder::new();
        for coin in &self.coins {
            counts = counts.u16(coin.count);
        }
        w.field_bytes(TAG_COINS, counts.finish());
        let mut lines = codec::Encoder::new();
        for coin in &self.coins {
            lines = lines.bool(coin.line);
        }
        w.field_bytes(TAG_LINES, lines.finish());
        w.field_u8(TAG_OUTPUTS, self.outputs);
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;
        if let Some(blob) = r.bytes(TAG_COINS) {
            let mut d = codec::Decoder::new(blob);
            for coin in self.coins.iter_mut() {
                coin.count = d.u16()? % COIN_COUNTER_MODULUS;
            }
            d.finish()?;
        }
        if let Some(blob) = r.bytes(TAG_LINES) {
            let mut d = codec::Decoder::new(blob);
            for coin in self.coins.iter_mut() {
                coin.line = d.bool()?;
            }
            d.finish()?;
        }
        if let Some(v) = r.u8(TAG_OUTPUTS)? {
            self.outputs = v;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{
        JvsNode, CMD_COIN_ADD, CMD_COIN_SUB, CMD_READ_ANALOGS, CMD_READ_COINS,
        CMD_READ_SWITCHES, CMD_WRITE_OUTPUTS, REPORT_NORMAL, STATUS_NORMAL,
    };

    #[test]
    fn switch_bytes_follow_wire_order() {
        let mut board = JvsIoBoard::new();
        board.set_system(SystemSwitch::TEST, true);
        board.set_switch(0, PlayerSwitch::START | PlayerSwitch::PUSH3, true);
        board.set_switch(1, PlayerSwitch::LEFT, true);

        let data = board.switches(2, 2).unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data[0], SystemSwitch::TEST.bits());
        assert_eq!(data[1], (PlayerSwitch::START.bits() >> 8) as u8);
        assert_eq!(data[2], PlayerSwitch::PUSH3.bits() as u8);
        assert_eq!(data[3], (PlayerSwitch::LEFT.bits() >> 8) as u8);
        assert_eq!(data[4], 0);

        // Single-byte reads truncate to the high half.
        let narrow = board.switches(1, 1).unwrap();
        assert_eq!(narrow.len(), 2);
        assert_eq!(narrow[1], (PlayerSwitch::START.bits() >> 8) as u8);
    }

    #[test]
    fn a_rising_edge_counts_once() {
        let mut board = JvsIoBoard::new();
        board.set_coin_line(0, true);
        board.set_coin_line(0, true);
        board.set_coin_line(0, true);
        assert_eq!(board.coin_counter(0), 1);
        board.set_coin_line(0, false);
        board.set_coin_line(0, true);
        assert_eq!(board.coin_counter(0), 2);
        assert_eq!(board.coin_counter(1), 0);
    }

    #[test]
    fn coin_reads_pack_condition_and_count() {
        let mut board = JvsIoBoard::new();
        for _ in 0..0x1234 {
            board.set_coin_line(1, true);
            board.set_coin_line(1, false);
        }
        let data = board.coin_counts(2).unwrap();
        assert_eq!(data, vec![0x00, 0x00, 0x12, 0x34]);
    }

    #[test]
    fn host_side_adjustments_are_1_based_and_wrap() {
        let mut board = JvsIoBoard::new();
        assert!(board.coin_add(1, 5));
        assert_eq!(board.coin_counter(0), 5);
        assert!(board.coin_add(1, -7));
        assert_eq!(board.coin_counter(0), COIN_COUNTER_MODULUS - 2);
        assert!(!board.coin_add(0, 1));
        assert!(!board.coin_add(3, 1));
    }

    #[test]
    fn outputs_latch_and_clear_on_reset() {
        let mut board = JvsIoBoard::new();
        let reply = board.process(&[CMD_WRITE_OUTPUTS, 1, 0xa5]);
        assert_eq!(reply, vec![STATUS_NORMAL, REPORT_NORMAL]);
        assert_eq!(board.outputs(), 0xa5);
        board.reset();
        assert_eq!(board.outputs(), 0);
    }

    #[test]
    fn a_combined_poll_frame_reads_every_section() {
        let mut board = JvsIoBoard::new();
        board.set_switch(0, PlayerSwitch::PUSH1, true);
        board.set_coin_line(0, true);
        board.set_analog(0, 0xbeef);

        let reply = board.process(&[
            CMD_READ_SWITCHES,
            2,
            2,
            CMD_READ_COINS,
            2,
            CMD_READ_ANALOGS,
            8,
        ]);
        assert_eq!(reply[0], STATUS_NORMAL);
        // switches: report + system + 4 bytes
        assert_eq!(reply[1], REPORT_NORMAL);
        assert_eq!(reply[3], (PlayerSwitch::PUSH1.bits() >> 8) as u8);
        // coins: report + 4 bytes
        assert_eq!(reply[7], REPORT_NORMAL);
        assert_eq!(reply[9], 1);
        // analogs: report + 16 bytes
        assert_eq!(reply[12], REPORT_NORMAL);
        assert_eq!(reply[13], 0xbe);
        assert_eq!(reply[14], 0xef);
    }

    #[test]
    fn wire_adjustments_through_the_walker() {
        let mut board = JvsIoBoard::new();
        let reply = board.process(&[CMD_COIN_ADD, 1, 0x00, 0x09, CMD_COIN_SUB, 1, 0x00, 0x04]);
        assert_eq!(
            reply,
            vec![STATUS_NORMAL, REPORT_NORMAL, REPORT_NORMAL]
        );
        assert_eq!(board.coin_counter(0), 5);
    }

    #[test]
    fn snapshot_keeps_counts_lines_and_latch() {
        let mut board = JvsIoBoard::new();
        board.set_coin_line(0, true);
        board.coin_add(2, 100);
        board.set_outputs(&[0x3c]);
        let blob = board.save_state();

        let mut restored = JvsIoBoard::new();
        restored.load_state(&blob).unwrap();
        assert_eq!(restored.coin_counter(0), 1);
        assert_eq!(restored.coin_counter(1), 100);
        assert_eq!(restored.outputs(), 0x3c);
        // The line is restored high, so the same level cannot recount.
        restored.set_coin_line(0, true);
        assert_eq!(restored.coin_counter(0), 1);
        assert_eq!(restored.save_state(), blob);
    }
}
