//! Bus DMA controller.
//!
//! The register window is installed into an address space with
//! [`MapleDma::install`]. Register writes only latch state: a start-register
//! write latches a kick and returns, because handlers must not re-enter the
//! space they are installed in. The machine advances the controller by
//! calling [`MapleDma::tick`] with the current cycle count; that is where
//! descriptor fetches, peripheral dispatch, and reply copies happen.
//!
//! A transaction walks the descriptor list entry by entry. Each transfer
//! entry is two words, the transfer descriptor and the destination address,
//! followed by the outgoing frame words. The addressed peripheral is invoked
//! synchronously but its answer is held back until a scheduled timer expires,
//! modeling reply latency without ever blocking. A peripheral that does not
//! answer runs the transaction into the timeout window, which aborts the
//! remainder of the chain and latches [`DMA_TIMEOUT`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use coinop_cpu::InputLine;
use coinop_mem::{AddressSpace, MapError, ReadHandler, WriteHandler};
use coinop_snapshot::{
    codec, DeviceSnapshot, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion,
    SnapshotWriter,
};
use coinop_time::{TimerId, TimerQueue};
use coinop_types::{AccessWidth, Addr, LineState};
use tracing::{debug, trace, warn};

use crate::device::MapleDevice;
use crate::frame;

/// Ports on the bus.
pub const PORT_COUNT: usize = 4;

/// Descriptor-list base address.
pub const REG_LIST: u32 = 0x00;
/// Bit 0 gates DMA triggering.
pub const REG_ENABLE: u32 = 0x04;
/// Writing bit 0 kicks a walk; reads back the busy bit.
pub const REG_START: u32 = 0x08;
/// Completion status. Writing 1s clears the completion bits.
pub const REG_STATUS: u32 = 0x0c;
/// Length of the register window for [`MapleDma::install`].
pub const REG_WINDOW_LEN: u32 = 0x10;

/// A walk is in progress.
pub const STATUS_BUSY: u32 = 1 << 0;
/// The last walk ran to completion.
pub const STATUS_DONE: u32 = 1 << 1;
/// The last walk was aborted by a reply timeout.
pub const DMA_TIMEOUT: u32 = 1 << 2;

const DESC_LEN_MASK: u32 = 0xff;
const DESC_PATTERN_SHIFT: u32 = 8;
const DESC_PORT_SHIFT: u32 = 16;
const DESC_END: u32 = 1 << 31;

const PATTERN_NORMAL: u32 = 0;
const PATTERN_RESET: u32 = 2;
const PATTERN_NOP: u32 = 7;

/// Transfer descriptor for a frame of `1 + payload_words` words.
#[must_use]
pub fn transfer_descriptor(port: u8, payload_words: u8, end: bool) -> u32 {
    let mut word = u32::from(payload_words) | u32::from(port & 3) << DESC_PORT_SHIFT;
    if end {
        word |= DESC_END;
    }
    word
}

/// Descriptor for a bus NOP pulse. Carries no destination or frame words.
#[must_use]
pub fn nop_descriptor(end: bool) -> u32 {
    let word = PATTERN_NOP << DESC_PATTERN_SHIFT;
    if end {
        word | DESC_END
    } else {
        word
    }
}

/// Descriptor for a bus reset pulse. Carries no destination or frame words.
#[must_use]
pub fn reset_descriptor(end: bool) -> u32 {
    let word = PATTERN_RESET << DESC_PATTERN_SHIFT;
    if end {
        word | DESC_END
    } else {
        word
    }
}

/// Transaction state, visible to the status register and to harnesses
/// stepping the controller one transition at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaState {
    Idle,
    Send,
    WaitNop,
    WaitReset,
    WaitReply,
    GotReply,
    Timeout,
    Done,
}

impl DmaState {
    fn to_bits(self) -> u8 {
        match self {
            DmaState::Idle => 0,
            DmaState::Send => 1,
            DmaState::WaitNop => 2,
            DmaState::WaitReset => 3,
            DmaState::WaitReply => 4,
            DmaState::GotReply => 5,
            DmaState::Timeout => 6,
            DmaState::Done => 7,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => DmaState::Idle,
            1 => DmaState::Send,
            2 => DmaState::WaitNop,
            3 => DmaState::WaitReset,
            4 => DmaState::WaitReply,
            5 => DmaState::GotReply,
            6 => DmaState::Timeout,
            7 => DmaState::Done,
            _ => return None,
        })
    }

    fn is_wait(self) -> bool {
        matches!(
            self,
            DmaState::WaitNop | DmaState::WaitReset | DmaState::WaitReply
        )
    }
}

/// Controller timing, in machine cycles.
///
/// `reply_cycles` models the latency of a peripheral that answers;
/// `timeout_cycles` bounds the wait for one that does not and is expected
/// to be the larger of the two.
#[derive(Debug, Clone, Copy)]
pub struct MapleConfig {
    pub reply_cycles: u64,
    pub timeout_cycles: u64,
    /// Settle time of NOP and reset pulses.
    pub pulse_cycles: u64,
}

impl Default for MapleConfig {
    fn default() -> Self {
        Self {
            reply_cycles: 5,
            timeout_cycles: 400,
            pulse_cycles: 2,
        }
    }
}

/// The DMA controller.
pub struct MapleDma {
    config: MapleConfig,
    ports: [Option<Rc<RefCell<dyn MapleDevice>>>; PORT_COUNT],
    timers: TimerQueue<()>,
    timer: Option<TimerId>,
    deadline: Option<u64>,
    state: DmaState,
    list_addr: u32,
    enabled: bool,
    kick: bool,
    status: u32,
    cursor: u32,
    dest: u32,
    end_of_list: bool,
    reply: Option<Vec<u32>>,
    done_line: InputLine,
}

impl MapleDma {
    #[must_use]
    pub fn new(config: MapleConfig) -> Self {
        Self {
            config,
            ports: [None, None, None, None],
            timers: TimerQueue::new(),
            timer: None,
            deadline: None,
            state: DmaState::Idle,
            list_addr: 0,
            enabled: false,
            kick: false,
            status: 0,
            cursor: 0,
            dest: 0,
            end_of_list: false,
            reply: None,
            done_line: InputLine::new(),
        }
    }

    /// Attach a peripheral to one of the four ports, replacing any previous
    /// occupant.
    pub fn attach_port(&mut self, port: usize, device: Rc<RefCell<dyn MapleDevice>>) {
        assert!(port < PORT_COUNT);
        self.ports[port] = Some(device);
    }

    #[must_use]
    pub fn state(&self) -> DmaState {
        self.state
    }

    /// Line asserted when a walk completes, cleared by a status-register
    /// write that clears both completion bits.
    #[must_use]
    pub fn done_line(&self) -> InputLine {
        self.done_line.clone()
    }

    /// Deadline of the armed wait, if any. Lets the machine skip straight
    /// to the next interesting cycle instead of polling.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Power-on state: registers cleared, any in-flight walk abandoned,
    /// pending timers cancelled. Attached ports stay attached.
    pub fn reset(&mut self) {
        if let Some(id) = self.timer.take() {
            self.timers.cancel(id);
        }
        self.timers.clear();
        self.deadline = None;
        self.state = DmaState::Idle;
        self.list_addr = 0;
        self.enabled = false;
        self.kick = false;
        self.status = 0;
        self.cursor = 0;
        self.dest = 0;
        self.end_of_list = false;
        self.reply = None;
        self.done_line.set(LineState::Clear);
    }

    /// Map the register window at `base`.
    pub fn install(
        dma: &Rc<RefCell<Self>>,
        space: &mut AddressSpace,
        base: Addr,
    ) -> Result<(), MapError> {
        let reader = Rc::clone(dma);
        let read = ReadHandler::new("maple", move |offset, width| {
            reader.borrow().read_reg(offset, width)
        });
        let writer = Rc::clone(dma);
        let write = WriteHandler::new("maple", move |offset, data, width| {
            writer.borrow_mut().write_reg(offset, data, width);
        });
        space.install_handlers(base, REG_WINDOW_LEN, read, write)
    }

    #[must_use]
    pub fn read_reg(&self, offset: u32, _width: AccessWidth) -> u64 {
        let value = match offset {
            REG_LIST => self.list_addr,
            REG_ENABLE => u32::from(self.enabled),
            REG_START => u32::from(self.is_busy()),
            REG_STATUS => self.status_bits(),
            _ => 0,
        };
        u64::from(value)
    }

    pub fn write_reg(&mut self, offset: u32, data: u64, _width: AccessWidth) {
        let value = data as u32;
        match offset {
            REG_LIST => self.list_addr = value & !3,
            REG_ENABLE => self.enabled = value & 1 != 0,
            REG_START => {
                if value & 1 == 0 {
                    return;
                }
                if !self.enabled {
                    debug!("start write while disabled, dropped");
                    return;
                }
                if self.is_busy() {
                    debug!(state = ?self.state, "start write while busy, dropped");
                    return;
                }
                self.kick = true;
            }
            REG_STATUS => {
                self.status &= !(value & (STATUS_DONE | DMA_TIMEOUT));
                if self.status & (STATUS_DONE | DMA_TIMEOUT) == 0 {
                    self.done_line.set(LineState::Clear);
                }
            }
            _ => trace!(offset, value, "write to unassigned register"),
        }
    }

    fn is_busy(&self) -> bool {
        self.kick || self.state != DmaState::Idle
    }

    fn status_bits(&self) -> u32 {
        let mut bits = self.status;
        if self.is_busy() {
            bits |= STATUS_BUSY;
        }
        bits
    }

    /// Run the state machine as far as it can go at `now`.
    pub fn tick(&mut self, space: &mut AddressSpace, now: u64) {
        while self.step(space, now) {}
    }

    /// Advance one state transition. Returns false when blocked: no latched
    /// kick, or an armed timer not yet due at `now`.
    pub fn step(&mut self, space: &mut AddressSpace, now: u64) -> bool {
        match self.state {
            DmaState::Idle => {
                if !self.kick {
                    return false;
                }
                self.kick = false;
                self.status = 0;
                self.done_line.set(LineState::Clear);
                self.cursor = self.list_addr;
                self.end_of_list = false;
                debug!(list_addr = self.list_addr, "walk started");
                self.state = DmaState::Send;
            }
            DmaState::Send => self.send_entry(space, now),
            DmaState::WaitNop | DmaState::WaitReset | DmaState::WaitReply => {
                if !self.timer_due(now) {
                    return false;
                }
                if self.state == DmaState::WaitReply && self.reply.is_none() {
                    self.state = DmaState::Timeout;
                } else {
                    self.state = DmaState::GotReply;
                }
            }
            DmaState::GotReply => {
                if let Some(words) = self.reply.take() {
                    for (i, word) in words.iter().enumerate() {
                        space.write_u32(self.dest.wrapping_add(4 * i as u32), *word);
                    }
                    trace!(dest = self.dest, words = words.len(), "reply delivered");
                }
                self.state = if self.end_of_list {
                    DmaState::Done
                } else {
                    DmaState::Send
                };
            }
            DmaState::Timeout => {
                space.write_u32(self.dest, frame::NO_REPLY);
                self.status |= DMA_TIMEOUT;
                debug!(dest = self.dest, "reply timeout, chain abandoned");
                self.state = DmaState::Done;
            }
            DmaState::Done => {
                self.status |= STATUS_DONE;
                self.done_line.set(LineState::Assert);
                self.state = DmaState::Idle;
            }
        }
        true
    }

    fn send_entry(&mut self, space: &mut AddressSpace, now: u64) {
        let word0 = space.read_u32(self.cursor);
        self.end_of_list = word0 & DESC_END != 0;
        match word0 >> DESC_PATTERN_SHIFT & 7 {
            PATTERN_NOP => {
                self.cursor = self.cursor.wrapping_add(4);
                self.arm(now, self.config.pulse_cycles);
                self.state = DmaState::WaitNop;
            }
            PATTERN_RESET => {
                self.cursor = self.cursor.wrapping_add(4);
                self.arm(now, self.config.pulse_cycles);
                self.state = DmaState::WaitReset;
            }
            PATTERN_NORMAL => {
                let payload_words = word0 & DESC_LEN_MASK;
                let port = (word0 >> DESC_PORT_SHIFT & 3) as usize;
                self.dest = space.read_u32(self.cursor.wrapping_add(4));
                let frame_base = self.cursor.wrapping_add(8);
                let mut frame_words = Vec::with_capacity(1 + payload_words as usize);
                for i in 0..=payload_words {
                    frame_words.push(space.read_u32(frame_base.wrapping_add(4 * i)));
                }
                self.cursor = frame_base.wrapping_add(4 * (payload_words + 1));
                self.reply = match &self.ports[port] {
                    Some(device) => device.borrow_mut().process(&frame_words),
                    None => None,
                };
                trace!(port, words = frame_words.len(), answered = self.reply.is_some(), "frame sent");
                let wait = if self.reply.is_some() {
                    self.config.reply_cycles
                } else {
                    self.config.timeout_cycles
                };
                self.arm(now, wait);
                self.state = DmaState::WaitReply;
            }
            pattern => {
                warn!(pattern, "unrecognized transfer pattern, treated as nop");
                self.cursor = self.cursor.wrapping_add(4);
                self.arm(now, self.config.pulse_cycles);
                self.state = DmaState::WaitNop;
            }
        }
    }

    fn arm(&mut self, now: u64, delay: u64) {
        if let Some(id) = self.timer.take() {
            self.timers.cancel(id);
        }
        let deadline = now.saturating_add(delay);
        self.timer = Some(self.timers.schedule(deadline, ()));
        self.deadline = Some(deadline);
    }

    fn timer_due(&mut self, now: u64) -> bool {
        if self.timers.pop_due(now).is_some() {
            self.timer = None;
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for MapleDma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapleDma")
            .field("state", &self.state)
            .field("status", &self.status)
            .field("cursor", &self.cursor)
            .finish()
    }
}

const TAG_STATE: u16 = 1;
const TAG_LIST: u16 = 2;
const TAG_ENABLED: u16 = 3;
const TAG_STATUS: u16 = 4;
const TAG_KICK: u16 = 5;
const TAG_CURSOR: u16 = 6;
const TAG_DEST: u16 = 7;
const TAG_END: u16 = 8;
const TAG_DEADLINE: u16 = 9;
const TAG_REPLY: u16 = 10;
const TAG_DONE_LINE: u16 = 11;

/// Ports are not part of the blob; the machine re-attaches peripherals on
/// construction and the latched reply words cover anything mid-flight.
impl DeviceSnapshot for MapleDma {
    const DEVICE_ID: [u8; 4] = *b"MAPL";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    fn save_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        w.field_u8(TAG_STATE, self.state.to_bits());
        w.field_u32(TAG_LIST, self.list_addr);
        w.field_u8(TAG_ENABLED, u8::from(self.enabled));
        w.field_u32(TAG_STATUS, self.status);
        w.field_u8(TAG_KICK, u8::from(self.kick));
        w.field_u32(TAG_CURSOR, self.cursor);
        w.field_u32(TAG_DEST, self.dest);
        w.field_u8(TAG_END, u8::from(self.end_of_list));
        if let Some(deadline) = self.deadline {
            w.field_u64(TAG_DEADLINE, deadline);
        }
        if let Some(words) = &self.reply {
            let mut enc = codec::Encoder::new().u16(words.len() as u16);
            for &word in words {
                enc = enc.u32(word);
            }
            w.field_bytes(TAG_REPLY, enc.finish());
        }
        w.field_u8(TAG_DONE_LINE, u8::from(self.done_line.is_asserted()));
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;

        if let Some(v) = r.u8(TAG_STATE)? {
            self.state = DmaState::from_bits(v).ok_or(SnapshotError::FieldValue {
                tag: TAG_STATE,
                value: u64::from(v),
            })?;
        }
        if let Some(v) = r.u32(TAG_LIST)? {
            self.list_addr = v;
        }
        if let Some(v) = r.u8(TAG_ENABLED)? {
            self.enabled = v != 0;
        }
        if let Some(v) = r.u32(TAG_STATUS)? {
            self.status = v;
        }
        if let Some(v) = r.u8(TAG_KICK)? {
            self.kick = v != 0;
        }
        if let Some(v) = r.u32(TAG_CURSOR)? {
            self.cursor = v;
        }
        if let Some(v) = r.u32(TAG_DEST)? {
            self.dest = v;
        }
        if let Some(v) = r.u8(TAG_END)? {
            self.end_of_list = v != 0;
        }

        self.reply = match r.bytes(TAG_REPLY) {
            Some(blob) => {
                let mut d = codec::Decoder::new(blob);
                let count = d.u16()?;
                let mut words = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    words.push(d.u32()?);
                }
                d.finish()?;
                Some(words)
            }
            None => None,
        };

        // Rebuild the single armed timer. A wait state with no recorded
        // deadline fires on the next tick.
        self.timers.clear();
        self.timer = None;
        self.deadline = None;
        if self.state.is_wait() {
            let deadline = r.u64(TAG_DEADLINE)?.unwrap_or(0);
            self.timer = Some(self.timers.schedule(deadline, ()));
            self.deadline = Some(deadline);
        }

        if let Some(v) = r.u8(TAG_DONE_LINE)? {
            let level = if v != 0 {
                LineState::Assert
            } else {
                LineState::Clear
            };
            self.done_line.set(level);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MaplePad, PadButton};
    use coinop_types::Endianness;

    fn test_space() -> AddressSpace {
        let mut space = AddressSpace::new("maple-test", Endianness::Little, 32, 0);
        space.install_ram(0, 0x1_0000).unwrap();
        space
    }

    fn quick_config() -> MapleConfig {
        MapleConfig {
            reply_cycles: 5,
            timeout_cycles: 50,
            pulse_cycles: 2,
        }
    }

    fn pad_on_port(dma: &mut MapleDma, port: usize) -> Rc<RefCell<MaplePad>> {
        let pad = Rc::new(RefCell::new(MaplePad::new(port as u8)));
        dma.attach_port(port, pad.clone());
        pad
    }

    /// Lay down one transfer entry and return the address after it.
    fn write_request(
        space: &mut AddressSpace,
        at: u32,
        port: u8,
        dest: u32,
        command: u8,
        payload: &[u32],
        end: bool,
    ) -> u32 {
        let words = frame::build(command, frame::port_address(port), 0x00, payload);
        space.write_u32(at, transfer_descriptor(port, payload.len() as u8, end));
        space.write_u32(at + 4, dest);
        for (i, word) in words.iter().enumerate() {
            space.write_u32(at + 8 + 4 * i as u32, *word);
        }
        at + 8 + 4 * words.len() as u32
    }

    fn kick(dma: &mut MapleDma, list: u32) {
        dma.write_reg(REG_LIST, u64::from(list), AccessWidth::Word);
        dma.write_reg(REG_ENABLE, 1, AccessWidth::Word);
        dma.write_reg(REG_START, 1, AccessWidth::Word);
    }

    #[test]
    fn a_get_condition_transaction_walks_the_documented_states() {
        let mut space = test_space();
        let mut dma = MapleDma::new(MapleConfig::default());
        let pad = pad_on_port(&mut dma, 0);
        pad.borrow_mut().press(PadButton::A);
        write_request(
            &mut space,
            0x1000,
            0,
            0x2000,
            frame::CMD_GET_CONDITION,
            &[frame::FUNC_CONTROLLER],
            true,
        );
        kick(&mut dma, 0x1000);
        assert_eq!(dma.state(), DmaState::Idle);
        assert_eq!(dma.read_reg(REG_START, AccessWidth::Word), 1);

        assert!(dma.step(&mut space, 0));
        assert_eq!(dma.state(), DmaState::Send);
        assert!(dma.step(&mut space, 0));
        assert_eq!(dma.state(), DmaState::WaitReply);
        // The reply lands at the configured latency, not a cycle earlier.
        assert!(!dma.step(&mut space, 4));
        assert!(dma.step(&mut space, 5));
        assert_eq!(dma.state(), DmaState::GotReply);
        assert!(dma.step(&mut space, 5));
        assert_eq!(dma.state(), DmaState::Done);
        assert!(dma.step(&mut space, 5));
        assert_eq!(dma.state(), DmaState::Idle);
        assert!(!dma.step(&mut space, 5));

        let header = space.read_u32(0x2000);
        assert_eq!(frame::command(header), frame::REPLY_DATA_TRANSFER);
        assert_eq!(frame::sender(header), frame::port_address(0));
        assert_eq!(frame::payload_words(header), 3);
        assert_eq!(space.read_u32(0x2004), frame::FUNC_CONTROLLER);
        let digital = space.read_u32(0x2008) & 0xffff;
        assert_eq!(digital & u32::from(PadButton::A.bits()), 0);
        assert_ne!(digital & u32::from(PadButton::B.bits()), 0);
        assert_eq!(space.read_u32(0x200c), 0x8080_8080);

        assert_eq!(dma.read_reg(REG_STATUS, AccessWidth::Word), u64::from(STATUS_DONE));
        assert!(dma.done_line().is_asserted());
    }

    #[test]
    fn an_empty_port_times_out_and_abandons_the_chain() {
        let mut space = test_space();
        let mut dma = MapleDma::new(quick_config());
        pad_on_port(&mut dma, 0);
        let next = write_request(
            &mut space,
            0x1000,
            2,
            0x2000,
            frame::CMD_DEVICE_REQUEST,
            &[],
            false,
        );
        write_request(
            &mut space,
            next,
            0,
            0x3000,
            frame::CMD_DEVICE_REQUEST,
            &[],
            true,
        );
        space.write_u32(0x3000, 0x5555_5555);
        kick(&mut dma, 0x1000);

        let mut first_timeout = None;
        for now in 0..200 {
            dma.tick(&mut space, now);
            if first_timeout.is_none() && dma.status_bits() & DMA_TIMEOUT != 0 {
                first_timeout = Some(now);
            }
        }
        assert_eq!(first_timeout, Some(50));
        assert_eq!(dma.state(), DmaState::Idle);
        let status = dma.read_reg(REG_STATUS, AccessWidth::Word) as u32;
        assert_ne!(status & DMA_TIMEOUT, 0);
        assert_eq!(space.read_u32(0x2000), frame::NO_REPLY);
        // The entry after the timeout never ran.
        assert_eq!(space.read_u32(0x3000), 0x5555_5555);
    }

    #[test]
    fn nop_and_reset_entries_pulse_without_touching_memory() {
        let mut space = test_space();
        let mut dma = MapleDma::new(quick_config());
        pad_on_port(&mut dma, 0);
        space.write_u32(0x1000, nop_descriptor(false));
        space.write_u32(0x1004, reset_descriptor(false));
        write_request(
            &mut space,
            0x1008,
            0,
            0x2000,
            frame::CMD_DEVICE_REQUEST,
            &[],
            true,
        );
        kick(&mut dma, 0x1000);

        let mut seen = Vec::new();
        for now in 0..100 {
            while dma.step(&mut space, now) {
                seen.push(dma.state());
            }
        }
        assert!(seen.contains(&DmaState::WaitNop));
        assert!(seen.contains(&DmaState::WaitReset));
        assert_eq!(dma.state(), DmaState::Idle);
        assert_eq!(dma.read_reg(REG_STATUS, AccessWidth::Word), u64::from(STATUS_DONE));
        assert_eq!(frame::command(space.read_u32(0x2000)), frame::REPLY_DEVICE_STATUS);
    }

    #[test]
    fn a_chain_delivers_each_reply_before_advancing() {
        let mut space = test_space();
        let mut dma = MapleDma::new(quick_config());
        pad_on_port(&mut dma, 0);
        let next = write_request(
            &mut space,
            0x1000,
            0,
            0x2000,
            frame::CMD_DEVICE_REQUEST,
            &[],
            false,
        );
        write_request(
            &mut space,
            next,
            0,
            0x3000,
            frame::CMD_GET_CONDITION,
            &[frame::FUNC_CONTROLLER],
            true,
        );
        space.write_u32(0x3000, 0x5555_5555);
        kick(&mut dma, 0x1000);

        for now in 0..=5 {
            dma.tick(&mut space, now);
        }
        assert_eq!(frame::command(space.read_u32(0x2000)), frame::REPLY_DEVICE_STATUS);
        assert_eq!(space.read_u32(0x3000), 0x5555_5555);

        for now in 6..=9 {
            dma.tick(&mut space, now);
        }
        assert_eq!(space.read_u32(0x3000), 0x5555_5555);
        dma.tick(&mut space, 10);
        assert_eq!(frame::command(space.read_u32(0x3000)), frame::REPLY_DATA_TRANSFER);
        assert_eq!(dma.state(), DmaState::Idle);
        let status = dma.read_reg(REG_STATUS, AccessWidth::Word) as u32;
        assert_eq!(status, STATUS_DONE);
    }

    #[test]
    fn a_start_write_while_busy_is_dropped() {
        let mut space = test_space();
        let mut dma = MapleDma::new(quick_config());
        pad_on_port(&mut dma, 0);
        write_request(
            &mut space,
            0x1000,
            0,
            0x2000,
            frame::CMD_DEVICE_REQUEST,
            &[],
            true,
        );
        kick(&mut dma, 0x1000);
        assert!(dma.step(&mut space, 0));
        assert!(dma.step(&mut space, 0));
        assert_eq!(dma.state(), DmaState::WaitReply);

        dma.write_reg(REG_START, 1, AccessWidth::Word);
        for now in 0..20 {
            dma.tick(&mut space, now);
        }
        assert_eq!(dma.state(), DmaState::Idle);
        // No second walk was queued.
        assert!(!dma.step(&mut space, 30));
    }

    #[test]
    fn reset_abandons_a_walk_mid_wait() {
        let mut space = test_space();
        let mut dma = MapleDma::new(quick_config());
        pad_on_port(&mut dma, 0);
        write_request(
            &mut space,
            0x1000,
            0,
            0x2000,
            frame::CMD_DEVICE_REQUEST,
            &[],
            true,
        );
        kick(&mut dma, 0x1000);
        assert!(dma.step(&mut space, 0));
        assert!(dma.step(&mut space, 0));
        assert_eq!(dma.state(), DmaState::WaitReply);

        dma.reset();
        assert_eq!(dma.state(), DmaState::Idle);
        assert_eq!(dma.next_deadline(), None);
        assert_eq!(dma.read_reg(REG_STATUS, AccessWidth::Word), 0);
        // The armed reply never lands, even well past its old deadline.
        dma.tick(&mut space, 100);
        assert_eq!(space.read_u32(0x2000), 0);

        // A fresh kick works once the window is reprogrammed.
        kick(&mut dma, 0x1000);
        let mut now = 0;
        while dma.read_reg(REG_START, AccessWidth::Word) != 0 {
            dma.tick(&mut space, now);
            now += 1;
        }
        assert_ne!(space.read_u32(0x2000), 0);
    }

    #[test]
    fn kicks_are_gated_by_the_enable_register() {
        let mut space = test_space();
        let mut dma = MapleDma::new(quick_config());
        dma.write_reg(REG_LIST, 0x1000, AccessWidth::Word);
        dma.write_reg(REG_START, 1, AccessWidth::Word);
        dma.tick(&mut space, 0);
        assert_eq!(dma.state(), DmaState::Idle);
        assert_eq!(dma.read_reg(REG_STATUS, AccessWidth::Word), 0);
    }

    #[test]
    fn a_status_write_clears_completion_bits_and_line() {
        let mut space = test_space();
        let mut dma = MapleDma::new(quick_config());
        pad_on_port(&mut dma, 0);
        write_request(
            &mut space,
            0x1000,
            0,
            0x2000,
            frame::CMD_RESET,
            &[],
            true,
        );
        kick(&mut dma, 0x1000);
        for now in 0..20 {
            dma.tick(&mut space, now);
        }
        assert!(dma.done_line().is_asserted());

        dma.write_reg(REG_STATUS, u64::from(STATUS_DONE | DMA_TIMEOUT), AccessWidth::Word);
        assert_eq!(dma.read_reg(REG_STATUS, AccessWidth::Word), 0);
        assert!(!dma.done_line().is_asserted());
    }

    #[test]
    fn save_restore_mid_wait_resumes_the_chain() {
        let mut space = test_space();
        let mut dma = MapleDma::new(quick_config());
        let pad = pad_on_port(&mut dma, 0);
        pad.borrow_mut().press(PadButton::START);
        write_request(
            &mut space,
            0x1000,
            0,
            0x2000,
            frame::CMD_GET_CONDITION,
            &[frame::FUNC_CONTROLLER],
            true,
        );
        kick(&mut dma, 0x1000);
        assert!(dma.step(&mut space, 0));
        assert!(dma.step(&mut space, 0));
        assert_eq!(dma.state(), DmaState::WaitReply);

        let blob = dma.save_state();
        let mut restored = MapleDma::new(quick_config());
        pad_on_port(&mut restored, 0);
        restored.load_state(&blob).unwrap();
        assert_eq!(restored.state(), DmaState::WaitReply);
        assert_eq!(restored.save_state(), blob);

        for now in 0..20 {
            restored.tick(&mut space, now);
        }
        let digital = space.read_u32(0x2008) & 0xffff;
        assert_eq!(digital & u32::from(PadButton::START.bits()), 0);
        assert_eq!(restored.state(), DmaState::Idle);
        assert_eq!(
            restored.read_reg(REG_STATUS, AccessWidth::Word),
            u64::from(STATUS_DONE)
        );
    }

    #[test]
    fn wrong_device_id_is_rejected() {
        let dma = MapleDma::new(quick_config());
        let mut blob = dma.save_state();
        blob[0] = b'X';
        let mut other = MapleDma::new(quick_config());
        assert!(other.load_state(&blob).is_err());
    }
}
