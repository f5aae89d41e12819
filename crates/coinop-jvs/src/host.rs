//! Bus master: send buffer, routing, address assignment.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use coinop_snapshot::{
    DeviceSnapshot, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};
use tracing::{debug, trace, warn};

use crate::framing::{self, FrameError};
use crate::node::{
    JvsNode, CMD_RESET, CMD_RESET_ARG, CMD_SET_ADDRESS, REPORT_NORMAL, STATUS_NORMAL,
};

struct ChainSlot {
    device: Rc<RefCell<dyn JvsNode>>,
    address: Option<u8>,
}

/// The host end of the chain.
///
/// One outgoing command at a time is accumulated into the send buffer:
/// `push` the destination node first, then the body bytes, then finalize
/// with `commit_raw` or `commit_encode`. A commit routes the packet,
/// stores the reply frame, and leaves the buffer empty for the next
/// command; nothing survives a transaction.
pub struct JvsHost {
    chain: Vec<ChainSlot>,
    send: Vec<u8>,
    sent: Vec<u8>,
    recv: Vec<u8>,
}

impl JvsHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            chain: Vec::new(),
            send: Vec::new(),
            sent: Vec::new(),
            recv: Vec::new(),
        }
    }

    /// Attach a node at the end of the daisy chain.
    pub fn attach(&mut self, device: Rc<RefCell<dyn JvsNode>>) {
        self.chain.push(ChainSlot {
            device,
            address: None,
        });
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.chain.len()
    }

    /// Address currently assigned to the node at `index` in attach order.
    #[must_use]
    pub fn address_of(&self, index: usize) -> Option<u8> {
        self.chain.get(index)?.address
    }

    /// Append one byte to the outgoing command. The first byte of a
    /// command is the destination node number.
    pub fn push(&mut self, byte: u8) {
        self.send.push(byte);
    }

    /// Finalize and route the buffered command without escape encoding.
    /// Returns the reply frame, or None when no node answered.
    pub fn commit_raw(&mut self) -> Option<&[u8]> {
        self.commit(false)
    }

    /// Finalize and route the buffered command in wire encoding.
    pub fn commit_encode(&mut self) -> Option<&[u8]> {
        self.commit(true)
    }

    /// Wire image of the last committed command.
    #[must_use]
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Wire image of the last reply.
    #[must_use]
    pub fn reply(&self) -> &[u8] {
        &self.recv
    }

    /// Decode the last reply into its status byte and report bytes.
    pub fn reply_body(&self) -> Result<(u8, Vec<u8>), FrameError> {
        let (_, body) = framing::decode_frame(&self.recv)?;
        match body.split_first() {
            Some((&status, reports)) => Ok((status, reports.to_vec())),
            None => Err(FrameError::Truncated {
                expected: 1,
                found: 0,
            }),
        }
    }

    fn commit(&mut self, encode: bool) -> Option<&[u8]> {
        let dest = *self.send.first()?;
        let body = self.send.split_off(1);
        self.send.clear();
        self.recv.clear();
        self.sent = if encode {
            framing::frame_encoded(dest, &body)
        } else {
            framing::frame_raw(dest, &body)
        };
        trace!(dest, len = body.len(), "command committed");

        let reply_body = self.route(dest, &body)?;
        self.recv = if encode {
            framing::frame_encoded(framing::HOST_NODE, &reply_body)
        } else {
            framing::frame_raw(framing::HOST_NODE, &reply_body)
        };
        Some(&self.recv)
    }

    fn route(&mut self, dest: u8, body: &[u8]) -> Option<Vec<u8>> {
        if dest == framing::BROADCAST {
            return self.route_broadcast(body);
        }
        match self
            .chain
            .iter_mut()
            .find(|slot| slot.address == Some(dest))
        {
            Some(slot) => Some(slot.device.borrow_mut().process(body)),
            None => {
                debug!(dest, "no node at address, bus silent");
                None
            }
        }
    }

    fn route_broadcast(&mut self, body: &[u8]) -> Option<Vec<u8>> {
        match body {
            [CMD_RESET, CMD_RESET_ARG] => {
                for slot in &mut self.chain {
                    slot.address = None;
                    slot.device.borrow_mut().reset();
                }
                debug!("bus reset");
                // Reset is unacknowledged.
                None
            }
            [CMD_SET_ADDRESS, address] => {
                // The unaddressed node furthest down the chain claims the
                // address; the sense line keeps everyone nearer silent.
                let slot = self
                    .chain
                    .iter_mut()
                    .rev()
                    .find(|slot| slot.address.is_none())?;
                slot.address = Some(*address);
                debug!(address, "address claimed");
                Some(vec![STATUS_NORMAL, REPORT_NORMAL])
            }
            _ => {
                warn!("unhandled broadcast command");
                None
            }
        }
    }

    /// Issue the broadcast reset, twice, the way hosts bring up the bus.
    pub fn reset_bus(&mut self) {
        for _ in 0..2 {
            self.push(framing::BROADCAST);
            self.push(CMD_RESET);
            self.push(CMD_RESET_ARG);
            self.commit_encode();
        }
    }

    /// Bring up the bus: reset, then hand out addresses 1..=n until a
    /// set-address goes unanswered. Returns the number of nodes addressed.
    pub fn assign_addresses(&mut self) -> usize {
        self.reset_bus();
        let mut assigned = 0;
        for address in 1..=self.chain.len() as u8 {
            self.push(framing::BROADCAST);
            self.push(CMD_SET_ADDRESS);
            self.push(address);
            if self.commit_encode().is_none() {
                break;
            }
            if matches!(self.reply_body(), Ok((STATUS_NORMAL, _))) {
                assigned += 1;
            }
        }
        assigned
    }
}

impl Default for JvsHost {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JvsHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JvsHost")
            .field("nodes", &self.chain.len())
            .field(
                "addresses",
                &self
                    .chain
                    .iter()
                    .map(|slot| slot.address)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

const TAG_ADDRESSES: u16 = 1;

/// Only the assigned addresses are machine state; the transaction buffers
/// never outlive a commit and the nodes snapshot separately.
impl DeviceSnapshot for JvsHost {
    const DEVICE_ID: [u8; 4] = *b"JVSH";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    fn save_state(&self) -> Vec<u8> {
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);
        let addresses: Vec<u8> = self
            .chain
            .iter()
            .map(|slot| slot.address.unwrap_or(0))
            .collect();
        w.field_bytes(TAG_ADDRESSES, addresses);
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;
        if let Some(addresses) = r.bytes(TAG_ADDRESSES) {
            for (slot, &address) in self.chain.iter_mut().zip(addresses) {
                slot.address = (address != 0).then_some(address);
            }
        }
        Ok(())
    }
}
