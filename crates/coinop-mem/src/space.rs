use std::sync::Arc;

use coinop_types::{AccessWidth, Addr, Endianness};
use thiserror::Error;
use tracing::{debug, trace};

use crate::handler::{ReadHandler, WriteHandler};

/// Errors installing a region into an [`AddressSpace`].
///
/// These reflect static wiring mistakes in a machine description, so callers
/// treat them as fatal at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("region at {start:#x} is empty")]
    EmptyRegion { start: u64 },
    #[error("region {start:#x}..{end:#x} exceeds the {addr_bits}-bit address space")]
    OutOfRange { start: u64, end: u64, addr_bits: u32 },
    #[error("region {start:#x}..{end:#x} overlaps existing region {other_start:#x}..{other_end:#x}")]
    Overlap {
        start: u64,
        end: u64,
        other_start: u64,
        other_end: u64,
    },
    #[error("no region starts at {start:#x}")]
    NoSuchRegion { start: u64 },
}

enum Backing {
    Ram(Vec<u8>),
    Rom(Arc<[u8]>),
    Handlers { read: ReadHandler, write: WriteHandler },
}

impl std::fmt::Debug for Backing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backing::Ram(b) => write!(f, "Ram({} bytes)", b.len()),
            Backing::Rom(b) => write!(f, "Rom({} bytes)", b.len()),
            Backing::Handlers { read, write } => {
                write!(f, "Handlers(r={}, w={})", read.name(), write.name())
            }
        }
    }
}

#[derive(Debug)]
struct Region {
    start: u64,
    /// Exclusive. `u64` so a region may end exactly at the 4 GiB boundary.
    end: u64,
    wait_states: u32,
    backing: Backing,
}

/// One flat, byte-addressed bus view with a fixed byte order.
///
/// Regions are kept sorted and disjoint; routing is a binary search. An
/// access wholly inside one region takes the fast path (single slice op or
/// single handler invocation at the access width); an access that straddles
/// a region edge, a hole, or the top-of-space wrap decomposes into byte
/// accesses routed independently.
///
/// Unmapped accesses are defined, not errors: reads return the configured
/// fill byte replicated to the access width, writes are dropped, and both
/// are logged at debug level. Real software probes empty sockets and
/// mirrors all the time; only the fill value is board-specific.
pub struct AddressSpace {
    name: &'static str,
    endianness: Endianness,
    addr_bits: u32,
    unmapped_fill: u8,
    regions: Vec<Region>,
    waits: u64,
}

impl AddressSpace {
    /// `addr_bits` is the decoded width of the bus (1..=32); addresses are
    /// masked to it, so mirrors above the decoded range wrap around.
    pub fn new(name: &'static str, endianness: Endianness, addr_bits: u32, unmapped_fill: u8) -> Self {
        assert!(
            (1..=32).contains(&addr_bits),
            "address space {name}: addr_bits {addr_bits} out of range"
        );
        Self {
            name,
            endianness,
            addr_bits,
            unmapped_fill,
            regions: Vec::new(),
            waits: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Total decoded size in bytes (`2^addr_bits`).
    #[must_use]
    pub fn size(&self) -> u64 {
        1u64 << self.addr_bits
    }

    #[inline]
    fn addr_mask(&self) -> u64 {
        self.size() - 1
    }

    /// Maps `len` bytes of zero-initialized RAM at `start`.
    pub fn install_ram(&mut self, start: Addr, len: u32) -> Result<(), MapError> {
        self.install(start, u64::from(len), Backing::Ram(vec![0; len as usize]))
    }

    /// Maps `data` read-only at `start`. Writes into the region are dropped.
    pub fn install_rom(&mut self, start: Addr, data: Arc<[u8]>) -> Result<(), MapError> {
        let len = data.len() as u64;
        self.install(start, len, Backing::Rom(data))
    }

    /// Maps a handler pair over `len` bytes at `start`. Handlers see
    /// region-relative offsets.
    pub fn install_handlers(
        &mut self,
        start: Addr,
        len: u32,
        read: ReadHandler,
        write: WriteHandler,
    ) -> Result<(), MapError> {
        self.install(start, u64::from(len), Backing::Handlers { read, write })
    }

    /// Sets the per-access wait-state count of the region starting exactly
    /// at `start`. The accumulated waits are drained via [`take_waits`]
    /// and charged to the accessor's cycle budget.
    ///
    /// [`take_waits`]: AddressSpace::take_waits
    pub fn set_wait_states(&mut self, start: Addr, wait_states: u32) -> Result<(), MapError> {
        let start = u64::from(start);
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.start == start)
            .ok_or(MapError::NoSuchRegion { start })?;
        region.wait_states = wait_states;
        Ok(())
    }

    fn install(&mut self, start: Addr, len: u64, backing: Backing) -> Result<(), MapError> {
        let start = u64::from(start);
        if len == 0 {
            return Err(MapError::EmptyRegion { start });
        }
        let end = start + len;
        if end > self.size() {
            return Err(MapError::OutOfRange {
                start,
                end,
                addr_bits: self.addr_bits,
            });
        }
        let idx = self.regions.partition_point(|r| r.start < start);
        if idx > 0 {
            let prev = &self.regions[idx - 1];
            if prev.end > start {
                return Err(MapError::Overlap {
                    start,
                    end,
                    other_start: prev.start,
                    other_end: prev.end,
                });
            }
        }
        if let Some(next) = self.regions.get(idx) {
            if next.start < end {
                return Err(MapError::Overlap {
                    start,
                    end,
                    other_start: next.start,
                    other_end: next.end,
                });
            }
        }
        self.regions.insert(idx, Region {
            start,
            end,
            wait_states: 0,
            backing,
        });
        Ok(())
    }

    /// Index of the region covering `a`, if any. Regions are sorted and
    /// disjoint, so `end` is strictly increasing.
    #[inline]
    fn region_index(&self, a: u64) -> Option<usize> {
        let idx = self.regions.partition_point(|r| r.end <= a);
        let r = self.regions.get(idx)?;
        (r.start <= a).then_some(idx)
    }

    /// Reads `width` bytes at `addr`, honoring the space's byte order.
    ///
    /// `&mut self` because reads have side effects: handler invocation and
    /// wait-state accounting.
    pub fn read(&mut self, addr: Addr, width: AccessWidth) -> u64 {
        let len = u64::from(width.bytes());
        let a = u64::from(addr) & self.addr_mask();
        if a + len <= self.size() {
            if let Some(idx) = self.region_index(a) {
                if a + len <= self.regions[idx].end {
                    return self.read_in_region(idx, a, width);
                }
            }
        }
        // Straddles a region edge, a hole, or the top-of-space wrap.
        let mut bytes = [0u8; 4];
        let n = width.bytes() as usize;
        for (i, b) in bytes[..n].iter_mut().enumerate() {
            let ba = (u64::from(addr) + i as u64) & self.addr_mask();
            *b = self.read_byte_at(ba);
        }
        compose(&bytes[..n], self.endianness)
    }

    /// Writes the low `width` bytes of `data` at `addr`.
    pub fn write(&mut self, addr: Addr, data: u64, width: AccessWidth) {
        let len = u64::from(width.bytes());
        let a = u64::from(addr) & self.addr_mask();
        if a + len <= self.size() {
            if let Some(idx) = self.region_index(a) {
                if a + len <= self.regions[idx].end {
                    self.write_in_region(idx, a, data & width.mask(), width);
                    return;
                }
            }
        }
        let mut bytes = [0u8; 4];
        let n = width.bytes() as usize;
        decompose(data & width.mask(), &mut bytes[..n], self.endianness);
        for (i, b) in bytes[..n].iter().enumerate() {
            let ba = (u64::from(addr) + i as u64) & self.addr_mask();
            self.write_byte_at(ba, *b);
        }
    }

    fn read_in_region(&mut self, idx: usize, a: u64, width: AccessWidth) -> u64 {
        self.waits += u64::from(self.regions[idx].wait_states);
        let off = (a - self.regions[idx].start) as usize;
        let n = width.bytes() as usize;
        let endianness = self.endianness;
        match &self.regions[idx].backing {
            Backing::Ram(bytes) => compose(&bytes[off..off + n], endianness),
            Backing::Rom(bytes) => compose(&bytes[off..off + n], endianness),
            Backing::Handlers { read, .. } => {
                if read.is_bound() {
                    read.read(off as u32, width) & width.mask()
                } else {
                    debug!(space = self.name, addr = a, "read via unbound handler");
                    self.fill_value(width)
                }
            }
        }
    }

    fn write_in_region(&mut self, idx: usize, a: u64, data: u64, width: AccessWidth) {
        self.waits += u64::from(self.regions[idx].wait_states);
        let off = (a - self.regions[idx].start) as usize;
        let n = width.bytes() as usize;
        let endianness = self.endianness;
        let name = self.name;
        match &mut self.regions[idx].backing {
            Backing::Ram(bytes) => decompose(data, &mut bytes[off..off + n], endianness),
            Backing::Rom(_) => {
                trace!(space = name, addr = a, "write to rom dropped");
            }
            Backing::Handlers { write, .. } => {
                if write.is_bound() {
                    write.write(off as u32, data, width);
                } else {
                    debug!(space = name, addr = a, "write via unbound handler dropped");
                }
            }
        }
    }

    fn read_byte_at(&mut self, a: u64) -> u8 {
        match self.region_index(a) {
            Some(idx) => (self.read_in_region(idx, a, AccessWidth::Byte) & 0xff) as u8,
            None => {
                debug!(space = self.name, addr = a, "unmapped read");
                self.unmapped_fill
            }
        }
    }

    fn write_byte_at(&mut self, a: u64, b: u8) {
        match self.region_index(a) {
            Some(idx) => self.write_in_region(idx, a, u64::from(b), AccessWidth::Byte),
            None => {
                debug!(space = self.name, addr = a, "unmapped write dropped");
            }
        }
    }

    fn fill_value(&self, width: AccessWidth) -> u64 {
        let b = u64::from(self.unmapped_fill);
        match width {
            AccessWidth::Byte => b,
            AccessWidth::Half => b * 0x0101,
            AccessWidth::Word => b * 0x0101_0101,
        }
    }

    pub fn read_u8(&mut self, addr: Addr) -> u8 {
        self.read(addr, AccessWidth::Byte) as u8
    }

    pub fn read_u16(&mut self, addr: Addr) -> u16 {
        self.read(addr, AccessWidth::Half) as u16
    }

    pub fn read_u32(&mut self, addr: Addr) -> u32 {
        self.read(addr, AccessWidth::Word) as u32
    }

    pub fn write_u8(&mut self, addr: Addr, value: u8) {
        self.write(addr, u64::from(value), AccessWidth::Byte);
    }

    pub fn write_u16(&mut self, addr: Addr, value: u16) {
        self.write(addr, u64::from(value), AccessWidth::Half);
    }

    pub fn write_u32(&mut self, addr: Addr, value: u32) {
        self.write(addr, u64::from(value), AccessWidth::Word);
    }

    /// Byte-wise block read, routed per byte. Used by DMA engines; frame
    /// sized, so no bulk fast path.
    pub fn read_into(&mut self, addr: Addr, dst: &mut [u8]) {
        for (i, slot) in dst.iter_mut().enumerate() {
            let a = (u64::from(addr) + i as u64) & self.addr_mask();
            *slot = self.read_byte_at(a);
        }
    }

    /// Byte-wise block write, routed per byte.
    pub fn write_from(&mut self, addr: Addr, src: &[u8]) {
        for (i, b) in src.iter().enumerate() {
            let a = (u64::from(addr) + i as u64) & self.addr_mask();
            self.write_byte_at(a, *b);
        }
    }

    /// Drains the wait-state cycles accumulated since the last call. The
    /// executing CPU charges these to its budget after each access.
    pub fn take_waits(&mut self) -> u64 {
        std::mem::take(&mut self.waits)
    }
}

impl std::fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressSpace")
            .field("name", &self.name)
            .field("endianness", &self.endianness)
            .field("addr_bits", &self.addr_bits)
            .field("regions", &self.regions)
            .finish()
    }
}

fn compose(bytes: &[u8], endianness: Endianness) -> u64 {
    match endianness {
        Endianness::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        Endianness::Little => bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
    }
}

fn decompose(value: u64, bytes: &mut [u8], endianness: Endianness) {
    let n = bytes.len();
    for (i, b) in bytes.iter_mut().enumerate() {
        let shift = match endianness {
            Endianness::Big => 8 * (n - 1 - i),
            Endianness::Little => 8 * i,
        };
        *b = (value >> shift) as u8;
    }
}
