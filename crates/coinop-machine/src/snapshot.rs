//! Whole-machine save state and NVRAM persistence.
//!
//! The machine container holds the scheduler clock plus one blob per
//! snapshot-capable device, keyed by device tag. Device blobs are opaque
//! here; each device validates its own id and version when it loads.
//! NVRAM travels in a separate container with the same tag-keyed layout,
//! because battery-backed contents outlive save states.

use coinop_device::InterfaceKind;
use coinop_snapshot::{
    codec, SaveState, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion,
    SnapshotWriter,
};
use thiserror::Error;
use tracing::debug;

use crate::machine::Machine;

pub(crate) const MACHINE_ID: [u8; 4] = *b"MACH";
pub(crate) const NVRAM_ID: [u8; 4] = *b"NVRM";
pub(crate) const MACHINE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

const TAG_CLOCK: u16 = 1;
const TAG_BOOST: u16 = 2;
const TAG_DEVICES: u16 = 3;

/// Why a machine-level restore was refused.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error(transparent)]
    Format(#[from] SnapshotError),
    #[error("state names unknown device {tag:?}")]
    UnknownDevice { tag: String },
    #[error("device {tag:?} has no {kind:?} interface")]
    MissingInterface { tag: String, kind: InterfaceKind },
    #[error("device {tag:?}: {source}")]
    Device { tag: String, source: SnapshotError },
}

fn encode_entries(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut enc = codec::Encoder::new().u16(entries.len() as u16);
    for (tag, blob) in entries {
        enc = enc
            .u16(tag.len() as u16)
            .bytes(tag.as_bytes())
            .u32(blob.len() as u32)
            .bytes(blob);
    }
    enc.finish()
}

fn decode_entries(buf: &[u8]) -> SnapshotResult<Vec<(String, Vec<u8>)>> {
    let mut dec = codec::Decoder::new(buf);
    let count = dec.u16()?;
    let mut entries = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let tag_len = usize::from(dec.u16()?);
        let tag = String::from_utf8_lossy(dec.bytes(tag_len)?).into_owned();
        let blob_len = dec.u32()? as usize;
        let blob = dec.bytes(blob_len)?.to_vec();
        entries.push((tag, blob));
    }
    dec.finish()?;
    Ok(entries)
}

impl Machine {
    /// Serializes the scheduler clock and every snapshot-capable device.
    /// Byte output is canonical: the same machine state always serializes
    /// to the same bytes.
    #[must_use]
    pub fn save_state(&self) -> Vec<u8> {
        let mut writer = SnapshotWriter::new(MACHINE_ID, MACHINE_VERSION);
        writer.field_u64(TAG_CLOCK, self.now());
        if let Some(until) = self.boost_until() {
            writer.field_u64(TAG_BOOST, until);
        }
        let entries: Vec<(String, Vec<u8>)> = self
            .tree()
            .snapshot_devices()
            .map(|(id, dev)| {
                let tag = self.tree().node(id).tag().as_str().to_owned();
                (tag, dev.borrow().save_state())
            })
            .collect();
        debug!(devices = entries.len(), "machine state saved");
        writer.field_bytes(TAG_DEVICES, encode_entries(&entries));
        writer.finish()
    }

    /// Restores a state produced by [`Machine::save_state`] on the same
    /// machine description. Every device named in the file must exist and
    /// expose a snapshot interface; devices the file does not mention are
    /// left untouched. On error the machine may be partially restored and
    /// should be discarded or reset by the caller.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), RestoreError> {
        let reader = SnapshotReader::parse(bytes, MACHINE_ID)?;
        reader.ensure_device_major(MACHINE_VERSION.major)?;
        let now = reader.u64(TAG_CLOCK)?.unwrap_or(0);
        let boost_until = reader.u64(TAG_BOOST)?;
        let entries = match reader.bytes(TAG_DEVICES) {
            Some(buf) => decode_entries(buf)?,
            None => Vec::new(),
        };
        for (tag, blob) in &entries {
            let id = self
                .tree()
                .lookup(tag)
                .ok_or_else(|| RestoreError::UnknownDevice { tag: tag.clone() })?;
            let dev =
                self.tree()
                    .query_snapshot(id)
                    .ok_or_else(|| RestoreError::MissingInterface {
                        tag: tag.clone(),
                        kind: InterfaceKind::Snapshot,
                    })?;
            dev.borrow_mut()
                .load_state(blob)
                .map_err(|source| RestoreError::Device {
                    tag: tag.clone(),
                    source,
                })?;
        }
        self.set_clock(now, boost_until);
        debug!(now, devices = entries.len(), "machine state restored");
        Ok(())
    }

    /// Serializes every NVRAM-capable device's battery-backed contents.
    #[must_use]
    pub fn save_nvram(&self) -> Vec<u8> {
        let mut writer = SnapshotWriter::new(NVRAM_ID, MACHINE_VERSION);
        let entries: Vec<(String, Vec<u8>)> = self
            .tree()
            .ids()
            .filter_map(|id| {
                self.tree().query_nvram(id).map(|dev| {
                    let tag = self.tree().node(id).tag().as_str().to_owned();
                    (tag, dev.borrow().nvram_read())
                })
            })
            .collect();
        writer.field_bytes(TAG_DEVICES, encode_entries(&entries));
        writer.finish()
    }

    /// Writes persisted NVRAM contents back into the devices that own them.
    pub fn load_nvram(&mut self, bytes: &[u8]) -> Result<(), RestoreError> {
        let reader = SnapshotReader::parse(bytes, NVRAM_ID)?;
        reader.ensure_device_major(MACHINE_VERSION.major)?;
        let entries = match reader.bytes(TAG_DEVICES) {
            Some(buf) => decode_entries(buf)?,
            None => Vec::new(),
        };
        for (tag, data) in &entries {
            let id = self
                .tree()
                .lookup(tag)
                .ok_or_else(|| RestoreError::UnknownDevice { tag: tag.clone() })?;
            let dev =
                self.tree()
                    .query_nvram(id)
                    .ok_or_else(|| RestoreError::MissingInterface {
                        tag: tag.clone(),
                        kind: InterfaceKind::Nvram,
                    })?;
            dev.borrow_mut().nvram_write(data);
        }
        Ok(())
    }

    /// Gives every NVRAM-capable device its factory contents. Run this on
    /// first boot, before any persisted file is loaded.
    pub fn init_nvram(&mut self) {
        let ids: Vec<_> = self.tree().ids().collect();
        for id in ids {
            if let Some(dev) = self.tree().query_nvram(id) {
                dev.borrow_mut().nvram_default();
            }
        }
    }
}
