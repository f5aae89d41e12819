//! Deterministic save-state encoding for emulated devices.
//!
//! The format is a small tag-length-value (TLV) encoding chosen for:
//! - deterministic byte output (canonical tag ordering)
//! - forward compatibility (unknown tags are skipped on load)
//! - explicit versioning (major/minor) per device
//!
//! Each device serializes to an independent blob; the machine layer keys the
//! blobs by device tag. Loading a blob from a newer minor version works (new
//! fields are ignored); a major version bump is a hard error.

#![forbid(unsafe_code)]

mod format;

pub use format::{
    codec, SnapshotError, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter,
};

/// Save-state contract for emulated devices.
///
/// Implementations must keep `DEVICE_ID` stable forever and only make
/// forward-compatible additions within the same major version by adding new
/// TLV fields.
pub trait DeviceSnapshot {
    const DEVICE_ID: [u8; 4];
    const DEVICE_VERSION: SnapshotVersion;

    fn save_state(&self) -> Vec<u8>;
    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()>;
}

/// Object-safe view of [`DeviceSnapshot`] for heterogeneous device lists.
/// Every `DeviceSnapshot` implements it via the blanket impl below.
pub trait SaveState {
    fn save_state(&self) -> Vec<u8>;
    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()>;
}

impl<T: DeviceSnapshot> SaveState for T {
    fn save_state(&self) -> Vec<u8> {
        DeviceSnapshot::save_state(self)
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        DeviceSnapshot::load_state(self, bytes)
    }
}
