use thiserror::Error;

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot truncated")]
    Truncated,
    #[error("device id mismatch: expected {expected:?}, found {found:?}")]
    DeviceIdMismatch { expected: [u8; 4], found: [u8; 4] },
    #[error("unsupported snapshot major version {found} (supported: {supported})")]
    UnsupportedVersion { supported: u16, found: u16 },
    #[error("field {tag} is {len} bytes, expected {expected}")]
    FieldSize { tag: u16, len: usize, expected: usize },
    #[error("field {tag} holds invalid value {value}")]
    FieldValue { tag: u16, value: u64 },
    #[error("trailing bytes after decoding")]
    TrailingBytes,
}

/// Device blob version. Minor bumps are forward compatible (new TLV fields
/// only); major bumps are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotVersion {
    pub major: u16,
    pub minor: u16,
}

impl SnapshotVersion {
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

/// Builds one device blob: a fixed header (device id + version) followed by
/// TLV fields. `finish` sorts fields by tag, so the byte output does not
/// depend on the order the caller emitted them in.
pub struct SnapshotWriter {
    id: [u8; 4],
    version: SnapshotVersion,
    fields: Vec<(u16, Vec<u8>)>,
}

impl SnapshotWriter {
    #[must_use]
    pub fn new(id: [u8; 4], version: SnapshotVersion) -> Self {
        Self {
            id,
            version,
            fields: Vec::new(),
        }
    }

    pub fn field_u8(&mut self, tag: u16, value: u8) {
        self.fields.push((tag, vec![value]));
    }

    pub fn field_u16(&mut self, tag: u16, value: u16) {
        self.fields.push((tag, value.to_le_bytes().to_vec()));
    }

    pub fn field_u32(&mut self, tag: u16, value: u32) {
        self.fields.push((tag, value.to_le_bytes().to_vec()));
    }

    pub fn field_u64(&mut self, tag: u16, value: u64) {
        self.fields.push((tag, value.to_le_bytes().to_vec()));
    }

    pub fn field_bytes(&mut self, tag: u16, value: Vec<u8>) {
        self.fields.push((tag, value));
    }

    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.fields.sort_by_key(|(tag, _)| *tag);
        let mut out = Vec::new();
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.version.major.to_le_bytes());
        out.extend_from_slice(&self.version.minor.to_le_bytes());
        for (tag, value) in &self.fields {
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
            out.extend_from_slice(value);
        }
        out
    }
}

/// Parses one device blob. Fields are looked up by tag; tags the caller
/// never asks about are ignored, which is what makes minor-version additions
/// safe to load with older code.
pub struct SnapshotReader<'a> {
    version: SnapshotVersion,
    fields: Vec<(u16, &'a [u8])>,
}

impl<'a> SnapshotReader<'a> {
    pub fn parse(bytes: &'a [u8], expected_id: [u8; 4]) -> SnapshotResult<Self> {
        if bytes.len() < 8 {
            return Err(SnapshotError::Truncated);
        }
        let mut found = [0u8; 4];
        found.copy_from_slice(&bytes[..4]);
        if found != expected_id {
            return Err(SnapshotError::DeviceIdMismatch {
                expected: expected_id,
                found,
            });
        }
        let major = u16::from_le_bytes([bytes[4], bytes[5]]);
        let minor = u16::from_le_bytes([bytes[6], bytes[7]]);

        let mut fields = Vec::new();
        let mut pos = 8usize;
        while pos < bytes.len() {
            if bytes.len() - pos < 6 {
                return Err(SnapshotError::Truncated);
            }
            let tag = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
            let len = u32::from_le_bytes([
                bytes[pos + 2],
                bytes[pos + 3],
                bytes[pos + 4],
                bytes[pos + 5],
            ]) as usize;
            pos += 6;
            if bytes.len() - pos < len {
                return Err(SnapshotError::Truncated);
            }
            fields.push((tag, &bytes[pos..pos + len]));
            pos += len;
        }

        Ok(Self {
            version: SnapshotVersion::new(major, minor),
            fields,
        })
    }

    #[must_use]
    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    pub fn ensure_device_major(&self, supported: u16) -> SnapshotResult<()> {
        if self.version.major != supported {
            return Err(SnapshotError::UnsupportedVersion {
                supported,
                found: self.version.major,
            });
        }
        Ok(())
    }

    fn field(&self, tag: u16) -> Option<&'a [u8]> {
        self.fields
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| *v)
    }

    fn fixed<const N: usize>(&self, tag: u16) -> SnapshotResult<Option<[u8; N]>> {
        let Some(raw) = self.field(tag) else {
            return Ok(None);
        };
        let arr: [u8; N] = raw.try_into().map_err(|_| SnapshotError::FieldSize {
            tag,
            len: raw.len(),
            expected: N,
        })?;
        Ok(Some(arr))
    }

    pub fn u8(&self, tag: u16) -> SnapshotResult<Option<u8>> {
        Ok(self.fixed::<1>(tag)?.map(|b| b[0]))
    }

    pub fn u16(&self, tag: u16) -> SnapshotResult<Option<u16>> {
        Ok(self.fixed::<2>(tag)?.map(u16::from_le_bytes))
    }

    pub fn u32(&self, tag: u16) -> SnapshotResult<Option<u32>> {
        Ok(self.fixed::<4>(tag)?.map(u32::from_le_bytes))
    }

    pub fn u64(&self, tag: u16) -> SnapshotResult<Option<u64>> {
        Ok(self.fixed::<8>(tag)?.map(u64::from_le_bytes))
    }

    #[must_use]
    pub fn bytes(&self, tag: u16) -> Option<&'a [u8]> {
        self.field(tag)
    }
}

/// Plain little-endian byte stream helpers for nested structures inside one
/// TLV field (a list of records, a sub-device).
pub mod codec {
    use super::{SnapshotError, SnapshotResult};

    #[derive(Default)]
    pub struct Encoder {
        buf: Vec<u8>,
    }

    impl Encoder {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn u8(mut self, v: u8) -> Self {
            self.buf.push(v);
            self
        }

        #[must_use]
        pub fn bool(self, v: bool) -> Self {
            self.u8(u8::from(v))
        }

        #[must_use]
        pub fn u16(mut self, v: u16) -> Self {
            self.buf.extend_from_slice(&v.to_le_bytes());
            self
        }

        #[must_use]
        pub fn u32(mut self, v: u32) -> Self {
            self.buf.extend_from_slice(&v.to_le_bytes());
            self
        }

        #[must_use]
        pub fn u64(mut self, v: u64) -> Self {
            self.buf.extend_from_slice(&v.to_le_bytes());
            self
        }

        #[must_use]
        pub fn bytes(mut self, v: &[u8]) -> Self {
            self.buf.extend_from_slice(v);
            self
        }

        #[must_use]
        pub fn finish(self) -> Vec<u8> {
            self.buf
        }
    }

    pub struct Decoder<'a> {
        buf: &'a [u8],
        pos: usize,
    }

    impl<'a> Decoder<'a> {
        #[must_use]
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, pos: 0 }
        }

        fn take(&mut self, n: usize) -> SnapshotResult<&'a [u8]> {
            if self.buf.len() - self.pos < n {
                return Err(SnapshotError::Truncated);
            }
            let out = &self.buf[self.pos..self.pos + n];
            self.pos += n;
            Ok(out)
        }

        pub fn u8(&mut self) -> SnapshotResult<u8> {
            Ok(self.take(1)?[0])
        }

        pub fn bool(&mut self) -> SnapshotResult<bool> {
            Ok(self.u8()? != 0)
        }

        pub fn u16(&mut self) -> SnapshotResult<u16> {
            let b = self.take(2)?;
            Ok(u16::from_le_bytes([b[0], b[1]]))
        }

        pub fn u32(&mut self) -> SnapshotResult<u32> {
            let b = self.take(4)?;
            Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        }

        pub fn u64(&mut self) -> SnapshotResult<u64> {
            let b = self.take(8)?;
            let mut arr = [0u8; 8];
            arr.copy_from_slice(b);
            Ok(u64::from_le_bytes(arr))
        }

        pub fn bytes(&mut self, n: usize) -> SnapshotResult<&'a [u8]> {
            self.take(n)
        }

        /// Decoding must consume the whole field; leftovers mean the record
        /// layout drifted.
        pub fn finish(self) -> SnapshotResult<()> {
            if self.pos != self.buf.len() {
                return Err(SnapshotError::TrailingBytes);
            }
            Ok(())
        }
    }
}
