//! Wire framing: sync byte, escape encoding, mod-256 checksum.
//!
//! A frame on the wire is `SYNC, node, length, body.., checksum` where
//! `length` counts the body bytes plus the checksum and the checksum sums
//! node, length, and body modulo 256. Every byte after the sync is subject
//! to escaping: the two reserved values are sent as the escape marker
//! followed by the value minus one. The checksum is computed over the
//! unescaped bytes.

use thiserror::Error;

/// Start-of-frame marker.
pub const SYNC: u8 = 0xe0;
/// Escape marker for reserved values inside the stream.
pub const ESCAPE: u8 = 0xd0;
/// Address every node listens on.
pub const BROADCAST: u8 = 0xff;
/// Node number replies are addressed to.
pub const HOST_NODE: u8 = 0x00;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame does not start with the sync byte")]
    BadSync,
    #[error("frame truncated: expected {expected} bytes after the length byte, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("checksum mismatch: computed {computed:#04x}, frame carries {carried:#04x}")]
    Checksum { computed: u8, carried: u8 },
    #[error("escape marker at end of frame")]
    DanglingEscape,
}

#[must_use]
pub fn checksum(node: u8, body: &[u8]) -> u8 {
    let length = (body.len() as u8).wrapping_add(1);
    body.iter()
        .fold(node.wrapping_add(length), |sum, &b| sum.wrapping_add(b))
}

/// Frame without escape encoding, for loopback paths that skip the wire.
#[must_use]
pub fn frame_raw(node: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(SYNC);
    out.push(node);
    out.push(body.len() as u8 + 1);
    out.extend_from_slice(body);
    out.push(checksum(node, body));
    out
}

fn push_escaped(out: &mut Vec<u8>, byte: u8) {
    if byte == SYNC || byte == ESCAPE {
        out.push(ESCAPE);
        out.push(byte - 1);
    } else {
        out.push(byte);
    }
}

/// Escape-encoded frame, the form that actually goes on the wire.
#[must_use]
pub fn frame_encoded(node: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 6);
    out.push(SYNC);
    push_escaped(&mut out, node);
    push_escaped(&mut out, body.len() as u8 + 1);
    for &byte in body {
        push_escaped(&mut out, byte);
    }
    push_escaped(&mut out, checksum(node, body));
    out
}

/// Decode one frame into its node address and body. Handles both encoded
/// and raw frames, since a raw frame simply contains no escape markers.
/// Bytes past the frame's declared length are ignored.
pub fn decode_frame(bytes: &[u8]) -> Result<(u8, Vec<u8>), FrameError> {
    let Some((&first, rest)) = bytes.split_first() else {
        return Err(FrameError::BadSync);
    };
    if first != SYNC {
        return Err(FrameError::BadSync);
    }

    let mut stream = Vec::with_capacity(rest.len());
    let mut it = rest.iter();
    while let Some(&byte) = it.next() {
        if byte == ESCAPE {
            let Some(&escaped) = it.next() else {
                return Err(FrameError::DanglingEscape);
            };
            stream.push(escaped.wrapping_add(1));
        } else {
            stream.push(byte);
        }
    }

    if stream.len() < 2 {
        return Err(FrameError::Truncated {
            expected: 2,
            found: stream.len(),
        });
    }
    let node = stream[0];
    let length = stream[1] as usize;
    if length == 0 {
        return Err(FrameError::Truncated {
            expected: 1,
            found: 0,
        });
    }
    let rest = &stream[2..];
    if rest.len() < length {
        return Err(FrameError::Truncated {
            expected: length,
            found: rest.len(),
        });
    }
    let body = &rest[..length - 1];
    let carried = rest[length - 1];
    let computed = checksum(node, body);
    if carried != computed {
        return Err(FrameError::Checksum { computed, carried });
    }
    Ok((node, body.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_bytes_are_escaped_and_recovered() {
        let body = [0x10, SYNC, ESCAPE, 0xdf, 0xcf];
        let wire = frame_encoded(0x01, &body);
        // The sync value may never reappear after the opening byte.
        assert!(!wire[1..].contains(&SYNC));
        assert!(wire.windows(2).any(|w| w == [ESCAPE, SYNC - 1]));
        assert!(wire.windows(2).any(|w| w == [ESCAPE, ESCAPE - 1]));
        let (node, decoded) = decode_frame(&wire).unwrap();
        assert_eq!(node, 0x01);
        assert_eq!(decoded, body);
    }

    #[test]
    fn raw_and_encoded_agree_when_nothing_needs_escaping() {
        let body = [0x20, 0x02, 0x02];
        assert_eq!(frame_raw(0x01, &body), frame_encoded(0x01, &body));
    }

    #[test]
    fn a_flipped_body_byte_fails_the_checksum() {
        let mut wire = frame_raw(0x01, &[0x10, 0x11]);
        wire[3] ^= 0x04;
        assert!(matches!(
            decode_frame(&wire),
            Err(FrameError::Checksum { .. })
        ));
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert_eq!(decode_frame(&[]), Err(FrameError::BadSync));
        assert_eq!(decode_frame(&[0x12, 0x01]), Err(FrameError::BadSync));
        assert_eq!(
            decode_frame(&[SYNC, 0x01, 0x05, 0x10]),
            Err(FrameError::Truncated {
                expected: 5,
                found: 1
            })
        );
        assert_eq!(
            decode_frame(&[SYNC, 0x01, ESCAPE]),
            Err(FrameError::DanglingEscape)
        );
    }

    #[test]
    fn an_escaped_checksum_byte_round_trips() {
        // node 0x01, body chosen so the checksum lands on the sync value.
        let body = [SYNC - 4, 0x00];
        let expected = checksum(0x01, &body);
        assert_eq!(expected, SYNC);
        let wire = frame_encoded(0x01, &body);
        assert_eq!(&wire[wire.len() - 2..], &[ESCAPE, SYNC - 1]);
        let (_, decoded) = decode_frame(&wire).unwrap();
        assert_eq!(decoded, body);
    }
}
