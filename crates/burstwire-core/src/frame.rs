//! Data frame wire codec.
//!
//! Layout: `SOF(1) | frame_num(i32 LE) | window_size(u16 LE) |
//! checksum(u16 LE) | payload(N) | EOF(1)` — 10 bytes of overhead around a
//! fixed-per-session payload.

extern crate alloc;
use alloc::vec::Vec;

use crate::checksum::xor_rotate;
use crate::constants::{EOF, FRAME_OVERHEAD, SOF};
use crate::error::FrameError;

/// A single payload-bearing frame.
///
/// The checksum is computed once from the payload at construction and never
/// changes afterward. `window_size` is a snapshot of the sender's window at
/// emission time and is informational on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    pub frame_num: i32,
    pub window_size: u16,
    pub checksum: u16,
    pub payload: Vec<u8>,
}

impl DataFrame {
    /// Build a frame from its payload, computing the checksum.
    pub fn new(frame_num: i32, window_size: u16, payload: Vec<u8>) -> Self {
        let checksum = xor_rotate(&payload);
        Self {
            frame_num,
            window_size,
            checksum,
            payload,
        }
    }

    /// On-wire length of a frame carrying `payload_len` payload bytes.
    pub const fn wire_len(payload_len: usize) -> usize {
        payload_len + FRAME_OVERHEAD
    }

    /// Append this frame's wire encoding to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(Self::wire_len(self.payload.len()));
        buf.push(SOF);
        buf.extend_from_slice(&self.frame_num.to_le_bytes());
        buf.extend_from_slice(&self.window_size.to_le_bytes());
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.push(EOF);
    }

    /// Encode this frame into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::wire_len(self.payload.len()));
        self.encode_into(&mut buf);
        buf
    }

    /// Decode a frame from its exact wire encoding.
    ///
    /// Checks the delimiters and the fixed overhead only; checksum
    /// verification is a separate step ([`verify_checksum`](Self::verify_checksum)).
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < FRAME_OVERHEAD {
            return Err(FrameError::TooShort {
                min: FRAME_OVERHEAD,
                actual: buf.len(),
            });
        }
        if buf[0] != SOF {
            return Err(FrameError::BadSof {
                expected: SOF,
                actual: buf[0],
            });
        }
        let last = buf[buf.len() - 1];
        if last != EOF {
            return Err(FrameError::BadEof { actual: last });
        }

        let frame_num = i32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
        let window_size = u16::from_le_bytes([buf[5], buf[6]]);
        let checksum = u16::from_le_bytes([buf[7], buf[8]]);
        let payload = buf[9..buf.len() - 1].to_vec();

        Ok(Self {
            frame_num,
            window_size,
            checksum,
            payload,
        })
    }

    /// Compare the stored checksum against one recomputed from the payload.
    pub fn verify_checksum(&self) -> Result<(), FrameError> {
        let computed = xor_rotate(&self.payload);
        if computed != self.checksum {
            return Err(FrameError::ChecksumMismatch {
                stored: self.checksum,
                computed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout() {
        let frame = DataFrame::new(0x0403_0201, 0x0605, vec![0xAA, 0xBB]);
        let wire = frame.encode();
        assert_eq!(wire.len(), DataFrame::wire_len(2));
        assert_eq!(wire[0], SOF);
        assert_eq!(&wire[1..5], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&wire[5..7], &[0x05, 0x06]);
        assert_eq!(&wire[7..9], &frame.checksum.to_le_bytes());
        assert_eq!(&wire[9..11], &[0xAA, 0xBB]);
        assert_eq!(wire[11], EOF);
    }

    #[test]
    fn roundtrip() {
        let frame = DataFrame::new(42, 16, (0..100u8).collect());
        let decoded = DataFrame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded, frame);
        decoded.verify_checksum().unwrap();
    }

    #[test]
    fn empty_payload_roundtrip() {
        let frame = DataFrame::new(0, 4, Vec::new());
        assert_eq!(frame.checksum, 0);
        let wire = frame.encode();
        assert_eq!(wire.len(), FRAME_OVERHEAD);
        let decoded = DataFrame::decode(&wire).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn decode_too_short() {
        let err = DataFrame::decode(&[SOF, 0, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            FrameError::TooShort {
                min: FRAME_OVERHEAD,
                actual: 4
            }
        );
    }

    #[test]
    fn decode_bad_delimiters() {
        let mut wire = DataFrame::new(1, 16, vec![0x11]).encode();
        wire[0] = 0x7E;
        assert!(matches!(
            DataFrame::decode(&wire),
            Err(FrameError::BadSof { .. })
        ));

        let mut wire = DataFrame::new(1, 16, vec![0x11]).encode();
        let last = wire.len() - 1;
        wire[last] = 0x00;
        assert!(matches!(
            DataFrame::decode(&wire),
            Err(FrameError::BadEof { actual: 0x00 })
        ));
    }

    #[test]
    fn corrupted_payload_fails_checksum_only() {
        let frame = DataFrame::new(3, 16, vec![0x10, 0x20, 0x30]);
        let mut wire = frame.encode();
        wire[10] ^= 0x01; // flip one payload bit

        // Decode still succeeds — delimiters are intact.
        let decoded = DataFrame::decode(&wire).unwrap();
        assert!(matches!(
            decoded.verify_checksum(),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn negative_frame_num_roundtrip() {
        let frame = DataFrame::new(-1, 4, vec![0x00]);
        let decoded = DataFrame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded.frame_num, -1);
    }
}
