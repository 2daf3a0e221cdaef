//! Bitmap ACK frame and READY control frame.
//!
//! ACK layout: `SOF_ACK(1) | 'A' 'C' 'K' | base_frame_num(i32 LE) |
//! bitmap(u32 LE) | EOF(1)` — 13 bytes. Bit k of the bitmap acknowledges
//! frame `base_frame_num + k`, so one ACK covers up to 32 consecutive
//! frames.
//!
//! READY is the 7-byte literal `SOF_ACK 'R' 'E' 'A' 'D' 'Y' EOF`, used only
//! for the results-phase rendezvous.

use crate::constants::{ACK_BITMAP_SPAN, ACK_FRAME_LEN, EOF, READY_FRAME_LEN, SOF_ACK};
use crate::error::FrameError;

/// The READY control frame, byte for byte.
pub const READY_FRAME: [u8; READY_FRAME_LEN] = [SOF_ACK, b'R', b'E', b'A', b'D', b'Y', EOF];

/// Whether `buf` is exactly a READY frame.
pub fn is_ready_frame(buf: &[u8]) -> bool {
    buf == &READY_FRAME[..]
}

/// A bitmap acknowledgement covering up to 32 consecutive frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AckFrame {
    /// Frame number corresponding to bit 0 of the bitmap.
    pub base_frame_num: i32,
    /// Bit k set means frame `base_frame_num + k` is acknowledged.
    pub bitmap: u32,
}

impl AckFrame {
    /// An ACK for a single frame: base at the frame itself, bit 0 set.
    pub fn single(frame_num: i32) -> Self {
        Self {
            base_frame_num: frame_num,
            bitmap: 1,
        }
    }

    /// Whether `frame_num` falls inside the bitmap and its bit is set.
    pub fn is_acked(&self, frame_num: i32) -> bool {
        let offset = frame_num - self.base_frame_num;
        if !(0..ACK_BITMAP_SPAN).contains(&offset) {
            return false;
        }
        self.bitmap & (1u32 << offset) != 0
    }

    /// Set the bit for `frame_num` if it falls inside the bitmap span.
    pub fn set_acked(&mut self, frame_num: i32) {
        let offset = frame_num - self.base_frame_num;
        if (0..ACK_BITMAP_SPAN).contains(&offset) {
            self.bitmap |= 1u32 << offset;
        }
    }

    /// Encode to the fixed 13-byte wire form.
    pub fn encode(&self) -> [u8; ACK_FRAME_LEN] {
        let mut buf = [0u8; ACK_FRAME_LEN];
        buf[0] = SOF_ACK;
        buf[1] = b'A';
        buf[2] = b'C';
        buf[3] = b'K';
        buf[4..8].copy_from_slice(&self.base_frame_num.to_le_bytes());
        buf[8..12].copy_from_slice(&self.bitmap.to_le_bytes());
        buf[12] = EOF;
        buf
    }

    /// Decode from the fixed 13-byte wire form.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() != ACK_FRAME_LEN {
            return Err(FrameError::LengthMismatch {
                expected: ACK_FRAME_LEN,
                actual: buf.len(),
            });
        }
        if buf[0] != SOF_ACK {
            return Err(FrameError::BadSof {
                expected: SOF_ACK,
                actual: buf[0],
            });
        }
        if buf[12] != EOF {
            return Err(FrameError::BadEof { actual: buf[12] });
        }
        if &buf[1..4] != b"ACK" {
            return Err(FrameError::BadMarker);
        }

        Ok(Self {
            base_frame_num: i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            bitmap: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }
}
