//! Error types for the burstwire-core crate.

use core::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    TooShort { min: usize, actual: usize },
    BadSof { expected: u8, actual: u8 },
    BadEof { actual: u8 },
    BadMarker,
    LengthMismatch { expected: usize, actual: usize },
    ChecksumMismatch { stored: u16, computed: u16 },
    UnsupportedVersion { peer: i32, local: i32 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::TooShort { min, actual } => {
                write!(f, "frame too short: need at least {min} bytes, got {actual}")
            }
            FrameError::BadSof { expected, actual } => {
                write!(f, "bad start-of-frame byte: expected 0x{expected:02x}, got 0x{actual:02x}")
            }
            FrameError::BadEof { actual } => {
                write!(f, "bad end-of-frame byte: got 0x{actual:02x}")
            }
            FrameError::BadMarker => write!(f, "frame marker string mismatch"),
            FrameError::LengthMismatch { expected, actual } => {
                write!(f, "record length mismatch: expected {expected} bytes, got {actual}")
            }
            FrameError::ChecksumMismatch { stored, computed } => {
                write!(
                    f,
                    "checksum mismatch: stored 0x{stored:04x}, computed 0x{computed:04x}"
                )
            }
            FrameError::UnsupportedVersion { peer, local } => {
                write!(f, "protocol version mismatch: peer {peer}, local {local}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}
