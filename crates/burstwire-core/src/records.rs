//! Session records: Settings and Results.
//!
//! Both records have pinned little-endian layouts so that peers built from
//! different toolchains interoperate bit-exactly. Settings travels once per
//! session (client to server); Results crosses in both directions at the end
//! of the session.

use crate::constants::{PROTOCOL_VERSION, RESULTS_WIRE_LEN, SETTINGS_WIRE_LEN};
use crate::error::FrameError;

/// Session parameters, sent by the client during the handshake.
///
/// Layout: `protocol_version(i32) | payload_size(i32) | frame_count(i32) |
/// reserved(i32)`, little-endian, 16 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub protocol_version: i32,
    pub payload_size: i32,
    pub frame_count: i32,
    pub reserved: i32,
}

impl Settings {
    /// Settings for the current protocol version.
    pub fn new(payload_size: i32, frame_count: i32) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            payload_size,
            frame_count,
            reserved: 0,
        }
    }

    pub fn encode(&self) -> [u8; SETTINGS_WIRE_LEN] {
        let mut buf = [0u8; SETTINGS_WIRE_LEN];
        buf[0..4].copy_from_slice(&self.protocol_version.to_le_bytes());
        buf[4..8].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.frame_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() != SETTINGS_WIRE_LEN {
            return Err(FrameError::LengthMismatch {
                expected: SETTINGS_WIRE_LEN,
                actual: buf.len(),
            });
        }
        let field = |i: usize| i32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        Ok(Self {
            protocol_version: field(0),
            payload_size: field(4),
            frame_count: field(8),
            reserved: field(12),
        })
    }

    /// Reject settings whose protocol version this implementation does not
    /// speak.
    pub fn check_version(&self) -> Result<(), FrameError> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(FrameError::UnsupportedVersion {
                peer: self.protocol_version,
                local: PROTOCOL_VERSION,
            });
        }
        Ok(())
    }
}

/// End-of-session statistics, exchanged by both peers in Phase 3.
///
/// Layout: `total_bytes(i64) | frames(i32) | errors(i32) | retransmits(i32) |
/// elapsed_secs(f64) | throughput_mib(f64) | chars_per_sec(f64)`,
/// little-endian, 44 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Results {
    /// On-wire bytes of every accepted (non-duplicate, valid) frame.
    pub total_bytes: i64,
    /// Frames received, counted in cursor order.
    pub frames: i32,
    /// Framing, checksum, and payload-pattern failures.
    pub errors: i32,
    /// Burst writes that failed, counted per frame in the burst.
    pub retransmits: i32,
    /// Wall-clock duration of the two data phases.
    pub elapsed_secs: f64,
    /// `total_bytes` in MiB per second.
    pub throughput_mib: f64,
    /// `total_bytes` per second.
    pub chars_per_sec: f64,
}

impl Results {
    /// Assemble a record from raw counters, deriving the rate fields.
    pub fn from_counts(
        total_bytes: i64,
        frames: i32,
        errors: i32,
        retransmits: i32,
        elapsed_secs: f64,
    ) -> Self {
        let (throughput_mib, chars_per_sec) = if elapsed_secs > 0.0 {
            (
                total_bytes as f64 / (1024.0 * 1024.0) / elapsed_secs,
                total_bytes as f64 / elapsed_secs,
            )
        } else {
            (0.0, 0.0)
        };
        Self {
            total_bytes,
            frames,
            errors,
            retransmits,
            elapsed_secs,
            throughput_mib,
            chars_per_sec,
        }
    }

    pub fn encode(&self) -> [u8; RESULTS_WIRE_LEN] {
        let mut buf = [0u8; RESULTS_WIRE_LEN];
        buf[0..8].copy_from_slice(&self.total_bytes.to_le_bytes());
        buf[8..12].copy_from_slice(&self.frames.to_le_bytes());
        buf[12..16].copy_from_slice(&self.errors.to_le_bytes());
        buf[16..20].copy_from_slice(&self.retransmits.to_le_bytes());
        buf[20..28].copy_from_slice(&self.elapsed_secs.to_le_bytes());
        buf[28..36].copy_from_slice(&self.throughput_mib.to_le_bytes());
        buf[36..44].copy_from_slice(&self.chars_per_sec.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() != RESULTS_WIRE_LEN {
            return Err(FrameError::LengthMismatch {
                expected: RESULTS_WIRE_LEN,
                actual: buf.len(),
            });
        }
        let i32_at = |i: usize| i32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        let f64_at = |i: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[i..i + 8]);
            f64::from_le_bytes(b)
        };
        let mut b64 = [0u8; 8];
        b64.copy_from_slice(&buf[0..8]);

        Ok(Self {
            total_bytes: i64::from_le_bytes(b64),
            frames: i32_at(8),
            errors: i32_at(12),
            retransmits: i32_at(16),
            elapsed_secs: f64_at(20),
            throughput_mib: f64_at(28),
            chars_per_sec: f64_at(36),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_encode_layout() {
        let settings = Settings::new(1024, 10);
        let wire = settings.encode();
        assert_eq!(&wire[0..4], &4i32.to_le_bytes());
        assert_eq!(&wire[4..8], &1024i32.to_le_bytes());
        assert_eq!(&wire[8..12], &10i32.to_le_bytes());
        assert_eq!(&wire[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn settings_roundtrip() {
        let settings = Settings::new(65525, 1_000_000);
        assert_eq!(Settings::decode(&settings.encode()).unwrap(), settings);
    }

    #[test]
    fn settings_version_check() {
        let good = Settings::new(1, 1);
        good.check_version().unwrap();

        let bad = Settings {
            protocol_version: 3,
            ..good
        };
        assert_eq!(
            bad.check_version(),
            Err(FrameError::UnsupportedVersion { peer: 3, local: 4 })
        );
    }

    #[test]
    fn settings_decode_wrong_length() {
        assert!(matches!(
            Settings::decode(&[0u8; 15]),
            Err(FrameError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn results_roundtrip() {
        let results = Results::from_counts(2368, 32, 0, 0, 1.25);
        let decoded = Results::decode(&results.encode()).unwrap();
        assert_eq!(decoded, results);
    }

    #[test]
    fn results_rates_derived() {
        let results = Results::from_counts(1024 * 1024, 16, 1, 2, 2.0);
        assert!((results.throughput_mib - 0.5).abs() < 1e-12);
        assert!((results.chars_per_sec - 524_288.0).abs() < 1e-9);
    }

    #[test]
    fn results_zero_elapsed_has_zero_rates() {
        let results = Results::from_counts(100, 1, 0, 0, 0.0);
        assert_eq!(results.throughput_mib, 0.0);
        assert_eq!(results.chars_per_sec, 0.0);
    }

    #[test]
    fn results_decode_wrong_length() {
        assert!(matches!(
            Results::decode(&[0u8; 43]),
            Err(FrameError::LengthMismatch { .. })
        ));
    }
}
