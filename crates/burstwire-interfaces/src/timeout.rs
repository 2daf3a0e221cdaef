//! Transfer-timeout derivation.
//!
//! Timeouts for reads and writes are derived from the byte count and the
//! line rate: the time the bytes occupy the line at 10 bits per byte
//! (8 data + start + stop), multiplied by a safety factor, plus a constant
//! floor for scheduling slack.

use burstwire_core::constants::{
    BASE_TIMEOUT_MS, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS, TIMEOUT_SAFETY_FACTOR,
};

/// Timeout used when the line rate is unknown (baud of zero).
pub const FALLBACK_TIMEOUT_MS: u64 = 5000;

/// Milliseconds to allow for transferring `len` bytes at `baud`.
///
/// `(len × 10 / baud) × 2.5 × 1000 + 500`, clamped to `[200 ms, 60 s]`.
pub fn transfer_timeout_ms(len: usize, baud: u32) -> u64 {
    if baud == 0 {
        return FALLBACK_TIMEOUT_MS;
    }
    let transmit_ms = (len as f64 * 10.0 / baud as f64) * 1000.0 * TIMEOUT_SAFETY_FACTOR;
    let timeout = transmit_ms as u64 + BASE_TIMEOUT_MS;
    timeout.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_reads_get_the_base_floor() {
        // A 13-byte ACK at 115200 baud occupies ~1.1 ms of line time.
        assert_eq!(transfer_timeout_ms(13, 115_200), 502);
        assert_eq!(transfer_timeout_ms(11, 115_200), 502);
    }

    #[test]
    fn large_frames_scale_with_line_time() {
        // A 60010-byte frame at 115200 baud needs over 12 seconds.
        let t = transfer_timeout_ms(60_010, 115_200);
        assert_eq!(t, 13_523);
        assert!(t >= 12_000);
    }

    #[test]
    fn clamped_to_sixty_seconds() {
        assert_eq!(transfer_timeout_ms(10_000_000, 9_600), MAX_TIMEOUT_MS);
    }

    #[test]
    fn never_below_the_minimum() {
        assert!(transfer_timeout_ms(0, 1_000_000_000) >= MIN_TIMEOUT_MS);
    }

    #[test]
    fn zero_baud_falls_back() {
        assert_eq!(transfer_timeout_ms(100, 0), FALLBACK_TIMEOUT_MS);
    }
}
