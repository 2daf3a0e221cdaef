//! Pure transfer policies: burst sizing and progress logging.

use burstwire_core::constants::FRAME_OVERHEAD;

/// Maximum frames per burst write, chosen by on-wire frame size.
///
/// Large frames are written one at a time so a single burst never
/// outgrows the derived write timeout; small frames are batched up to 16
/// per write to keep the line busy.
pub fn burst_cap(frame_wire_len: usize) -> usize {
    if frame_wire_len > 50_000 {
        1
    } else if frame_wire_len > 10_000 {
        4
    } else if frame_wire_len > 1_000 {
        8
    } else {
        16
    }
}

/// Burst cap for a transfer with `payload_size` bytes per frame.
pub fn burst_cap_for_payload(payload_size: usize) -> usize {
    burst_cap(payload_size + FRAME_OVERHEAD)
}

/// Whether the send monitor should log progress for `count` of `total`
/// acknowledged frames.
///
/// Milestones: every hundredth frame, the first ten, completion, or every
/// frame when the whole transfer is at most twenty frames.
pub fn should_log_progress(count: i32, total: i32) -> bool {
    count % 100 == 0 || count <= 10 || count == total || total <= 20
}

/// Whether the receive path should log progress for in-order arrival
/// `count`.
///
/// Narrower than the send monitor: every hundredth frame and the first
/// ten. The completion and small-transfer milestones are send-side only.
pub fn should_log_receive_progress(count: i32) -> bool {
    count % 100 == 0 || count <= 10
}
