//! Protocol constants for burstwire V4.
//!
//! These values are normative: both peers must agree on them for the wire
//! formats and timeout behavior to line up.

/// Current protocol version, carried in the Settings record.
pub const PROTOCOL_VERSION: i32 = 4;

// ------------------------------------------------------------------ //
// Frame delimiter bytes
// ------------------------------------------------------------------ //

/// Start-of-frame byte for data frames.
pub const SOF: u8 = 0x02;

/// Start-of-frame byte for ACK and control frames.
pub const SOF_ACK: u8 = 0x04;

/// End-of-frame byte, shared by all frame types.
pub const EOF: u8 = 0x03;

// ------------------------------------------------------------------ //
// Frame sizing
// ------------------------------------------------------------------ //

/// Data frame header: `SOF(1) + frame_num(4) + window_size(2) + checksum(2)`.
pub const FRAME_HEADER_LEN: usize = 9;

/// Data frame trailer: `EOF(1)`.
pub const FRAME_TRAILER_LEN: usize = 1;

/// Total fixed overhead of a data frame around its payload.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_LEN + FRAME_TRAILER_LEN;

/// ACK frame: `SOF_ACK(1) + "ACK"(3) + base_frame_num(4) + bitmap(4) + EOF(1)`.
pub const ACK_FRAME_LEN: usize = 13;

/// READY frame: `SOF_ACK(1) + "READY"(5) + EOF(1)`.
pub const READY_FRAME_LEN: usize = 7;

/// Settings record: four little-endian i32 fields.
pub const SETTINGS_WIRE_LEN: usize = 16;

/// Results record: `i64 + i32 + i32 + i32 + f64 + f64 + f64`, little-endian.
pub const RESULTS_WIRE_LEN: usize = 44;

/// A bitmap ACK covers at most this many consecutive frames.
pub const ACK_BITMAP_SPAN: i32 = 32;

// ------------------------------------------------------------------ //
// Sliding window bounds
// ------------------------------------------------------------------ //

/// Window size at the start of every send phase.
pub const WINDOW_INIT: u16 = 16;

/// Lower clamp for dynamic window adjustment.
pub const WINDOW_MIN: u16 = 4;

/// Upper clamp for dynamic window adjustment.
pub const WINDOW_MAX: u16 = 32;

// ------------------------------------------------------------------ //
// Timeouts and retries
// ------------------------------------------------------------------ //

/// Reserved retransmit cap from earlier protocol revisions. V4 terminates
/// send phases on window completion only and never consults this.
pub const MAX_RETRANSMIT_ATTEMPTS: u32 = 5;

/// Safety multiplier applied to the computed line-transfer time.
pub const TIMEOUT_SAFETY_FACTOR: f64 = 2.5;

/// Constant added to every derived transfer timeout.
pub const BASE_TIMEOUT_MS: u64 = 500;

/// Lower clamp for derived transfer timeouts.
pub const MIN_TIMEOUT_MS: u64 = 200;

/// Upper clamp for derived transfer timeouts (very large frames).
pub const MAX_TIMEOUT_MS: u64 = 60_000;
