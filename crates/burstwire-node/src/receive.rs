//! The receive side of a transfer: immediate-ACK frame consumption.
//!
//! The receiver reads whole frames, acknowledges each one the moment its
//! delimiters check out — before checksum or payload validation — and
//! reassembles by sequence number. Sending the ACK first keeps the sender's
//! window moving even when the local copy is about to be discarded as a
//! duplicate; silence, not a NAK, is the retransmission signal for frames
//! that fail validation.

use std::collections::HashSet;

use burstwire_core::ack::AckFrame;
use burstwire_core::constants::{EOF, SOF};
use burstwire_core::frame::DataFrame;
use burstwire_core::pattern::PayloadPattern;
use burstwire_interfaces::LinkError;
use burstwire_interfaces::traits::Link;
use burstwire_protocol::burst::should_log_receive_progress;

use crate::error::SessionError;

/// Read timeout per frame. Generous relative to the per-byte line time so a
/// mid-frame scheduling stall does not split a frame across reads.
const FRAME_READ_TIMEOUT_MS: u64 = 3000;

/// Counters accumulated by one receive phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reception {
    /// On-wire bytes of every accepted frame (duplicates excluded).
    pub total_bytes: i64,
    /// Frames accepted, counted as the in-order cursor advances.
    pub frames: i32,
    /// Delimiter, checksum, and payload-pattern failures.
    pub errors: i32,
}

/// Receive `frame_count` frames of `payload_size` bytes each, validating
/// them against `pattern`.
///
/// Runs until every frame number below `frame_count` has been accepted.
/// Only a closed link aborts the loop; timeouts and invalid frames are
/// counted and retried by virtue of the sender re-emitting them.
pub async fn receive_frames<L: Link>(
    link: &L,
    payload_size: usize,
    frame_count: i32,
    pattern: PayloadPattern,
) -> Result<Reception, SessionError> {
    let frame_len = DataFrame::wire_len(payload_size);
    let mut received: HashSet<i32> = HashSet::new();
    let mut cursor: i32 = 0;
    let mut outcome = Reception::default();

    while cursor < frame_count {
        let chunk = match link.read(frame_len, FRAME_READ_TIMEOUT_MS).await {
            Ok(chunk) => chunk,
            Err(LinkError::Closed) => return Err(LinkError::Closed.into()),
            Err(_) => {
                tracing::debug!(cursor, "frame read timed out");
                continue;
            }
        };
        if chunk.len() != frame_len {
            tracing::debug!(got = chunk.len(), expected = frame_len, "short frame read");
            continue;
        }

        if chunk[0] != SOF || chunk[frame_len - 1] != EOF {
            outcome.errors += 1;
            tracing::debug!("frame delimiter mismatch");
            continue;
        }
        let frame = match DataFrame::decode(&chunk) {
            Ok(frame) => frame,
            Err(e) => {
                outcome.errors += 1;
                tracing::debug!(error = %e, "frame decode failed");
                continue;
            }
        };

        // ACK before deeper validation. The sender can slide immediately;
        // a duplicate or corrupt copy is discarded below without undoing
        // the acknowledgement.
        let ack = AckFrame::single(frame.frame_num);
        if let Err(e) = link.write(&ack.encode()).await {
            tracing::warn!(frame = frame.frame_num, error = %e, "ack write failed");
        }

        if received.contains(&frame.frame_num) {
            tracing::debug!(frame = frame.frame_num, "duplicate frame");
            continue;
        }

        if let Err(e) = frame.verify_checksum() {
            outcome.errors += 1;
            tracing::warn!(frame = frame.frame_num, error = %e, "checksum validation failed");
            continue;
        }
        if !pattern.matches(&frame.payload) {
            outcome.errors += 1;
            tracing::warn!(frame = frame.frame_num, "payload validation failed");
            continue;
        }

        received.insert(frame.frame_num);
        outcome.total_bytes += frame_len as i64;

        while received.contains(&cursor) {
            outcome.frames += 1;
            cursor += 1;
            if should_log_receive_progress(cursor) {
                tracing::info!(
                    received = cursor,
                    total = frame_count,
                    "frames received and validated"
                );
            }
        }
    }

    Ok(outcome)
}
