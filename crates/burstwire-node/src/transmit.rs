//! The send side of a transfer: burst transmission and ACK listening.
//!
//! A [`Transmission`] owns two worker tasks sharing one [`SlidingWindow`]:
//! the sender burst-writes every unacknowledged frame in the window, and
//! the ACK listener applies incoming bitmap ACKs, adapts the window, and
//! slides it forward. The transmission is done when the window has slid
//! past the last frame; there is no retransmit cap on this path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use burstwire_core::ack::AckFrame;
use burstwire_core::constants::{ACK_BITMAP_SPAN, ACK_FRAME_LEN, WINDOW_INIT};
use burstwire_core::frame::DataFrame;
use burstwire_core::pattern::PayloadPattern;
use burstwire_interfaces::shutdown::ShutdownToken;
use burstwire_interfaces::traits::Link;
use burstwire_interfaces::LinkError;
use burstwire_protocol::burst::burst_cap_for_payload;
use burstwire_protocol::window::SlidingWindow;

/// Sender idle wait when every window frame is acknowledged but the window
/// has not slid yet (ACKs still in flight).
const IDLE_WAIT_MS: u64 = 10;

/// Pause after each burst write so the receiver is not overrun.
const INTER_BURST_PAUSE_US: u64 = 100;

/// Read timeout per ACK-listener cycle. Short: a timed-out cycle just means
/// the sender re-emits whatever is still unacknowledged.
const ACK_READ_TIMEOUT_MS: u64 = 100;

/// RTT placeholder fed to the window on successful ACK cycles. No RTT
/// estimator is maintained; this keeps the high-RTT shrink rule inert.
const ACK_CYCLE_RTT_MS: f64 = 100.0;

/// One in-flight transmission: sender task + ACK-listener task.
pub struct Transmission {
    window: Arc<SlidingWindow>,
    shutdown: ShutdownToken,
    retransmits: Arc<AtomicU32>,
}

impl Transmission {
    /// Prepare all frames for the transfer and spawn both worker tasks.
    pub async fn start<L: Link + 'static>(
        link: Arc<L>,
        payload_size: usize,
        frame_count: i32,
        pattern: PayloadPattern,
    ) -> Self {
        let window = Arc::new(SlidingWindow::new(frame_count));
        let retransmits = Arc::new(AtomicU32::new(0));
        let shutdown = ShutdownToken::new();

        let frames = prepare_frames(payload_size, frame_count, pattern);

        let sender = tokio::spawn(sender_loop(
            Arc::clone(&link),
            Arc::clone(&window),
            frames,
            payload_size,
            Arc::clone(&retransmits),
            shutdown.subscribe(),
        ));
        let listener = tokio::spawn(ack_loop(link, Arc::clone(&window), shutdown.subscribe()));
        shutdown.add_task(sender).await;
        shutdown.add_task(listener).await;

        Self {
            window,
            shutdown,
            retransmits,
        }
    }

    /// The shared window, for progress monitoring.
    pub fn window(&self) -> &Arc<SlidingWindow> {
        &self.window
    }

    /// Frames counted as retransmitted due to failed burst writes.
    pub fn retransmits(&self) -> u32 {
        self.retransmits.load(Ordering::Relaxed)
    }

    /// Signal both workers to stop and await them.
    pub async fn stop(&self) {
        self.shutdown.signal_stop();
        self.shutdown.join_all().await;
    }
}

/// Materialize every frame of the transfer up front.
///
/// The `window_size` field is stamped per burst at emission time; the value
/// set here only covers frames inspected before their first emission.
fn prepare_frames(payload_size: usize, frame_count: i32, pattern: PayloadPattern) -> Vec<DataFrame> {
    let payload = pattern.fill(payload_size);
    (0..frame_count)
        .map(|num| DataFrame::new(num, WINDOW_INIT, payload.clone()))
        .collect()
}

/// Serialize up to `cap` frames from `to_send` into one contiguous buffer,
/// stamping each with the current window size. Returns the buffer and the
/// number of frames it holds.
fn build_burst(
    frames: &mut [DataFrame],
    to_send: &[i32],
    cap: usize,
    window_size: u16,
) -> (Vec<u8>, usize) {
    let count = to_send.len().min(cap);
    let mut buf = Vec::new();
    for &num in &to_send[..count] {
        let frame = &mut frames[num as usize];
        frame.window_size = window_size;
        frame.encode_into(&mut buf);
    }
    (buf, count)
}

async fn sender_loop<L: Link>(
    link: Arc<L>,
    window: Arc<SlidingWindow>,
    mut frames: Vec<DataFrame>,
    payload_size: usize,
    retransmits: Arc<AtomicU32>,
    stop_rx: watch::Receiver<bool>,
) {
    let cap = burst_cap_for_payload(payload_size);
    if cap < 16 {
        tracing::info!(
            frame_len = DataFrame::wire_len(payload_size),
            burst_cap = cap,
            "large frames detected, limiting burst size"
        );
    }

    while !*stop_rx.borrow() && !window.is_complete() {
        let to_send = window.frames_to_send();
        if to_send.is_empty() {
            tokio::time::sleep(Duration::from_millis(IDLE_WAIT_MS)).await;
            continue;
        }

        let (burst, count) = build_burst(&mut frames, &to_send, cap, window.window_size());
        match link.write(&burst).await {
            Ok(written) if written == burst.len() => {
                tracing::debug!(frames = count, bytes = written, "burst sent");
            }
            Ok(written) => {
                tracing::debug!(
                    frames = count,
                    wrote = written,
                    expected = burst.len(),
                    "short burst write"
                );
                retransmits.fetch_add(count as u32, Ordering::Relaxed);
                window.adjust(false, 0.0);
            }
            Err(e) => {
                tracing::debug!(frames = count, error = %e, "burst write failed");
                retransmits.fetch_add(count as u32, Ordering::Relaxed);
                window.adjust(false, 0.0);
            }
        }
        tokio::time::sleep(Duration::from_micros(INTER_BURST_PAUSE_US)).await;
    }
}

async fn ack_loop<L: Link>(
    link: Arc<L>,
    window: Arc<SlidingWindow>,
    stop_rx: watch::Receiver<bool>,
) {
    while !*stop_rx.borrow() && !window.is_complete() {
        let chunk = match link.read(ACK_FRAME_LEN, ACK_READ_TIMEOUT_MS).await {
            Ok(chunk) => chunk,
            Err(LinkError::Closed) => {
                tracing::debug!("ack listener: link closed");
                break;
            }
            Err(_) => continue,
        };
        if chunk.len() != ACK_FRAME_LEN {
            continue;
        }
        // Malformed ACKs are dropped silently.
        let Ok(ack) = AckFrame::decode(&chunk) else {
            continue;
        };

        let mut newly_acked = 0u32;
        for k in 0..ACK_BITMAP_SPAN {
            let frame_num = ack.base_frame_num + k;
            if frame_num >= window.frame_count() {
                break;
            }
            if ack.is_acked(frame_num) && !window.is_acked(frame_num) {
                window.mark_acked(frame_num);
                newly_acked += 1;
            }
        }
        if newly_acked > 0 {
            tracing::trace!(newly_acked, base = ack.base_frame_num, "ack applied");
            window.adjust(true, ACK_CYCLE_RTT_MS);
            window.slide();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burstwire_interfaces::PipeLink;

    #[test]
    fn prepare_frames_numbers_and_checksums() {
        let frames = prepare_frames(8, 3, PayloadPattern::Descending);
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.frame_num, i as i32);
            assert_eq!(frame.window_size, WINDOW_INIT);
            frame.verify_checksum().unwrap();
            assert!(PayloadPattern::Descending.matches(&frame.payload));
        }
    }

    #[test]
    fn build_burst_respects_cap_and_stamps_window() {
        let mut frames = prepare_frames(4, 10, PayloadPattern::Ascending);
        let to_send: Vec<i32> = (0..10).collect();
        let (buf, count) = build_burst(&mut frames, &to_send, 4, 20);
        assert_eq!(count, 4);
        assert_eq!(buf.len(), 4 * DataFrame::wire_len(4));

        let first = DataFrame::decode(&buf[..DataFrame::wire_len(4)]).unwrap();
        assert_eq!(first.frame_num, 0);
        assert_eq!(first.window_size, 20);
    }

    #[test]
    fn build_burst_with_fewer_frames_than_cap() {
        let mut frames = prepare_frames(4, 2, PayloadPattern::Ascending);
        let (buf, count) = build_burst(&mut frames, &[0, 1], 16, 16);
        assert_eq!(count, 2);
        assert_eq!(buf.len(), 2 * DataFrame::wire_len(4));
    }

    #[tokio::test]
    async fn transmission_completes_on_bitmap_ack() {
        let (sender_side, peer) = PipeLink::pair(115_200);
        let tx = Transmission::start(Arc::new(sender_side), 4, 3, PayloadPattern::Ascending).await;

        // The first burst carries all three frames.
        let wire_len = DataFrame::wire_len(4);
        let burst = peer.read(3 * wire_len, 1000).await.unwrap();
        assert_eq!(burst.len(), 3 * wire_len);
        let first = DataFrame::decode(&burst[..wire_len]).unwrap();
        assert_eq!(first.frame_num, 0);
        assert_eq!(first.window_size, WINDOW_INIT);

        // Acknowledge all three with one bitmap.
        let mut ack = AckFrame {
            base_frame_num: 0,
            bitmap: 0,
        };
        for n in 0..3 {
            ack.set_acked(n);
        }
        peer.write(&ack.encode()).await.unwrap();

        let window = Arc::clone(tx.window());
        tokio::time::timeout(Duration::from_secs(5), async {
            while !window.is_complete() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("transmission should complete after full bitmap ack");

        tx.stop().await;
        assert_eq!(tx.retransmits(), 0);
    }

    #[tokio::test]
    async fn failed_burst_writes_count_as_retransmits() {
        let (sender_side, peer) = PipeLink::pair(115_200);
        drop(peer);

        let tx = Transmission::start(Arc::new(sender_side), 4, 2, PayloadPattern::Ascending).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(tx.retransmits() > 0, "writes to a dropped peer must fail");
        assert!(!tx.window().is_complete());
        tx.stop().await;
    }
}
