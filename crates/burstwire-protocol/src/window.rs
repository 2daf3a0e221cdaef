//! Sliding window state for Selective-Repeat transmission.
//!
//! [`SlidingWindow`] tracks which frames of a transmission have been
//! acknowledged and how many may be outstanding at once. The window size
//! adapts during the transfer: three consecutive successful ACK cycles
//! double it, three consecutive failures (or a high RTT sample) halve it,
//! always clamped to `[WINDOW_MIN, WINDOW_MAX]`.
//!
//! All methods are `&self` and serialize through an internal mutex. The lock
//! is held only around scalar updates and set lookups, never across I/O, so
//! the sender task and the ACK-listener task can share one window freely.

use std::collections::HashSet;
use std::sync::Mutex;

use burstwire_core::constants::{WINDOW_INIT, WINDOW_MAX, WINDOW_MIN};

/// Consecutive successful ACK cycles required to grow the window.
const GROW_THRESHOLD: u32 = 3;

/// Consecutive failed cycles required to shrink the window.
const SHRINK_THRESHOLD: u32 = 3;

/// RTT (milliseconds) above which a successful cycle still shrinks the
/// window.
const HIGH_RTT_MS: f64 = 2000.0;

/// Thread-safe sliding window over frame numbers `0..frame_count`.
#[derive(Debug)]
pub struct SlidingWindow {
    frame_count: i32,
    inner: Mutex<WindowInner>,
}

#[derive(Debug)]
struct WindowInner {
    /// Lowest frame number not yet slid past. Never decreases.
    base: i32,
    /// Current window size in frames.
    window_size: u16,
    /// Largest window size reached during this transmission.
    peak_window: u16,
    /// Acknowledged frames at or above `base` (entries removed by `slide`).
    acked: HashSet<i32>,
    consecutive_successes: u32,
    consecutive_failures: u32,
}

impl SlidingWindow {
    /// A fresh window over `frame_count` frames, sized at `WINDOW_INIT`.
    pub fn new(frame_count: i32) -> Self {
        Self {
            frame_count,
            inner: Mutex::new(WindowInner {
                base: 0,
                window_size: WINDOW_INIT,
                peak_window: WINDOW_INIT,
                acked: HashSet::new(),
                consecutive_successes: 0,
                consecutive_failures: 0,
            }),
        }
    }

    /// Total frames in the transmission this window covers.
    pub fn frame_count(&self) -> i32 {
        self.frame_count
    }

    /// The left edge of the window.
    pub fn base(&self) -> i32 {
        self.lock().base
    }

    /// Current window size.
    pub fn window_size(&self) -> u16 {
        self.lock().window_size
    }

    /// Largest window size observed so far.
    pub fn peak_window(&self) -> u16 {
        self.lock().peak_window
    }

    /// Whether `frame_num` is inside `[base, base + window_size)`.
    pub fn in_window(&self, frame_num: i32) -> bool {
        let inner = self.lock();
        frame_num >= inner.base && frame_num < inner.base + inner.window_size as i32
    }

    /// Record an acknowledgement for `frame_num`. Idempotent.
    pub fn mark_acked(&self, frame_num: i32) {
        self.lock().acked.insert(frame_num);
    }

    /// Whether `frame_num` has been acknowledged and not yet slid past.
    pub fn is_acked(&self, frame_num: i32) -> bool {
        self.lock().acked.contains(&frame_num)
    }

    /// Advance `base` past every contiguously-acknowledged frame, dropping
    /// those entries. Returns the number of frames advanced.
    pub fn slide(&self) -> u32 {
        let mut inner = self.lock();
        let mut slid = 0;
        loop {
            let base = inner.base;
            if base >= self.frame_count || !inner.acked.remove(&base) {
                break;
            }
            inner.base = base + 1;
            slid += 1;
        }
        if slid > 0 {
            tracing::trace!(base = inner.base, slid, "window slid");
        }
        slid
    }

    /// Whether every frame has been acknowledged and slid past.
    pub fn is_complete(&self) -> bool {
        self.lock().base >= self.frame_count
    }

    /// Unacknowledged frames inside the current window, ascending.
    pub fn frames_to_send(&self) -> Vec<i32> {
        let inner = self.lock();
        let end = (inner.base + inner.window_size as i32).min(self.frame_count);
        (inner.base..end)
            .filter(|n| !inner.acked.contains(n))
            .collect()
    }

    /// Feed one transmission-cycle outcome into the window adaptation.
    ///
    /// On success, three consecutive cycles double the window (capped at
    /// `WINDOW_MAX`); a high `rtt_ms` sample halves it instead. On failure,
    /// three consecutive cycles halve it (floored at `WINDOW_MIN`).
    pub fn adjust(&self, success: bool, rtt_ms: f64) {
        let mut inner = self.lock();

        if success {
            inner.consecutive_successes += 1;
            inner.consecutive_failures = 0;

            if inner.consecutive_successes >= GROW_THRESHOLD {
                let grown = (inner.window_size * 2).min(WINDOW_MAX);
                if grown != inner.window_size {
                    tracing::debug!(from = inner.window_size, to = grown, "window grew");
                    inner.window_size = grown;
                    inner.peak_window = inner.peak_window.max(grown);
                }
                inner.consecutive_successes = 0;
            }

            if rtt_ms > HIGH_RTT_MS {
                let shrunk = (inner.window_size / 2).max(WINDOW_MIN);
                if shrunk != inner.window_size {
                    tracing::debug!(
                        from = inner.window_size,
                        to = shrunk,
                        rtt_ms,
                        "window shrank on high RTT"
                    );
                    inner.window_size = shrunk;
                }
                inner.consecutive_successes = 0;
            }
        } else {
            inner.consecutive_failures += 1;
            inner.consecutive_successes = 0;

            if inner.consecutive_failures >= SHRINK_THRESHOLD {
                let shrunk = (inner.window_size / 2).max(WINDOW_MIN);
                if shrunk != inner.window_size {
                    tracing::debug!(from = inner.window_size, to = shrunk, "window shrank");
                    inner.window_size = shrunk;
                }
                inner.consecutive_failures = 0;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowInner> {
        // A poisoned lock means a panic elsewhere already sank the transfer.
        self.inner.lock().expect("window mutex poisoned")
    }
}
