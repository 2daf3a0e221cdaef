//! Error types for session orchestration.

use burstwire_core::FrameError;
use burstwire_interfaces::LinkError;

/// Errors that abort a session.
///
/// Per-frame problems (checksum, pattern, framing) never surface here —
/// they are counted and retransmission handles them. This type covers the
/// conditions the protocol cannot recover from: link failures, handshake
/// rejection, and rendezvous timeouts.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("link error: {0}")]
    Link(#[from] LinkError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("short write of {what}: wrote {wrote} of {expected} bytes")]
    ShortWrite {
        what: &'static str,
        wrote: usize,
        expected: usize,
    },
    #[error("timed out waiting for peer ready signal")]
    ReadyTimeout,
    #[error("results exchange failed after retries")]
    ResultsExchange,
}
