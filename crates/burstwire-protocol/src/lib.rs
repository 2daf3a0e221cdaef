//! Protocol state for burstwire transfers.
//!
//! This crate holds the stateful-but-pure side of the protocol: the
//! thread-safe sliding window with its dynamic size adaptation, and the
//! burst/progress policies the transfer engine consults. No I/O happens
//! here.

pub mod burst;
pub mod window;

pub use burst::{burst_cap, should_log_progress, should_log_receive_progress};
pub use window::SlidingWindow;
