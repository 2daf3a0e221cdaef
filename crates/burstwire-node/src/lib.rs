//! Session orchestration for the burstwire transfer protocol.
//!
//! A session runs three phases over one [`Link`](burstwire_interfaces::Link):
//! a settings handshake, a bidirectional Selective-Repeat transfer (each
//! direction driven by a sender task and an ACK-listener task sharing a
//! sliding window), and a READY-synchronized results exchange.

pub mod error;
pub mod logging;
pub mod receive;
pub mod report;
pub mod session;
pub mod transmit;

pub use error::SessionError;
pub use session::{
    Role, SessionReport, SessionTimeouts, run_client, run_client_with, run_server,
    run_server_with,
};
