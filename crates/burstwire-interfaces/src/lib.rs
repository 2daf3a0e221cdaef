//! Link endpoints for the burstwire transfer protocol.
//!
//! A [`Link`](traits::Link) is a full-duplex byte pipe with bounded blocking
//! reads and writes, a flush, and a purge. Two endpoints are provided:
//! [`SerialLink`](serial::SerialLink) over a real serial port, and
//! [`PipeLink`](pipe::PipeLink), an in-process duplex pair for tests and
//! same-host runs.

pub mod error;
pub mod pipe;
pub mod serial;
pub mod shutdown;
pub mod stream;
pub mod timeout;
pub mod traits;

pub use error::LinkError;
pub use pipe::PipeLink;
pub use serial::SerialLink;
pub use shutdown::ShutdownToken;
pub use traits::Link;
