//! In-process duplex link pair.
//!
//! Backs protocol tests and same-host runs with the same semantics as a
//! serial line: a byte pipe with no framing, plus the buffered-write
//! behavior of a driver queue. The 1 MiB capacity mirrors the buffer sizing
//! used on real ports.

use tokio::io::DuplexStream;

use crate::stream::StreamLink;

/// Capacity of each direction of the pipe.
pub const PIPE_BUFFER: usize = 1024 * 1024;

/// A [`Link`](crate::traits::Link) over an in-process duplex stream.
pub type PipeLink = StreamLink<DuplexStream>;

impl StreamLink<DuplexStream> {
    /// Create a connected pair of pipe links sharing a nominal line rate.
    ///
    /// Bytes written to one end are readable from the other. The `baud`
    /// value only drives timeout derivation; the pipe itself is not paced.
    pub fn pair(baud: u32) -> (PipeLink, PipeLink) {
        let (a, b) = tokio::io::duplex(PIPE_BUFFER);
        (
            StreamLink::new("pipe-a", baud, a),
            StreamLink::new("pipe-b", baud, b),
        )
    }
}
