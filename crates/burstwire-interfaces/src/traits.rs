//! The core link trait.

use crate::error::LinkError;

/// A full-duplex byte pipe with bounded blocking operations.
///
/// One read and one write may execute in parallel, but implementations
/// serialize concurrent reads against each other and concurrent writes
/// against each other. Protocol code above this trait works purely in whole
/// records: it asks for exactly the number of bytes the next frame occupies.
pub trait Link: Send + Sync {
    /// Human-readable endpoint name (port path or pipe label).
    fn name(&self) -> &str;

    /// Line rate in bits per second, used for timeout derivation.
    fn baud_rate(&self) -> u32;

    /// Write all of `data`, blocking up to a timeout derived from its
    /// length. Atomic relative to other `write` calls. Returns the number
    /// of bytes written (always `data.len()` on success).
    fn write(&self, data: &[u8]) -> impl Future<Output = Result<usize, LinkError>> + Send;

    /// Read up to `len` bytes, blocking up to `timeout_ms`.
    ///
    /// Returns the bytes actually read — possibly fewer than `len` — when
    /// the timeout elapses with partial data, and an error when nothing
    /// arrived at all. A `timeout_ms` of zero derives the timeout from
    /// `len` the same way `write` does.
    fn read(&self, len: usize, timeout_ms: u64)
    -> impl Future<Output = Result<Vec<u8>, LinkError>> + Send;

    /// Block until the transmit queue has drained.
    fn flush(&self) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Discard any bytes pending in either direction.
    fn purge(&self) -> impl Future<Output = Result<(), LinkError>> + Send;
}
