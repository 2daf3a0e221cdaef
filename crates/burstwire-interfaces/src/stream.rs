//! Generic link over any async byte stream.
//!
//! [`StreamLink`] splits a stream into read and write halves, each behind
//! its own mutex: one reader and one writer can run in parallel, but never
//! two of either. All timeout handling lives here; concrete endpoints
//! (serial, pipe) only construct the stream.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::LinkError;
use crate::timeout::transfer_timeout_ms;
use crate::traits::Link;

/// How long a purge waits for further stale bytes before concluding the
/// receive direction is drained.
const PURGE_POLL_MS: u64 = 5;

/// A [`Link`] over any `AsyncRead + AsyncWrite` stream.
pub struct StreamLink<T> {
    name: String,
    baud: u32,
    reader: Mutex<ReadHalf<T>>,
    writer: Mutex<WriteHalf<T>>,
}

impl<T> StreamLink<T>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap an open stream. `baud` drives timeout derivation and should be
    /// the real line rate for serial endpoints.
    pub fn new(name: impl Into<String>, baud: u32, io: T) -> Self {
        let (reader, writer) = tokio::io::split(io);
        Self {
            name: name.into(),
            baud,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }
}

impl<T> Link for StreamLink<T>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn baud_rate(&self) -> u32 {
        self.baud
    }

    async fn write(&self, data: &[u8]) -> Result<usize, LinkError> {
        let timeout_ms = transfer_timeout_ms(data.len(), self.baud);
        let mut writer = self.writer.lock().await;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), writer.write_all(data)).await
        {
            Ok(Ok(())) => {
                tracing::trace!(len = data.len(), "link write");
                Ok(data.len())
            }
            Ok(Err(e)) => Err(LinkError::Io(e)),
            Err(_) => Err(LinkError::WriteTimeout { timeout_ms }),
        }
    }

    async fn read(&self, len: usize, timeout_ms: u64) -> Result<Vec<u8>, LinkError> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let timeout_ms = if timeout_ms == 0 {
            transfer_timeout_ms(len, self.baud)
        } else {
            timeout_ms
        };
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        let mut reader = self.reader.lock().await;
        let mut buf = vec![0u8; len];
        let mut filled = 0usize;
        let mut closed = false;

        while filled < len {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match tokio::time::timeout(deadline - now, reader.read(&mut buf[filled..])).await {
                Ok(Ok(0)) => {
                    closed = true;
                    break;
                }
                Ok(Ok(n)) => filled += n,
                Ok(Err(e)) => return Err(LinkError::Io(e)),
                Err(_) => break,
            }
        }
        drop(reader);

        if filled == 0 {
            if closed {
                return Err(LinkError::Closed);
            }
            return Err(LinkError::ReadTimeout { timeout_ms });
        }
        buf.truncate(filled);
        tracing::trace!(requested = len, got = filled, "link read");
        Ok(buf)
    }

    async fn flush(&self) -> Result<(), LinkError> {
        let mut writer = self.writer.lock().await;
        writer.flush().await.map_err(LinkError::Io)
    }

    async fn purge(&self) -> Result<(), LinkError> {
        {
            let mut writer = self.writer.lock().await;
            writer.flush().await.map_err(LinkError::Io)?;
        }

        let mut reader = self.reader.lock().await;
        let mut scratch = [0u8; 4096];
        let mut discarded = 0usize;
        loop {
            match tokio::time::timeout(
                Duration::from_millis(PURGE_POLL_MS),
                reader.read(&mut scratch),
            )
            .await
            {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => return Err(LinkError::Io(e)),
                Err(_) => break,
            }
        }
        if discarded > 0 {
            tracing::debug!(discarded, name = %self.name, "purged stale bytes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::PipeLink;

    #[tokio::test]
    async fn write_then_exact_read() {
        let (a, b) = PipeLink::pair(115_200);
        let n = a.write(b"hello").await.unwrap();
        assert_eq!(n, 5);
        let got = b.read(5, 1000).await.unwrap();
        assert_eq!(got, b"hello");
    }

    #[tokio::test]
    async fn read_returns_partial_on_timeout() {
        let (a, b) = PipeLink::pair(115_200);
        a.write(b"abc").await.unwrap();
        let got = b.read(10, 50).await.unwrap();
        assert_eq!(got, b"abc");
    }

    #[tokio::test]
    async fn read_with_nothing_times_out() {
        let (_a, b) = PipeLink::pair(115_200);
        let err = b.read(4, 50).await.unwrap_err();
        assert!(matches!(err, LinkError::ReadTimeout { timeout_ms: 50 }));
    }

    #[tokio::test]
    async fn read_after_peer_drop_reports_closed() {
        let (a, b) = PipeLink::pair(115_200);
        drop(a);
        let err = b.read(4, 100).await.unwrap_err();
        assert!(matches!(err, LinkError::Closed));
    }

    #[tokio::test]
    async fn reads_accumulate_across_writes() {
        let (a, b) = PipeLink::pair(115_200);
        let reader = tokio::spawn(async move { b.read(6, 1000).await });
        a.write(b"abc").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        a.write(b"def").await.unwrap();
        let got = reader.await.unwrap().unwrap();
        assert_eq!(got, b"abcdef");
    }

    #[tokio::test]
    async fn purge_discards_pending_bytes() {
        let (a, b) = PipeLink::pair(115_200);
        a.write(&[0x55; 100]).await.unwrap();
        b.purge().await.unwrap();
        let err = b.read(1, 50).await.unwrap_err();
        assert!(matches!(err, LinkError::ReadTimeout { .. }));
    }

    #[tokio::test]
    async fn zero_length_read_is_empty() {
        let (_a, b) = PipeLink::pair(115_200);
        let got = b.read(0, 10).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn concurrent_read_and_write_do_not_block_each_other() {
        let (a, b) = PipeLink::pair(115_200);
        // Start a read on `a` that will sit idle while `a` also writes.
        let reader = tokio::spawn(async move {
            let got = a.read(3, 2000).await.unwrap();
            (a, got)
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let echoed = b.read(3, 1000).await;
        assert!(echoed.is_err(), "nothing written yet");

        // b answers; a's pending read completes even though a can write.
        b.write(b"xyz").await.unwrap();
        let (_a, got) = reader.await.unwrap();
        assert_eq!(got, b"xyz");
    }
}
