//! Error types for the link layer.

/// Errors that can occur during link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
    #[error("read timed out after {timeout_ms} ms with no data")]
    ReadTimeout { timeout_ms: u64 },
    #[error("write timed out after {timeout_ms} ms")]
    WriteTimeout { timeout_ms: u64 },
    #[error("link closed by peer")]
    Closed,
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl LinkError {
    /// Whether this error is a read timeout (benign on polling paths).
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            LinkError::ReadTimeout { .. } | LinkError::WriteTimeout { .. }
        )
    }
}
