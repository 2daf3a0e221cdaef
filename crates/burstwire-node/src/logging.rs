//! Tracing subscriber configuration.
//!
//! Log levels follow these conventions:
//! - ERROR: session-aborting failures, protocol violations
//! - WARN: recoverable errors (failed ACK write, results retry)
//! - INFO: phase transitions, progress milestones, the final report
//! - DEBUG: per-burst and per-frame events, window resizing
//! - TRACE: wire-level reads and writes
//!
//! Output goes to stderr and is tee'd into an append-only per-run file
//! named after the role, the port, and the start time.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// The per-run log file name: `serial_log_<role>_<port>_<YYYYMMDD_HHMMSS>.txt`.
///
/// Device paths are reduced to their last component so the name stays flat
/// (`/dev/ttyUSB0` becomes `ttyUSB0`).
pub fn log_file_name(role: &str, port: &str) -> String {
    let port_tag = port.rsplit(['/', '\\']).next().unwrap_or(port);
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("serial_log_{role}_{port_tag}_{stamp}.txt")
}

/// Initialize the subscriber with console output plus the per-run file.
///
/// The level defaults to `info`, or `debug` when `verbose` is set (large
/// frames enable detailed transfer logging); `RUST_LOG` overrides both.
pub fn init(log_path: &Path, verbose: bool) -> std::io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .init();
    Ok(())
}

/// Initialize the subscriber for tests. Safe to call repeatedly.
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_shape() {
        let name = log_file_name("client", "COM3");
        assert!(name.starts_with("serial_log_client_COM3_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn device_paths_are_flattened() {
        let name = log_file_name("server", "/dev/ttyUSB0");
        assert!(name.starts_with("serial_log_server_ttyUSB0_"));
        assert!(!name.contains('/'));
    }
}
