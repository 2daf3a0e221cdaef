//! Final session report.

use burstwire_core::records::{Results, Settings};

use crate::session::Role;

/// Log the end-of-session report: configuration, this peer's transmission
/// and reception results, and the peer's reception results as exchanged in
/// Phase 3.
pub fn log_final_report(role: Role, settings: &Settings, local: &Results, peer: &Results) {
    tracing::info!(role = role.as_str(), "=== final report ===");
    tracing::info!(
        payload_size = settings.payload_size,
        frame_count = settings.frame_count,
        protocol_version = settings.protocol_version,
        "test configuration"
    );
    tracing::info!(retransmits = local.retransmits, "local transmission");
    tracing::info!(
        frames = local.frames,
        of = settings.frame_count,
        bytes = local.total_bytes,
        errors = local.errors,
        elapsed_secs = local.elapsed_secs,
        throughput_mib = local.throughput_mib,
        chars_per_sec = local.chars_per_sec,
        "local reception"
    );
    tracing::info!(
        frames = peer.frames,
        of = settings.frame_count,
        bytes = peer.total_bytes,
        errors = peer.errors,
        retransmits = peer.retransmits,
        elapsed_secs = peer.elapsed_secs,
        throughput_mib = peer.throughput_mib,
        chars_per_sec = peer.chars_per_sec,
        "peer reception"
    );
}
