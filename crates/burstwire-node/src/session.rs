//! The three-phase session state machine.
//!
//! Phase 0: the client sends a 16-byte Settings record and expects the
//! ASCII literal `ACK`; the server verifies the protocol version first.
//! Phases 1–2: client→server then server→client Selective-Repeat transfer,
//! each with its own deterministic payload pattern. Phase 3: a two-sided
//! READY rendezvous followed by a Results exchange in both directions.
//!
//! Between phases each role settles briefly and purges its receive
//! direction: duplicate frames and duplicate ACKs from the finished phase
//! may still be in flight, and a single stale byte would desynchronize the
//! next phase's fixed-size reads. Settle times are staggered so a purge
//! always lands before the peer's next bytes do.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use burstwire_core::ack::{READY_FRAME, is_ready_frame};
use burstwire_core::constants::{
    READY_FRAME_LEN, RESULTS_WIRE_LEN, SETTINGS_WIRE_LEN, WINDOW_INIT, WINDOW_MAX,
};
use burstwire_core::pattern::PayloadPattern;
use burstwire_core::records::{Results, Settings};
use burstwire_interfaces::traits::Link;
use burstwire_protocol::burst::should_log_progress;

use crate::error::SessionError;
use crate::receive::{Reception, receive_frames};
use crate::report::log_final_report;
use crate::transmit::Transmission;

/// Wait after opening the port before the first handshake byte, so an
/// externally looped-back line is quiet.
const STABILIZATION_MS: u64 = 1000;

/// Wait after writing Settings before expecting the handshake ACK.
const SETTINGS_SETTLE_MS: u64 = 100;

/// Client-side timeout for the 3-byte handshake ACK.
const HANDSHAKE_ACK_TIMEOUT_MS: u64 = 10_000;

/// Server-side timeout for the Settings record.
const SETTINGS_READ_TIMEOUT_MS: u64 = 60_000;

/// Settle before a receive phase; stale ACKs from the previous phase have
/// landed by then and are purged.
const RECEIVE_SETTLE_MS: u64 = 200;

/// Settle before a send phase; longer than the receive settle so the peer
/// has purged before the first burst hits the wire.
const SEND_SETTLE_MS: u64 = 600;

/// Quiet period before the results phase, server side.
const RESULTS_QUIET_SERVER_MS: u64 = 1000;

/// Quiet period before the results phase, client side; longer than the
/// server's so the server's purge precedes the client's READY.
const RESULTS_QUIET_CLIENT_MS: u64 = 1500;

/// Total wait for the peer's READY frame.
const READY_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Read timeout per READY poll.
const READY_POLL_TIMEOUT_MS: u64 = 100;

/// Read timeout per Results attempt.
const RESULTS_READ_TIMEOUT_MS: u64 = 15_000;

/// Results read attempts before giving up.
const RESULTS_READ_ATTEMPTS: u32 = 3;

/// Pause between failed Results attempts.
const RESULTS_RETRY_PAUSE_MS: u64 = 500;

/// Progress-monitor poll interval during a send phase.
const MONITOR_POLL_MS: u64 = 100;

/// Which side of the session this peer plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }
}

/// Everything a completed session produced.
#[derive(Debug, Clone, Copy)]
pub struct SessionReport {
    /// The negotiated session parameters.
    pub settings: Settings,
    /// This peer's own results.
    pub local: Results,
    /// The peer's results as received in Phase 3.
    pub peer: Results,
    /// Largest window size this peer's send phase reached.
    pub peak_window: u16,
}

/// Wall-clock bounds a session honors at its rendezvous points.
///
/// Production sessions use the defaults; tests inject shorter bounds to
/// exercise the timeout paths without sitting through the full waits.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimeouts {
    /// Total wait for the peer's READY frame in Phase 3.
    pub ready_wait_ms: u64,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            ready_wait_ms: READY_WAIT_TIMEOUT_MS,
        }
    }
}

/// Run the initiating side: handshake, transmit, receive, exchange results.
pub async fn run_client<L: Link + 'static>(
    link: Arc<L>,
    payload_size: i32,
    frame_count: i32,
) -> Result<SessionReport, SessionError> {
    run_client_with(link, payload_size, frame_count, SessionTimeouts::default()).await
}

/// [`run_client`] with explicit rendezvous bounds.
pub async fn run_client_with<L: Link + 'static>(
    link: Arc<L>,
    payload_size: i32,
    frame_count: i32,
    timeouts: SessionTimeouts,
) -> Result<SessionReport, SessionError> {
    tracing::info!(
        payload_size,
        frame_count,
        window_init = WINDOW_INIT,
        window_max = WINDOW_MAX,
        "client session starting"
    );
    if payload_size > 10_000 {
        tracing::info!(payload_size, "large frame size, expect long per-frame timeouts");
    }

    tracing::info!("waiting for port stabilization");
    sleep_ms(STABILIZATION_MS).await;

    // Phase 0: settings out, ACK back.
    let settings = Settings::new(payload_size, frame_count);
    write_exact(link.as_ref(), &settings.encode(), "settings").await?;
    tracing::info!("settings sent");
    sleep_ms(SETTINGS_SETTLE_MS).await;

    let ack = link
        .read(3, HANDSHAKE_ACK_TIMEOUT_MS)
        .await
        .map_err(|e| SessionError::Handshake(format!("no ACK from server: {e}")))?;
    if ack != b"ACK" {
        return Err(SessionError::Handshake(format!(
            "invalid handshake response ({} bytes)",
            ack.len()
        )));
    }
    tracing::info!("handshake complete");

    let started = Instant::now();

    // Phase 1: client transmits.
    tracing::info!("phase 1: transmitting");
    let (retransmits, peak_window) =
        run_send_phase(&link, &settings, PayloadPattern::Ascending).await?;

    // Phase 2: client receives.
    tracing::info!("phase 2: receiving");
    let reception = run_receive_phase(link.as_ref(), &settings, PayloadPattern::Descending).await?;

    let local = finalize(&reception, retransmits, started);

    // Phase 3: READY rendezvous, then results, client first.
    sleep_ms(RESULTS_QUIET_CLIENT_MS).await;
    link.purge().await?;
    send_ready(link.as_ref()).await?;
    wait_for_ready(link.as_ref(), timeouts.ready_wait_ms).await?;
    tracing::info!("synchronization complete, exchanging results");

    write_exact(link.as_ref(), &local.encode(), "results").await?;
    link.flush().await?;
    tracing::info!("results sent");

    let peer = read_results(link.as_ref(), "server").await?;
    log_final_report(Role::Client, &settings, &local, &peer);

    Ok(SessionReport {
        settings,
        local,
        peer,
        peak_window,
    })
}

/// Run the responding side: accept settings, receive, transmit, exchange
/// results.
pub async fn run_server<L: Link + 'static>(link: Arc<L>) -> Result<SessionReport, SessionError> {
    run_server_with(link, SessionTimeouts::default()).await
}

/// [`run_server`] with explicit rendezvous bounds.
pub async fn run_server_with<L: Link + 'static>(
    link: Arc<L>,
    timeouts: SessionTimeouts,
) -> Result<SessionReport, SessionError> {
    tracing::info!("server session starting, waiting for client settings");

    let chunk = link
        .read(SETTINGS_WIRE_LEN, SETTINGS_READ_TIMEOUT_MS)
        .await
        .map_err(|e| SessionError::Handshake(format!("no settings from client: {e}")))?;
    let settings = Settings::decode(&chunk)?;
    if let Err(e) = settings.check_version() {
        tracing::error!(
            peer = settings.protocol_version,
            "protocol version mismatch, aborting"
        );
        return Err(e.into());
    }
    tracing::info!(
        payload_size = settings.payload_size,
        frame_count = settings.frame_count,
        "client connected"
    );

    write_exact(link.as_ref(), b"ACK", "handshake ack").await?;
    tracing::info!("handshake ack sent");

    let started = Instant::now();

    // Phase 1: server receives.
    tracing::info!("phase 1: receiving");
    let reception = run_receive_phase(link.as_ref(), &settings, PayloadPattern::Ascending).await?;

    // Phase 2: server transmits.
    tracing::info!("phase 2: transmitting");
    let (retransmits, peak_window) =
        run_send_phase(&link, &settings, PayloadPattern::Descending).await?;

    let local = finalize(&reception, retransmits, started);

    // Phase 3: wait for the client's READY, answer it, then read the
    // client's results before sending our own.
    sleep_ms(RESULTS_QUIET_SERVER_MS).await;
    link.purge().await?;
    wait_for_ready(link.as_ref(), timeouts.ready_wait_ms).await?;
    send_ready(link.as_ref()).await?;
    tracing::info!("synchronization complete, exchanging results");

    let peer = read_results(link.as_ref(), "client").await?;

    write_exact(link.as_ref(), &local.encode(), "results").await?;
    link.flush().await?;
    tracing::info!("results sent");

    log_final_report(Role::Server, &settings, &local, &peer);

    Ok(SessionReport {
        settings,
        local,
        peer,
        peak_window,
    })
}

// ---------------------------------------------------------------------------
// Phase helpers
// ---------------------------------------------------------------------------

async fn run_send_phase<L: Link + 'static>(
    link: &Arc<L>,
    settings: &Settings,
    pattern: PayloadPattern,
) -> Result<(u32, u16), SessionError> {
    sleep_ms(SEND_SETTLE_MS).await;
    link.purge().await?;

    let tx = Transmission::start(
        Arc::clone(link),
        settings.payload_size as usize,
        settings.frame_count,
        pattern,
    )
    .await;

    // The caller thread only monitors progress; termination is window
    // completion, with no outer deadline.
    let window = Arc::clone(tx.window());
    let mut last_base = 0;
    while !window.is_complete() {
        sleep_ms(MONITOR_POLL_MS).await;
        let base = window.base();
        if base != last_base {
            if should_log_progress(base, settings.frame_count) {
                tracing::info!(
                    acknowledged = base,
                    total = settings.frame_count,
                    window = window.window_size(),
                    "send progress"
                );
            }
            last_base = base;
        }
    }
    tx.stop().await;
    tracing::info!("send phase complete, all frames acknowledged");

    Ok((tx.retransmits(), window.peak_window()))
}

async fn run_receive_phase<L: Link>(
    link: &L,
    settings: &Settings,
    pattern: PayloadPattern,
) -> Result<Reception, SessionError> {
    sleep_ms(RECEIVE_SETTLE_MS).await;
    link.purge().await?;

    let reception = receive_frames(
        link,
        settings.payload_size as usize,
        settings.frame_count,
        pattern,
    )
    .await?;
    tracing::info!(
        frames = reception.frames,
        bytes = reception.total_bytes,
        errors = reception.errors,
        "receive phase complete"
    );
    Ok(reception)
}

fn finalize(reception: &Reception, retransmits: u32, started: Instant) -> Results {
    let elapsed = started.elapsed().as_secs_f64();
    let results = Results::from_counts(
        reception.total_bytes,
        reception.frames,
        reception.errors,
        retransmits as i32,
        elapsed,
    );
    tracing::info!(
        throughput_mib = results.throughput_mib,
        chars_per_sec = results.chars_per_sec,
        elapsed_secs = results.elapsed_secs,
        "data exchange complete"
    );
    results
}

// ---------------------------------------------------------------------------
// Phase 3 helpers
// ---------------------------------------------------------------------------

async fn send_ready<L: Link>(link: &L) -> Result<(), SessionError> {
    write_exact(link, &READY_FRAME, "READY").await?;
    tracing::info!("ready signal sent");
    Ok(())
}

async fn wait_for_ready<L: Link>(link: &L, timeout_ms: u64) -> Result<(), SessionError> {
    tracing::info!("waiting for peer ready signal");
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);

    while Instant::now() < deadline {
        match link.read(READY_FRAME_LEN, READY_POLL_TIMEOUT_MS).await {
            Ok(chunk) if is_ready_frame(&chunk) => {
                tracing::info!("peer ready signal received");
                return Ok(());
            }
            Ok(chunk) => {
                tracing::debug!(len = chunk.len(), "non-READY bytes while waiting");
            }
            Err(e) if e.is_timeout() => {}
            Err(e) => return Err(e.into()),
        }
    }

    tracing::error!("timed out waiting for peer ready signal");
    Err(SessionError::ReadyTimeout)
}

async fn read_results<L: Link>(link: &L, source: &str) -> Result<Results, SessionError> {
    for attempt in 1..=RESULTS_READ_ATTEMPTS {
        tracing::info!(attempt, max = RESULTS_READ_ATTEMPTS, source, "reading results");
        match link.read(RESULTS_WIRE_LEN, RESULTS_READ_TIMEOUT_MS).await {
            Ok(chunk) if chunk.len() == RESULTS_WIRE_LEN => {
                let results = Results::decode(&chunk)?;
                tracing::info!(source, "results received");
                return Ok(results);
            }
            Ok(chunk) => {
                tracing::warn!(
                    got = chunk.len(),
                    expected = RESULTS_WIRE_LEN,
                    "partial results read, retrying"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "results read failed, retrying");
            }
        }
        if attempt < RESULTS_READ_ATTEMPTS {
            sleep_ms(RESULTS_RETRY_PAUSE_MS).await;
        }
    }

    tracing::error!(source, "failed to receive results");
    Err(SessionError::ResultsExchange)
}

// ---------------------------------------------------------------------------
// Small utilities
// ---------------------------------------------------------------------------

async fn write_exact<L: Link>(
    link: &L,
    data: &[u8],
    what: &'static str,
) -> Result<(), SessionError> {
    let wrote = link.write(data).await?;
    if wrote != data.len() {
        return Err(SessionError::ShortWrite {
            what,
            wrote,
            expected: data.len(),
        });
    }
    Ok(())
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use burstwire_interfaces::PipeLink;

    #[tokio::test]
    async fn ready_rendezvous_roundtrip() {
        let (a, b) = PipeLink::pair(115_200);
        send_ready(&a).await.unwrap();
        wait_for_ready(&b, READY_WAIT_TIMEOUT_MS).await.unwrap();
    }

    #[tokio::test]
    async fn wait_for_ready_skips_foreign_bytes() {
        let (a, b) = PipeLink::pair(115_200);
        a.write(&[0u8; 7]).await.unwrap();
        send_ready(&a).await.unwrap();
        wait_for_ready(&b, READY_WAIT_TIMEOUT_MS).await.unwrap();
    }

    #[tokio::test]
    async fn wait_for_ready_times_out_on_silence() {
        let (_a, b) = PipeLink::pair(115_200);
        let err = wait_for_ready(&b, 500).await.unwrap_err();
        assert!(matches!(err, SessionError::ReadyTimeout));
    }

    #[tokio::test]
    async fn results_exchange_roundtrip() {
        let (a, b) = PipeLink::pair(115_200);
        let sent = Results::from_counts(2368, 32, 0, 0, 1.5);
        a.write(&sent.encode()).await.unwrap();
        let got = read_results(&b, "peer").await.unwrap();
        assert_eq!(got, sent);
    }

    #[tokio::test]
    async fn write_exact_detects_nothing_on_success() {
        let (a, b) = PipeLink::pair(115_200);
        write_exact(&a, b"ACK", "handshake ack").await.unwrap();
        assert_eq!(b.read(3, 100).await.unwrap(), b"ACK");
    }
}
