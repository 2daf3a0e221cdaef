//! Receive-path behavior against a hand-driven peer.
//!
//! These tests play the sender by hand over a pipe link: writing raw frame
//! bytes, corrupting payloads, and duplicating frames, then checking the
//! receiver's counters and the ACKs it emits.

use burstwire_core::ack::AckFrame;
use burstwire_core::constants::ACK_FRAME_LEN;
use burstwire_core::frame::DataFrame;
use burstwire_core::pattern::PayloadPattern;
use burstwire_interfaces::{Link, PipeLink};
use burstwire_node::receive::receive_frames;

fn pattern_frame(num: i32, payload_size: usize, pattern: PayloadPattern) -> DataFrame {
    DataFrame::new(num, 16, pattern.fill(payload_size))
}

async fn read_ack(link: &PipeLink) -> AckFrame {
    let chunk = link.read(ACK_FRAME_LEN, 1000).await.expect("ack expected");
    AckFrame::decode(&chunk).expect("well-formed ack")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn corrupted_frame_is_counted_and_recovered() {
    let (harness, peer) = PipeLink::pair(115_200);
    let payload_size = 1024;
    let receiver = tokio::spawn(async move {
        receive_frames(&peer, payload_size, 10, PayloadPattern::Ascending).await
    });

    // Frames 0..10, with a single payload bit of frame 3 flipped in flight.
    for num in 0..10 {
        let mut wire = pattern_frame(num, payload_size, PayloadPattern::Ascending).encode();
        if num == 3 {
            wire[9 + 100] ^= 0x01;
        }
        harness.write(&wire).await.unwrap();
    }

    // Every frame is acknowledged immediately — including the corrupt one.
    let mut acked = Vec::new();
    for _ in 0..10 {
        acked.push(read_ack(&harness).await.base_frame_num);
    }
    assert_eq!(acked, (0..10).collect::<Vec<_>>());

    // The corrupt frame was dropped locally, so the cursor is stuck at 3
    // until a clean copy arrives.
    harness
        .write(&pattern_frame(3, payload_size, PayloadPattern::Ascending).encode())
        .await
        .unwrap();
    assert_eq!(read_ack(&harness).await.base_frame_num, 3);

    let outcome = receiver.await.unwrap().unwrap();
    assert_eq!(outcome.frames, 10);
    assert_eq!(outcome.errors, 1);
    assert_eq!(
        outcome.total_bytes,
        10 * DataFrame::wire_len(payload_size) as i64,
        "the corrupt copy must not contribute bytes"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_frames_ack_but_never_double_count() {
    let (harness, peer) = PipeLink::pair(115_200);
    let payload_size = 8;
    let receiver = tokio::spawn(async move {
        receive_frames(&peer, payload_size, 2, PayloadPattern::Descending).await
    });

    let frame0 = pattern_frame(0, payload_size, PayloadPattern::Descending).encode();
    harness.write(&frame0).await.unwrap();
    harness.write(&frame0).await.unwrap();
    harness
        .write(&pattern_frame(1, payload_size, PayloadPattern::Descending).encode())
        .await
        .unwrap();

    // Three ACKs: the duplicate is acknowledged again.
    assert_eq!(read_ack(&harness).await.base_frame_num, 0);
    assert_eq!(read_ack(&harness).await.base_frame_num, 0);
    assert_eq!(read_ack(&harness).await.base_frame_num, 1);

    let outcome = receiver.await.unwrap().unwrap();
    assert_eq!(outcome.frames, 2);
    assert_eq!(outcome.errors, 0);
    assert_eq!(outcome.total_bytes, 2 * DataFrame::wire_len(payload_size) as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wrong_pattern_payload_is_an_error() {
    let (harness, peer) = PipeLink::pair(115_200);
    let payload_size = 16;
    let receiver = tokio::spawn(async move {
        receive_frames(&peer, payload_size, 1, PayloadPattern::Ascending).await
    });

    // Valid checksum, but descending payload where ascending is expected.
    harness
        .write(&pattern_frame(0, payload_size, PayloadPattern::Descending).encode())
        .await
        .unwrap();
    assert_eq!(read_ack(&harness).await.base_frame_num, 0);

    harness
        .write(&pattern_frame(0, payload_size, PayloadPattern::Ascending).encode())
        .await
        .unwrap();
    assert_eq!(read_ack(&harness).await.base_frame_num, 0);

    let outcome = receiver.await.unwrap().unwrap();
    assert_eq!(outcome.frames, 1);
    assert_eq!(outcome.errors, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn out_of_order_frames_reassemble() {
    let (harness, peer) = PipeLink::pair(115_200);
    let payload_size = 32;
    let receiver = tokio::spawn(async move {
        receive_frames(&peer, payload_size, 3, PayloadPattern::Ascending).await
    });

    for num in [2, 0, 1] {
        harness
            .write(&pattern_frame(num, payload_size, PayloadPattern::Ascending).encode())
            .await
            .unwrap();
    }
    for expected in [2, 0, 1] {
        assert_eq!(read_ack(&harness).await.base_frame_num, expected);
    }

    let outcome = receiver.await.unwrap().unwrap();
    assert_eq!(outcome.frames, 3);
    assert_eq!(outcome.errors, 0);
}
