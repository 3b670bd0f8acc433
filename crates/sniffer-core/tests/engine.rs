//! Capture-loop behavior over an in-memory frame source.

use sniffer_core::engine::{ProtocolSniffer, run_capture};
use sniffer_core::event::SniffEvent;
use sniffer_core::framing::{LinkLayer, build_ipv4_frame};
use sniffer_core::queue::EventQueue;
use sniffer_core::sniffer::ZabSniffer;
use sniffer_core::source::{RawFrame, ReplaySource};
use sniffer_core::{SnifferConfig, SnifferKind};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::watch;
use zkt_proto::Endpoint;
use zkt_proto::zab::QuorumPacket;

fn commit_frame(seq: u32) -> RawFrame {
    let leader = Endpoint::v4(10, 0, 0, 1, 2888);
    let follower = Endpoint::v4(10, 0, 0, 2, 51000);
    let mut payload = 4_i32.to_be_bytes().to_vec();
    payload.extend_from_slice(&i64::from(seq).to_be_bytes());
    RawFrame {
        timestamp: SystemTime::UNIX_EPOCH,
        link: LinkLayer::Ethernet,
        data: build_ipv4_frame(leader, follower, seq, false, &payload),
    }
}

fn junk_frame() -> RawFrame {
    RawFrame {
        timestamp: SystemTime::UNIX_EPOCH,
        link: LinkLayer::Ethernet,
        data: vec![0u8; 32],
    }
}

async fn run(
    frames: Vec<RawFrame>,
    config: SnifferConfig,
) -> (Arc<EventQueue<SniffEvent>>, Vec<SniffEvent>) {
    let queue = Arc::new(EventQueue::new(config.queue_cap));
    let (_stop_tx, stop_rx) = watch::channel(false);
    let source = ReplaySource::new(frames);
    let sniffer = ProtocolSniffer::Zab(ZabSniffer::new(&config));

    let capture = {
        let queue = Arc::clone(&queue);
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            run_capture(source, sniffer, &[queue], &config, stop_rx)
        })
    };
    capture.await.unwrap().unwrap();

    let mut events = Vec::new();
    while let Some(event) = queue.pop().await {
        events.push(event);
    }
    (queue, events)
}

#[tokio::test(flavor = "multi_thread")]
async fn frames_become_events_and_junk_is_dropped() {
    let frames = vec![commit_frame(1), junk_frame(), commit_frame(2)];
    let (_queue, events) = run(frames, SnifferConfig::default()).await;

    assert_eq!(events.len(), 2);
    for (event, zxid) in events.iter().zip([1_i64, 2]) {
        match event {
            SniffEvent::Zab { packet, .. } => {
                assert_eq!(*packet, QuorumPacket::Commit { zxid });
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn sampling_zero_admits_nothing() {
    let config = SnifferConfig {
        sampling: 0.0,
        ..SnifferConfig::default()
    };
    let frames = (1..=20).map(commit_frame).collect();
    let (_queue, events) = run(frames, config).await;
    assert!(events.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_overflow_discards_oldest() {
    let config = SnifferConfig {
        queue_cap: 4,
        ..SnifferConfig::default()
    };
    let frames = (1..=10).map(commit_frame).collect();
    let (queue, events) = run(frames, config).await;

    assert_eq!(events.len(), 4);
    assert_eq!(queue.overflows(), 6);
    // The survivors are the newest events.
    match &events[0] {
        SniffEvent::Zab { packet, .. } => assert_eq!(packet.zxid(), 7),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn kind_display_matches_cli_names() {
    assert_eq!(SnifferKind::Fle.to_string(), "fle");
    assert_eq!(SnifferKind::Zab.to_string(), "zab");
    assert_eq!(SnifferKind::Zk.to_string(), "zk");
}
