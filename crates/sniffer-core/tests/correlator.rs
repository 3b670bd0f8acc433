//! Latency-pairing behavior: matching, loopback dedup, eviction, drops.

use sniffer_core::correlator::{Correlated, Correlator};
use std::time::{Duration, SystemTime};
use zkt_proto::Endpoint;
use zkt_proto::zk::{
    ClientMessage, OpCode, Reply, ReplyBody, RequestBody, ServerMessage, WatchEvent,
};

fn client() -> Endpoint {
    Endpoint::v4(10, 0, 0, 7, 45000)
}

fn at(millis: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_millis(millis)
}

fn request(xid: i32, body: RequestBody, timestamp: SystemTime) -> ClientMessage {
    ClientMessage {
        size: 16,
        xid,
        path: "/x".to_owned(),
        client: client(),
        watch: false,
        timestamp,
        auth: None,
        body,
    }
}

fn reply(xid: i32, timestamp: SystemTime) -> ServerMessage {
    ServerMessage::Reply(Reply {
        size: 16,
        xid,
        zxid: 0x10,
        err: 0,
        op: Some(OpCode::GetData),
        body: ReplyBody::None,
        client: client(),
        timestamp,
    })
}

#[test]
fn two_requests_two_pairs() {
    let mut correlator = Correlator::new(10_000, true);
    correlator.push_request(request(7, RequestBody::GetData, at(0)));
    correlator.push_request(request(15, RequestBody::GetData, at(5)));

    for (xid, sent, received) in [(7, 0, 12), (15, 5, 20)] {
        match correlator.push_reply(reply(xid, at(received))) {
            Correlated::Pairs(pairs) => {
                assert_eq!(pairs.len(), 1);
                assert_eq!(pairs[0].request.xid, xid);
                assert_eq!(pairs[0].reply.xid, xid);
                assert_eq!(pairs[0].latency, Duration::from_millis(received - sent));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(correlator.outstanding(&client()), 0);
}

#[test]
fn close_is_forwarded_immediately() {
    let mut correlator = Correlator::new(10_000, true);
    match correlator.push_request(request(9, RequestBody::Close, at(0))) {
        Correlated::Request(msg) => assert_eq!(msg.xid, 9),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(correlator.outstanding(&client()), 0);
}

#[test]
fn watch_events_pass_through_unpaired() {
    let mut correlator = Correlator::new(10_000, true);
    let event = ServerMessage::Watch(WatchEvent {
        event_type: 3,
        state: 3,
        path: "/x".to_owned(),
        client: client(),
        timestamp: at(1),
    });
    assert!(matches!(
        correlator.push_reply(event),
        Correlated::Watch(_)
    ));
}

#[test]
fn unmatched_reply_is_dropped() {
    let mut correlator = Correlator::new(10_000, true);
    assert_eq!(correlator.push_reply(reply(42, at(1))), Correlated::Dropped);
}

#[test]
fn loopback_retransmits_collapse_to_one_pair() {
    let mut correlator = Correlator::new(10_000, true);
    correlator.push_request(request(7, RequestBody::GetData, at(0)));
    correlator.push_request(request(7, RequestBody::GetData, at(1)));

    match correlator.push_reply(reply(7, at(9))) {
        Correlated::Pairs(pairs) => {
            assert_eq!(pairs.len(), 1);
            // The earliest copy wins, so latency spans the full round trip.
            assert_eq!(pairs[0].latency, Duration::from_millis(9));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn without_dedup_every_copy_pairs() {
    let mut correlator = Correlator::new(10_000, false);
    correlator.push_request(request(7, RequestBody::GetData, at(0)));
    correlator.push_request(request(7, RequestBody::GetData, at(1)));

    match correlator.push_reply(reply(7, at(9))) {
        Correlated::Pairs(pairs) => assert_eq!(pairs.len(), 2),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn fifo_pressure_evicts_unanswered_requests() {
    let mut correlator = Correlator::new(2, true);
    correlator.push_request(request(1, RequestBody::GetData, at(0)));
    correlator.push_request(request(2, RequestBody::GetData, at(1)));
    correlator.push_request(request(3, RequestBody::GetData, at(2)));

    assert_eq!(correlator.overflows(), 1);
    assert_eq!(correlator.outstanding(&client()), 2);
    // The evicted request's reply now has nothing to pair with.
    assert_eq!(correlator.push_reply(reply(1, at(3))), Correlated::Dropped);
}

#[test]
fn set_auth_stamps_following_requests() {
    let mut correlator = Correlator::new(10_000, true);
    correlator.push_request(request(
        1,
        RequestBody::SetAuth {
            auth_type: 0,
            scheme: "digest".to_owned(),
            credential: "alice:secret".to_owned(),
        },
        at(0),
    ));
    correlator.push_request(request(2, RequestBody::GetData, at(1)));
    match correlator.push_reply(reply(2, at(2))) {
        Correlated::Pairs(pairs) => {
            assert_eq!(pairs[0].request.auth.as_deref(), Some("alice:secret"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn latency_never_goes_negative() {
    let mut correlator = Correlator::new(10_000, true);
    correlator.push_request(request(5, RequestBody::GetData, at(100)));
    match correlator.push_reply(reply(5, at(50))) {
        Correlated::Pairs(pairs) => assert_eq!(pairs[0].latency, Duration::ZERO),
        other => panic!("unexpected outcome {other:?}"),
    }
}
