//! The printer consumer: pops events off the queue and writes one line per
//! message (or per request/reply pair in latency mode). Runs until the
//! queue is closed and drained.

use chrono::{DateTime, Utc};
use sniffer_core::SnifferConfig;
use sniffer_core::correlator::{Correlated, Correlator};
use sniffer_core::event::SniffEvent;
use sniffer_core::queue::EventQueue;
use std::sync::Arc;
use std::time::SystemTime;

fn stamp(timestamp: SystemTime) -> String {
    DateTime::<Utc>::from(timestamp)
        .format("%H:%M:%S%.6f")
        .to_string()
}

/// Returns the number of lines printed.
pub async fn print_events(
    queue: Arc<EventQueue<SniffEvent>>,
    latency: bool,
    config: SnifferConfig,
) -> u64 {
    let mut printed = 0;
    let mut correlator = latency.then(|| Correlator::new(config.queue_cap, config.dedup_loopback));

    while let Some(event) = queue.pop().await {
        match &mut correlator {
            None => {
                println!("{} {}", stamp(event.timestamp()), event);
                printed += 1;
            }
            Some(correlator) => printed += print_correlated(correlator, event),
        }
    }
    printed
}

fn print_correlated(correlator: &mut Correlator, event: SniffEvent) -> u64 {
    match event {
        SniffEvent::ZkRequest(message) => match correlator.push_request(message) {
            Correlated::Request(message) => {
                println!("{} {}", stamp(message.timestamp), message);
                1
            }
            _ => 0,
        },
        SniffEvent::ZkReply(message) => match correlator.push_reply(message) {
            Correlated::Pairs(pairs) => {
                let mut printed = 0;
                for pair in pairs {
                    println!(
                        "{} {} -> {} latency={:.3}ms",
                        stamp(pair.request.timestamp),
                        pair.request,
                        pair.reply,
                        pair.latency.as_secs_f64() * 1000.0
                    );
                    printed += 1;
                }
                printed
            }
            Correlated::Watch(event) => {
                println!("{} {}", stamp(event.timestamp), event);
                1
            }
            _ => 0,
        },
        other => {
            println!("{} {}", stamp(other.timestamp()), other);
            1
        }
    }
}
