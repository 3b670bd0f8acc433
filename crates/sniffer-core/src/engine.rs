//! The capture loop: frames in, typed events out.
//!
//! Decoding is synchronous on the capture thread; events fan out into the
//! supplied bounded queues, one per subscribed consumer.
//! Only [`SniffError::is_fatal`] errors end the run; everything else drops
//! the offending frame, optionally with a log line. Cancellation is
//! cooperative: a watch flag checked between frames.

use crate::SniffError;
use crate::config::SnifferConfig;
use crate::event::SniffEvent;
use crate::framing::parse_frame;
use crate::omni::OmniSniffer;
use crate::queue::EventQueue;
use crate::sniffer::{FleSniffer, ZabSniffer, ZkSniffer};
use crate::source::{FrameSource, RawFrame, SourceError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sniff(#[from] SniffError),
}

/// The decoder driven by the capture loop: one protocol pinned statically,
/// or the omni dispatcher.
#[derive(Debug)]
pub enum ProtocolSniffer {
    Zk(ZkSniffer),
    Zab(ZabSniffer),
    Fle(FleSniffer),
    Omni(OmniSniffer),
}

impl ProtocolSniffer {
    pub fn handle_frame(&mut self, frame: &RawFrame) -> Result<Vec<SniffEvent>, SniffError> {
        match self {
            ProtocolSniffer::Omni(sniffer) => {
                sniffer.handle_frame(frame.link, &frame.data, frame.timestamp)
            }
            ProtocolSniffer::Zk(sniffer) => {
                let segment = parse_frame(frame.link, &frame.data)?;
                Ok(vec![sniffer.handle_segment(&segment, frame.timestamp)?])
            }
            ProtocolSniffer::Zab(sniffer) => {
                let segment = parse_frame(frame.link, &frame.data)?;
                Ok(vec![sniffer.handle_segment(&segment, frame.timestamp)?])
            }
            ProtocolSniffer::Fle(sniffer) => {
                let segment = parse_frame(frame.link, &frame.data)?;
                Ok(vec![sniffer.handle_segment(&segment, frame.timestamp)?])
            }
        }
    }
}

/// Run the capture loop until the source is exhausted, the stop flag flips,
/// or a fatal error surfaces. Queues are closed on every exit path so
/// consumers can drain and finish.
pub fn run_capture<S: FrameSource>(
    source: S,
    sniffer: ProtocolSniffer,
    queues: &[Arc<EventQueue<SniffEvent>>],
    config: &SnifferConfig,
    stop: watch::Receiver<bool>,
) -> Result<(), EngineError> {
    let result = capture_loop(source, sniffer, queues, config, stop);
    for queue in queues {
        queue.close();
    }
    result
}

fn capture_loop<S: FrameSource>(
    mut source: S,
    mut sniffer: ProtocolSniffer,
    queues: &[Arc<EventQueue<SniffEvent>>],
    config: &SnifferConfig,
    stop: watch::Receiver<bool>,
) -> Result<(), EngineError> {
    let mut frames: u64 = 0;
    let mut sampled_out: u64 = 0;
    while !*stop.borrow() {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(SourceError::Timeout) => continue,
            Err(error) => return Err(error.into()),
        };
        frames += 1;

        // Sampling happens at intake, before any per-connection state is
        // touched; see `SnifferConfig::sampling` for the correlation caveat.
        if config.sampling < 1.0 && rand::random::<f64>() >= config.sampling {
            sampled_out += 1;
            continue;
        }

        match sniffer.handle_frame(&frame) {
            Ok(events) => {
                for event in events {
                    for queue in queues {
                        queue.push(event.clone());
                    }
                }
            }
            Err(error) if error.is_fatal() => return Err(error.into()),
            Err(error) => {
                if config.dump_bad_packets {
                    debug!(error = %error, len = frame.data.len(), "dropped frame");
                }
            }
        }
    }
    info!(frames, sampled_out, "capture loop finished");
    Ok(())
}
