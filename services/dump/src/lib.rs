//! Shared plumbing for the dump tools.
//!
//! Each binary picks a protocol; argument parsing, source selection, the
//! capture task, the printer task and SIGINT handling are identical and
//! live here.

pub mod cli;
#[cfg(feature = "live")]
pub mod live;
pub mod printer;

use sniffer_core::SnifferConfig;
use sniffer_core::engine::{EngineError, ProtocolSniffer, run_capture};
use sniffer_core::event::SniffEvent;
use sniffer_core::omni::OmniSniffer;
use sniffer_core::queue::EventQueue;
use sniffer_core::sniffer::{FleSniffer, ZabSniffer, ZkSniffer};
use sniffer_core::source::{FrameSource, PcapFileSource, SourceError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};

/// Which protocol a dump binary decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Zk,
    Zab,
    Fle,
    Omni,
}

/// Where frames come from.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Replay a pcap-ng capture file.
    File(PathBuf),
    /// Sniff a live interface (requires the `live` feature).
    Interface(String),
}

#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub config: SnifferConfig,
    pub source: SourceSpec,
    /// Pair zk requests with their replies and print latencies instead of
    /// raw messages.
    pub latency: bool,
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("live capture support not compiled in (build with --features live)")]
    LiveUnavailable,
    #[error("capture task panicked")]
    CaptureTask,
}

fn build_sniffer(tool: Tool, config: &SnifferConfig) -> ProtocolSniffer {
    match tool {
        Tool::Zk => ProtocolSniffer::Zk(ZkSniffer::new(config)),
        Tool::Zab => ProtocolSniffer::Zab(ZabSniffer::new(config)),
        Tool::Fle => ProtocolSniffer::Fle(FleSniffer::new(config)),
        Tool::Omni => ProtocolSniffer::Omni(OmniSniffer::new(config)),
    }
}

fn open_source(spec: &SourceSpec, config: &SnifferConfig) -> Result<Box<dyn FrameSource + Send>, DumpError> {
    match spec {
        SourceSpec::File(path) => Ok(Box::new(PcapFileSource::open(path)?)),
        #[cfg(feature = "live")]
        SourceSpec::Interface(name) => Ok(Box::new(live::LiveSource::open(name, config)?)),
        #[cfg(not(feature = "live"))]
        SourceSpec::Interface(_) => {
            let _ = config;
            Err(DumpError::LiveUnavailable)
        }
    }
}

/// Run a dump tool to completion. Returns the process exit code: 0 for a
/// clean stop (SIGINT or source exhausted), 1 for a fatal error.
pub async fn run(tool: Tool, options: DumpOptions) -> i32 {
    let source = match open_source(&options.source, &options.config) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "cannot open capture source");
            return 1;
        }
    };

    let queue = Arc::new(EventQueue::<SniffEvent>::new(options.config.queue_cap));
    let (stop_tx, stop_rx) = watch::channel(false);

    let sniffer = build_sniffer(tool, &options.config);
    let mut capture = {
        let queue = Arc::clone(&queue);
        let config = options.config.clone();
        tokio::task::spawn_blocking(move || {
            run_capture(source, sniffer, &[queue], &config, stop_rx)
        })
    };

    let printer = tokio::spawn(printer::print_events(
        Arc::clone(&queue),
        options.latency,
        options.config.clone(),
    ));

    let capture_result = tokio::select! {
        result = &mut capture => flatten(result),
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping capture");
            let _ = stop_tx.send(true);
            // The capture loop notices the flag between frames and closes
            // the queues on its way out.
            flatten(capture.await)
        }
    };

    // The printer drains whatever is still queued, then stops.
    let printed = printer.await.unwrap_or(0);
    info!(events = printed, overflows = queue.overflows(), "dump finished");

    match capture_result {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "capture failed");
            1
        }
    }
}

fn flatten(
    joined: Result<Result<(), EngineError>, tokio::task::JoinError>,
) -> Result<(), DumpError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(DumpError::CaptureTask),
    }
}
