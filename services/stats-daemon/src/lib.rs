//! stats-daemon: sniffs the client protocol and serves aggregate statistics
//! over HTTP.
//!
//! One capture task feeds a bounded queue; one consumer task folds events
//! into the [`accumulators::StatsAccumulator`]; axum serves read-only JSON
//! views of it. SIGINT stops the capture, lets the consumer drain, shuts
//! the HTTP server down gracefully, and exits 0.

pub mod accumulators;
pub mod http;

use accumulators::StatsAccumulator;
use sniffer_core::SnifferConfig;
use sniffer_core::engine::{ProtocolSniffer, run_capture};
use sniffer_core::event::SniffEvent;
use sniffer_core::queue::EventQueue;
use sniffer_core::sniffer::ZkSniffer;
use sniffer_core::source::PcapFileSource;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub config: SnifferConfig,
    /// pcap-ng capture file to replay. Live capture is the dump tools'
    /// territory; the daemon keeps its dependencies lean.
    pub file: PathBuf,
    /// HTTP bind address, e.g. `"0.0.0.0:7070"`.
    pub http_bind: String,
}

/// Run the daemon to completion; returns the process exit code.
pub async fn run(options: DaemonOptions) -> i32 {
    let source = match PcapFileSource::open(&options.file) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "cannot open capture file");
            return 1;
        }
    };

    let queue = Arc::new(EventQueue::<SniffEvent>::new(options.config.queue_cap));
    let stats = Arc::new(Mutex::new(StatsAccumulator::new()));
    let (stop_tx, stop_rx) = watch::channel(false);

    let mut capture = {
        let queue = Arc::clone(&queue);
        let config = options.config.clone();
        let sniffer = ProtocolSniffer::Zk(ZkSniffer::new(&config));
        tokio::task::spawn_blocking(move || {
            run_capture(source, sniffer, &[queue], &config, stop_rx)
        })
    };

    let consumer = {
        let queue = Arc::clone(&queue);
        let stats = Arc::clone(&stats);
        tokio::spawn(async move {
            while let Some(event) = queue.pop().await {
                stats.lock().await.record(&event);
            }
        })
    };

    let state = http::AppState {
        stats: Arc::clone(&stats),
        version: env!("CARGO_PKG_VERSION"),
    };
    let listener = match tokio::net::TcpListener::bind(&options.http_bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind = %options.http_bind, error = %e, "cannot bind stats endpoint");
            return 1;
        }
    };
    info!(bind = %options.http_bind, "stats endpoint listening");

    let (http_stop_tx, mut http_stop_rx) = watch::channel(false);
    let server = tokio::spawn(async move {
        axum::serve(listener, http::router(state))
            .with_graceful_shutdown(async move {
                let _ = http_stop_rx.changed().await;
            })
            .await
    });

    let capture_result = tokio::select! {
        result = &mut capture => {
            // Replay exhausted; keep serving the accumulated stats until
            // someone interrupts us.
            info!("capture finished, serving stats until interrupted");
            let _ = tokio::signal::ctrl_c().await;
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping");
            let _ = stop_tx.send(true);
            capture.await
        }
    };

    // Consumer finishes once the queue is closed and drained.
    let _ = consumer.await;
    let _ = http_stop_tx.send(true);
    let _ = server.await;

    match capture_result {
        Ok(Ok(())) => {
            info!(overflows = queue.overflows(), "stats daemon finished");
            0
        }
        Ok(Err(e)) => {
            error!(error = %e, "capture failed");
            1
        }
        Err(_) => {
            error!("capture task panicked");
            1
        }
    }
}
