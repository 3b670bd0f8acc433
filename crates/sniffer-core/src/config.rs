//! Runtime knobs shared by the sniffers and the capture engine.

use std::time::Duration;

/// Well-known default ports of an ensemble.
pub const DEFAULT_ZK_PORT: u16 = 2181;
pub const DEFAULT_ZAB_PORT: u16 = 2888;
pub const DEFAULT_FLE_PORT: u16 = 3888;

/// Default cap for the per-client xid map, the correlator queues, and the
/// consumer event queues.
pub const DEFAULT_QUEUE_CAP: usize = 10_000;

#[derive(Debug, Clone)]
pub struct SnifferConfig {
    /// Client-protocol server port.
    pub zk_port: u16,
    /// Atomic-broadcast leader port.
    pub zab_port: u16,
    /// Election port.
    pub fle_port: u16,
    /// When nonzero, only traffic to/from this client port is accepted.
    pub client_port: u16,
    /// Cap on in-flight xids remembered per client; oldest evicted beyond it.
    pub xid_cap: usize,
    /// Cap on each bounded consumer queue; oldest discarded beyond it.
    pub queue_cap: usize,
    /// Fraction of frames forwarded to the decoder, in `[0, 1]`.
    ///
    /// Sampling below 1.0 corrupts latency measurement: a reply can be
    /// admitted whose request was dropped, and the xid map desynchronizes.
    /// Sampling by connection hash would avoid that; not implemented.
    pub sampling: f64,
    /// Log frames that were dropped as uninteresting or malformed.
    pub dump_bad_packets: bool,
    /// Collapse duplicate requests at the same xid (loopback captures
    /// deliver both the tx and rx copy) into a single latency pair.
    pub dedup_loopback: bool,
    /// Optional read timeout for live capture handles.
    pub read_timeout: Option<Duration>,
}

impl Default for SnifferConfig {
    fn default() -> SnifferConfig {
        SnifferConfig {
            zk_port: DEFAULT_ZK_PORT,
            zab_port: DEFAULT_ZAB_PORT,
            fle_port: DEFAULT_FLE_PORT,
            client_port: 0,
            xid_cap: DEFAULT_QUEUE_CAP,
            queue_cap: DEFAULT_QUEUE_CAP,
            sampling: 1.0,
            dump_bad_packets: false,
            dedup_loopback: true,
            read_timeout: None,
        }
    }
}
