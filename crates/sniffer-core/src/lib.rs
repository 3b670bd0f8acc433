//! Stateful sniffing engine on top of the `zkt-proto` decoders.
//!
//! The pipeline: a [`source::FrameSource`] yields raw link-layer frames, the
//! [`framing`] module walks them down to TCP segments, a protocol sniffer
//! ([`sniffer`] for a single protocol, [`omni`] for all three at once) turns
//! payloads into typed [`event::SniffEvent`]s, and bounded [`queue`]s hand
//! them to consumer tasks.

pub mod config;
pub mod correlator;
pub mod engine;
pub mod event;
pub mod framing;
pub mod omni;
pub mod queue;
pub mod session;
pub mod sniffer;
pub mod source;

pub use config::SnifferConfig;
pub use event::SniffEvent;

use thiserror::Error;
use zkt_proto::{DecodeError, Endpoint};

/// Which decoder an endpoint is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnifferKind {
    Fle,
    Zab,
    Zk,
}

impl std::fmt::Display for SnifferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SnifferKind::Fle => f.write_str("fle"),
            SnifferKind::Zab => f.write_str("zab"),
            SnifferKind::Zk => f.write_str("zk"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SniffError {
    /// The frame is not of interest (wrong port, no payload, admin probe,
    /// duplicate delivery). Silent unless bad-packet dumping is on.
    #[error(transparent)]
    Frame(#[from] framing::FrameError),
    /// A structurally invalid payload; the packet is abandoned and the next
    /// one is decoded independently.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// A notification carried a cluster configuration that does not parse.
    #[error(transparent)]
    Config(#[from] zkt_proto::quorum_config::ConfigError),
    /// An endpoint was announced with two different protocol kinds. This is
    /// fatal: the topology inference can no longer be trusted.
    #[error("conflicting kind for {endpoint}: registered {existing}, got {proposed}")]
    ConflictingKind {
        endpoint: Endpoint,
        existing: SnifferKind,
        proposed: SnifferKind,
    },
}

impl SniffError {
    /// Fatal errors terminate the run; everything else drops the packet.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SniffError::ConflictingKind { .. })
    }
}
