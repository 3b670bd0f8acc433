//! Typed messages and decoders for the three ZooKeeper ensemble protocols:
//! the client-server protocol (zk), the atomic broadcast protocol between
//! ensemble members (zab), and fast leader election (fle).
//!
//! Decoders are pure functions from a reassembled TCP payload to a typed
//! message; they keep no state. The per-connection state needed to interpret
//! replies (the xid memory) lives in `sniffer-core` and is passed in as a
//! lookup closure.

pub mod endpoint;
pub mod error;
pub mod fle;
pub mod quorum_config;
pub mod zab;
pub mod zk;

pub use endpoint::Endpoint;
pub use error::DecodeError;
