//! Decode-failure taxonomy shared by the three protocol decoders.
//!
//! `Wire` failures mean a length prefix blew past its cap; everything else
//! is a structurally invalid field. Either way the current packet is
//! abandoned and the next packet is decoded independently.

use thiserror::Error;
use zkt_wire::WireError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("packet too short for {0}")]
    Truncated(&'static str),
    #[error("unknown opcode {0}")]
    UnknownOpCode(i32),
    #[error("invalid xid {0}")]
    InvalidXid(i32),
    #[error("invalid protocol version {0}")]
    InvalidProtocolVersion(i32),
    #[error("path does not start with '/': {0:?}")]
    InvalidPath(String),
    #[error("invalid election state {0}")]
    InvalidElectionState(i32),
    #[error("not an election handshake")]
    NotInitial,
    #[error("invalid election address {0:?}")]
    InvalidElectionAddr(String),
    #[error("notification length {0} matches no known shape")]
    InvalidNotificationLength(usize),
    #[error("unsupported notification version {0}")]
    InvalidNotificationVersion(i32),
    #[error("unknown quorum packet type {0}")]
    UnknownQuorumPacketType(i32),
}
