//! The typed event stream handed to consumers.

use std::fmt;
use std::time::SystemTime;
use zkt_proto::Endpoint;
use zkt_proto::fle::FleMessage;
use zkt_proto::zab::QuorumPacket;
use zkt_proto::zk::{ClientMessage, FourLetterWord, ServerMessage};

/// One decoded, timestamped observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SniffEvent {
    ZkRequest(ClientMessage),
    ZkReply(ServerMessage),
    /// A four-letter admin probe on the client port, excluded from protocol
    /// parsing but worth surfacing.
    FourLetter {
        word: FourLetterWord,
        client: Endpoint,
        timestamp: SystemTime,
    },
    Fle {
        message: FleMessage,
        src: Endpoint,
        dst: Endpoint,
        timestamp: SystemTime,
    },
    Zab {
        packet: QuorumPacket,
        src: Endpoint,
        dst: Endpoint,
        timestamp: SystemTime,
    },
}

impl SniffEvent {
    pub fn timestamp(&self) -> SystemTime {
        match self {
            SniffEvent::ZkRequest(msg) => msg.timestamp,
            SniffEvent::ZkReply(ServerMessage::Reply(reply)) => reply.timestamp,
            SniffEvent::ZkReply(ServerMessage::Watch(event)) => event.timestamp,
            SniffEvent::FourLetter { timestamp, .. }
            | SniffEvent::Fle { timestamp, .. }
            | SniffEvent::Zab { timestamp, .. } => *timestamp,
        }
    }
}

impl fmt::Display for SniffEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SniffEvent::ZkRequest(msg) => msg.fmt(f),
            SniffEvent::ZkReply(msg) => msg.fmt(f),
            SniffEvent::FourLetter { word, client, .. } => {
                write!(f, "FourLetter({word}, client={client})")
            }
            SniffEvent::Fle { message, src, dst, .. } => {
                write!(f, "{message} [{src} -> {dst}]")
            }
            SniffEvent::Zab { packet, src, dst, .. } => {
                write!(f, "{packet} [{src} -> {dst}]")
            }
        }
    }
}
