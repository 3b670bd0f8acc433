//! Fast leader election messages.
//!
//! Two message families travel over the election port: the initial
//! handshake a peer sends right after connecting, and the election
//! notifications proper. The initial is recognized by a protocol-version
//! sentinel and a tight length equation; notifications come in three
//! payload shapes that grew over protocol versions, the newest carrying an
//! embedded cluster-configuration string.

use crate::error::DecodeError;
use std::fmt;
use zkt_wire::{DEFAULT_MAXLEN, read_i32, read_i64, read_string};

/// Leading i64 of an initial handshake (`0xFFFF_FFFF_FFFF_0000`).
pub const INITIAL_SENTINEL: i64 = -65536;

/// Payload length of the short notification shape.
const NOTIFICATION_LEN_SHORT: usize = 28;
/// Payload length of the shape that adds the peer epoch.
const NOTIFICATION_LEN_PEER_EPOCH: usize = 36;
/// Minimum payload length of the versioned shape.
const NOTIFICATION_LEN_VERSIONED: usize = 40;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleMessage {
    Initial(Initial),
    Notification(Notification),
}

/// The handshake a peer sends when it opens an election connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initial {
    pub server_id: i64,
    pub election_addr: String,
}

/// Peer states carried in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionState {
    Looking,
    Following,
    Leading,
    Observing,
}

impl ElectionState {
    pub fn name(self) -> &'static str {
        match self {
            ElectionState::Looking => "looking",
            ElectionState::Following => "following",
            ElectionState::Leading => "leading",
            ElectionState::Observing => "observing",
        }
    }
}

impl TryFrom<i32> for ElectionState {
    type Error = DecodeError;

    fn try_from(state: i32) -> Result<Self, Self::Error> {
        match state {
            0 => Ok(ElectionState::Looking),
            1 => Ok(ElectionState::Following),
            2 => Ok(ElectionState::Leading),
            3 => Ok(ElectionState::Observing),
            other => Err(DecodeError::InvalidElectionState(other)),
        }
    }
}

impl fmt::Display for ElectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An election vote. Fields absent from older payload shapes take the
/// defaults `peer_epoch = -1`, `version = 0`, `config = ""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub state: ElectionState,
    pub leader: i64,
    pub zxid: i64,
    pub election_epoch: i64,
    pub peer_epoch: i64,
    pub version: i32,
    /// Raw cluster-configuration text, parsed lazily by whoever needs the
    /// topology (see `quorum_config`).
    pub config: String,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

impl Initial {
    /// Probe a payload for the initial handshake. Accepts iff the sentinel
    /// matches, the server id is non-negative, the declared address length
    /// makes the payload exactly `20 + addr_len` bytes, and the address
    /// itself reads as `host:port`.
    pub fn from_payload(payload: &[u8]) -> Result<Initial, DecodeError> {
        let (sentinel, offset) = read_i64(payload, 0);
        if offset == 0 || sentinel != INITIAL_SENTINEL {
            return Err(DecodeError::NotInitial);
        }
        let (server_id, offset) = read_i64(payload, offset);
        if server_id < 0 {
            return Err(DecodeError::NotInitial);
        }
        let (addr_len, offset) = read_i32(payload, offset);
        if addr_len <= 0 || payload.len() != 20 + addr_len as usize {
            return Err(DecodeError::NotInitial);
        }
        let raw = &payload[offset..];
        let Ok(election_addr) = std::str::from_utf8(raw) else {
            return Err(DecodeError::InvalidElectionAddr(format!("{raw:?}")));
        };
        let valid = election_addr
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid {
            return Err(DecodeError::InvalidElectionAddr(election_addr.to_owned()));
        }
        Ok(Initial {
            server_id,
            election_addr: election_addr.to_owned(),
        })
    }
}

impl Notification {
    pub fn from_payload(payload: &[u8]) -> Result<Notification, DecodeError> {
        let (state, offset) = read_i32(payload, 0);
        if offset == 0 {
            return Err(DecodeError::Truncated("notification state"));
        }
        let state = ElectionState::try_from(state)?;
        let (leader, offset) = read_i64(payload, offset);
        let (zxid, offset) = read_i64(payload, offset);
        let (election_epoch, offset) = read_i64(payload, offset);

        let mut peer_epoch = -1;
        let mut version = 0;
        let mut config = String::new();
        match payload.len() {
            NOTIFICATION_LEN_SHORT => {}
            NOTIFICATION_LEN_PEER_EPOCH => {
                (peer_epoch, _) = read_i64(payload, offset);
            }
            n if n >= NOTIFICATION_LEN_VERSIONED => {
                let (pe, offset) = read_i64(payload, offset);
                peer_epoch = pe;
                let (v, offset) = read_i32(payload, offset);
                if v < 1 {
                    return Err(DecodeError::InvalidNotificationVersion(v));
                }
                version = v;
                if v >= 2 {
                    (config, _) = read_string(payload, offset, DEFAULT_MAXLEN)?;
                }
            }
            n => return Err(DecodeError::InvalidNotificationLength(n)),
        }

        Ok(Notification {
            state,
            leader,
            zxid,
            election_epoch,
            peer_epoch,
            version,
            config,
        })
    }
}

/// Decode an election-port payload: initial handshake first, then the
/// notification shapes.
pub fn from_payload(payload: &[u8]) -> Result<FleMessage, DecodeError> {
    match Initial::from_payload(payload) {
        Ok(initial) => Ok(FleMessage::Initial(initial)),
        Err(DecodeError::InvalidElectionAddr(addr)) => {
            Err(DecodeError::InvalidElectionAddr(addr))
        }
        Err(_) => Ok(FleMessage::Notification(Notification::from_payload(
            payload,
        )?)),
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Initial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Initial(server_id={}, election_addr={})",
            self.server_id, self.election_addr
        )
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Notification(state={}, leader={}, zxid=0x{:x}, election_epoch={}, peer_epoch={}, version={}",
            self.state, self.leader, self.zxid, self.election_epoch, self.peer_epoch, self.version
        )?;
        if self.config.is_empty() {
            write!(f, ")")
        } else {
            write!(f, ", config={} bytes)", self.config.len())
        }
    }
}

impl fmt::Display for FleMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FleMessage::Initial(initial) => initial.fmt(f),
            FleMessage::Notification(notification) => notification.fmt(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn initial_payload(server_id: i64, addr: &str) -> Vec<u8> {
        let mut payload = INITIAL_SENTINEL.to_be_bytes().to_vec();
        payload.extend_from_slice(&server_id.to_be_bytes());
        payload.extend_from_slice(&(addr.len() as i32).to_be_bytes());
        payload.extend_from_slice(addr.as_bytes());
        payload
    }

    fn notification_payload(state: i32, leader: i64, zxid: i64, epoch: i64) -> Vec<u8> {
        let mut payload = state.to_be_bytes().to_vec();
        payload.extend_from_slice(&leader.to_be_bytes());
        payload.extend_from_slice(&zxid.to_be_bytes());
        payload.extend_from_slice(&epoch.to_be_bytes());
        payload
    }

    #[test]
    fn initial_handshake() {
        let payload = initial_payload(6, "127.0.0.1:3888");
        let initial = Initial::from_payload(&payload).unwrap();
        assert_eq!(initial.server_id, 6);
        assert_eq!(initial.election_addr, "127.0.0.1:3888");
    }

    #[test]
    fn initial_length_equation_is_exact() {
        let mut payload = initial_payload(6, "127.0.0.1:3888");
        payload.push(0);
        assert_eq!(Initial::from_payload(&payload), Err(DecodeError::NotInitial));

        let payload = initial_payload(6, "127.0.0.1:3888");
        assert_eq!(
            Initial::from_payload(&payload[..payload.len() - 1]),
            Err(DecodeError::NotInitial)
        );
    }

    #[test]
    fn initial_requires_host_port_addr() {
        let payload = initial_payload(6, "not-an-address");
        assert!(matches!(
            Initial::from_payload(&payload),
            Err(DecodeError::InvalidElectionAddr(_))
        ));
    }

    #[test]
    fn initial_rejects_wrong_sentinel() {
        let mut payload = initial_payload(6, "127.0.0.1:3888");
        payload[0] = 0;
        assert_eq!(Initial::from_payload(&payload), Err(DecodeError::NotInitial));
    }

    #[test]
    fn short_notification_defaults() {
        let payload = notification_payload(1, 3, 0x2000, 10);
        let n = Notification::from_payload(&payload).unwrap();
        assert_eq!(n.state, ElectionState::Following);
        assert_eq!(n.leader, 3);
        assert_eq!(n.zxid, 0x2000);
        assert_eq!(n.election_epoch, 10);
        assert_eq!(n.peer_epoch, -1);
        assert_eq!(n.version, 0);
        assert_eq!(n.config, "");
    }

    #[test]
    fn peer_epoch_shape() {
        let mut payload = notification_payload(0, 1, 0x10, 4);
        payload.extend_from_slice(&7_i64.to_be_bytes());
        let n = Notification::from_payload(&payload).unwrap();
        assert_eq!(n.state, ElectionState::Looking);
        assert_eq!(n.peer_epoch, 7);
        assert_eq!(n.version, 0);
    }

    #[test]
    fn versioned_shape_with_config() {
        let config = "server.1=127.0.0.1:2888:3888;2181\nversion=100000000";
        let mut payload = notification_payload(2, 1, 0x10, 4);
        payload.extend_from_slice(&7_i64.to_be_bytes());
        payload.extend_from_slice(&2_i32.to_be_bytes());
        payload.extend_from_slice(&(config.len() as i32).to_be_bytes());
        payload.extend_from_slice(config.as_bytes());
        let n = Notification::from_payload(&payload).unwrap();
        assert_eq!(n.version, 2);
        assert_eq!(n.config, config);
    }

    #[test]
    fn invalid_state_is_rejected() {
        let payload = notification_payload(9, 3, 0x2000, 10);
        assert_eq!(
            Notification::from_payload(&payload),
            Err(DecodeError::InvalidElectionState(9))
        );
    }

    #[test]
    fn odd_length_is_rejected() {
        let payload = notification_payload(1, 3, 0x2000, 10);
        assert_eq!(
            Notification::from_payload(&payload[..27]),
            Err(DecodeError::InvalidNotificationLength(27))
        );
    }
}
