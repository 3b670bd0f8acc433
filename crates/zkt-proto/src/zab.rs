//! Atomic-broadcast packets exchanged between ensemble members.
//!
//! Every packet starts with an i32 type code and an i64 zxid. Types that
//! carry a payload wrap it in a length-prefixed blob; the blob's inner
//! layout depends on the type. Only the stable prefix of proposal
//! transactions is decoded; newer server versions append trailing fields
//! that are ignored here.

use crate::error::DecodeError;
use std::fmt;
use zkt_wire::{read_i32, read_i64};

// Type codes, in wire order. See `Leader.java`.
const REQUEST: i32 = 1;
const PROPOSAL: i32 = 2;
const ACK: i32 = 3;
const COMMIT: i32 = 4;
const PING: i32 = 5;
const REVALIDATE: i32 = 6;
const SYNC: i32 = 7;
const INFORM: i32 = 8;
const COMMIT_AND_ACTIVATE: i32 = 9;
const NEW_LEADER: i32 = 10;
const FOLLOWER_INFO: i32 = 11;
const UP_TO_DATE: i32 = 12;
const DIFF: i32 = 13;
const TRUNC: i32 = 14;
const SNAP: i32 = 15;
const OBSERVER_INFO: i32 = 16;
const LEADER_INFO: i32 = 17;
const ACK_EPOCH: i32 = 18;
const INFORM_AND_ACTIVATE: i32 = 19;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The stable prefix of a transaction header embedded in Proposal-family
/// packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxnInfo {
    pub client_id: i64,
    pub cxid: i32,
    pub txn_zxid: i64,
    pub txn_time: i64,
    pub txn_opcode: i32,
}

/// One quorum packet, keyed by its wire type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuorumPacket {
    Request {
        zxid: i64,
        session_id: i64,
        cxid: i32,
        req_opcode: i32,
    },
    Proposal {
        zxid: i64,
        txn: Option<TxnInfo>,
    },
    Ack {
        zxid: i64,
    },
    Commit {
        zxid: i64,
    },
    Ping {
        zxid: i64,
    },
    Revalidate {
        zxid: i64,
        session_id: i64,
        timeout_ms: i32,
    },
    Sync {
        zxid: i64,
    },
    Inform {
        zxid: i64,
        txn: Option<TxnInfo>,
    },
    CommitAndActivate {
        zxid: i64,
        suggested_leader: i64,
    },
    NewLeader {
        zxid: i64,
    },
    FollowerInfo {
        zxid: i64,
        sid: i64,
        protocol_version: i32,
        config_version: i64,
    },
    UpToDate {
        zxid: i64,
    },
    Diff {
        zxid: i64,
    },
    Trunc {
        zxid: i64,
    },
    Snap {
        zxid: i64,
    },
    ObserverInfo {
        zxid: i64,
        sid: i64,
        protocol_version: i32,
        config_version: i64,
    },
    LeaderInfo {
        zxid: i64,
        protocol_version: i32,
    },
    AckEpoch {
        zxid: i64,
        epoch: i32,
    },
    InformAndActivate {
        zxid: i64,
        suggested_leader: i64,
        txn: Option<TxnInfo>,
    },
}

impl QuorumPacket {
    pub fn zxid(&self) -> i64 {
        match *self {
            QuorumPacket::Request { zxid, .. }
            | QuorumPacket::Proposal { zxid, .. }
            | QuorumPacket::Ack { zxid }
            | QuorumPacket::Commit { zxid }
            | QuorumPacket::Ping { zxid }
            | QuorumPacket::Revalidate { zxid, .. }
            | QuorumPacket::Sync { zxid }
            | QuorumPacket::Inform { zxid, .. }
            | QuorumPacket::CommitAndActivate { zxid, .. }
            | QuorumPacket::NewLeader { zxid }
            | QuorumPacket::FollowerInfo { zxid, .. }
            | QuorumPacket::UpToDate { zxid }
            | QuorumPacket::Diff { zxid }
            | QuorumPacket::Trunc { zxid }
            | QuorumPacket::Snap { zxid }
            | QuorumPacket::ObserverInfo { zxid, .. }
            | QuorumPacket::LeaderInfo { zxid, .. }
            | QuorumPacket::AckEpoch { zxid, .. }
            | QuorumPacket::InformAndActivate { zxid, .. } => zxid,
        }
    }

    pub fn type_code(&self) -> i32 {
        match self {
            QuorumPacket::Request { .. } => REQUEST,
            QuorumPacket::Proposal { .. } => PROPOSAL,
            QuorumPacket::Ack { .. } => ACK,
            QuorumPacket::Commit { .. } => COMMIT,
            QuorumPacket::Ping { .. } => PING,
            QuorumPacket::Revalidate { .. } => REVALIDATE,
            QuorumPacket::Sync { .. } => SYNC,
            QuorumPacket::Inform { .. } => INFORM,
            QuorumPacket::CommitAndActivate { .. } => COMMIT_AND_ACTIVATE,
            QuorumPacket::NewLeader { .. } => NEW_LEADER,
            QuorumPacket::FollowerInfo { .. } => FOLLOWER_INFO,
            QuorumPacket::UpToDate { .. } => UP_TO_DATE,
            QuorumPacket::Diff { .. } => DIFF,
            QuorumPacket::Trunc { .. } => TRUNC,
            QuorumPacket::Snap { .. } => SNAP,
            QuorumPacket::ObserverInfo { .. } => OBSERVER_INFO,
            QuorumPacket::LeaderInfo { .. } => LEADER_INFO,
            QuorumPacket::AckEpoch { .. } => ACK_EPOCH,
            QuorumPacket::InformAndActivate { .. } => INFORM_AND_ACTIVATE,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            QuorumPacket::Request { .. } => "Request",
            QuorumPacket::Proposal { .. } => "Proposal",
            QuorumPacket::Ack { .. } => "Ack",
            QuorumPacket::Commit { .. } => "Commit",
            QuorumPacket::Ping { .. } => "Ping",
            QuorumPacket::Revalidate { .. } => "Revalidate",
            QuorumPacket::Sync { .. } => "Sync",
            QuorumPacket::Inform { .. } => "Inform",
            QuorumPacket::CommitAndActivate { .. } => "CommitAndActivate",
            QuorumPacket::NewLeader { .. } => "NewLeader",
            QuorumPacket::FollowerInfo { .. } => "FollowerInfo",
            QuorumPacket::UpToDate { .. } => "UpToDate",
            QuorumPacket::Diff { .. } => "Diff",
            QuorumPacket::Trunc { .. } => "Trunc",
            QuorumPacket::Snap { .. } => "Snap",
            QuorumPacket::ObserverInfo { .. } => "ObserverInfo",
            QuorumPacket::LeaderInfo { .. } => "LeaderInfo",
            QuorumPacket::AckEpoch { .. } => "AckEpoch",
            QuorumPacket::InformAndActivate { .. } => "InformAndActivate",
        }
    }

    // -----------------------------------------------------------------------
    // Decoding
    // -----------------------------------------------------------------------

    pub fn from_payload(payload: &[u8]) -> Result<QuorumPacket, DecodeError> {
        if payload.len() < 12 {
            return Err(DecodeError::Truncated("quorum packet header"));
        }
        let (type_code, offset) = read_i32(payload, 0);
        let (zxid, offset) = read_i64(payload, offset);

        let packet = match type_code {
            REQUEST => {
                let blob = read_blob(payload, offset);
                let (session_id, next) = read_i64(blob, 0);
                let (cxid, next) = read_i32(blob, next);
                let (req_opcode, _) = read_i32(blob, next);
                QuorumPacket::Request {
                    zxid,
                    session_id,
                    cxid,
                    req_opcode,
                }
            }
            PROPOSAL => QuorumPacket::Proposal {
                zxid,
                txn: read_txn(read_blob(payload, offset), 0),
            },
            ACK => QuorumPacket::Ack { zxid },
            COMMIT => QuorumPacket::Commit { zxid },
            PING => QuorumPacket::Ping { zxid },
            REVALIDATE => {
                let blob = read_blob(payload, offset);
                let (session_id, next) = read_i64(blob, 0);
                let (timeout_ms, _) = read_i32(blob, next);
                QuorumPacket::Revalidate {
                    zxid,
                    session_id,
                    timeout_ms,
                }
            }
            SYNC => QuorumPacket::Sync { zxid },
            INFORM => QuorumPacket::Inform {
                zxid,
                txn: read_txn(read_blob(payload, offset), 0),
            },
            COMMIT_AND_ACTIVATE => {
                let blob = read_blob(payload, offset);
                let (suggested_leader, _) = read_i64(blob, 0);
                QuorumPacket::CommitAndActivate {
                    zxid,
                    suggested_leader,
                }
            }
            NEW_LEADER => QuorumPacket::NewLeader { zxid },
            FOLLOWER_INFO | OBSERVER_INFO => {
                let blob = read_blob(payload, offset);
                let (sid, next) = read_i64(blob, 0);
                let (protocol_version, next) = read_i32(blob, next);
                let (config_version, _) = read_i64(blob, next);
                if type_code == FOLLOWER_INFO {
                    QuorumPacket::FollowerInfo {
                        zxid,
                        sid,
                        protocol_version,
                        config_version,
                    }
                } else {
                    QuorumPacket::ObserverInfo {
                        zxid,
                        sid,
                        protocol_version,
                        config_version,
                    }
                }
            }
            UP_TO_DATE => QuorumPacket::UpToDate { zxid },
            DIFF => QuorumPacket::Diff { zxid },
            TRUNC => QuorumPacket::Trunc { zxid },
            SNAP => QuorumPacket::Snap { zxid },
            LEADER_INFO => {
                let blob = read_blob(payload, offset);
                let (protocol_version, _) = read_i32(blob, 0);
                QuorumPacket::LeaderInfo {
                    zxid,
                    protocol_version,
                }
            }
            ACK_EPOCH => {
                let blob = read_blob(payload, offset);
                let (epoch, _) = read_i32(blob, 0);
                QuorumPacket::AckEpoch { zxid, epoch }
            }
            INFORM_AND_ACTIVATE => {
                let blob = read_blob(payload, offset);
                let (suggested_leader, next) = read_i64(blob, 0);
                QuorumPacket::InformAndActivate {
                    zxid,
                    suggested_leader,
                    txn: read_txn(blob, next),
                }
            }
            other => return Err(DecodeError::UnknownQuorumPacketType(other)),
        };
        Ok(packet)
    }
}

/// Slice out the length-prefixed inner blob that payload-carrying types
/// wrap their data in. A missing or lying length yields whatever bytes are
/// actually there; inner reads then fail softly.
fn read_blob(payload: &[u8], offset: usize) -> &[u8] {
    let (len, after_len) = read_i32(payload, offset);
    if after_len == offset || len < 0 {
        return &[];
    }
    let end = (after_len + len as usize).min(payload.len());
    &payload[after_len..end]
}

/// Decode the stable transaction-header prefix, or `None` when the blob is
/// too short to hold one.
fn read_txn(blob: &[u8], offset: usize) -> Option<TxnInfo> {
    if blob.len().saturating_sub(offset) < 32 {
        return None;
    }
    let (client_id, next) = read_i64(blob, offset);
    let (cxid, next) = read_i32(blob, next);
    let (txn_zxid, next) = read_i64(blob, next);
    let (txn_time, next) = read_i64(blob, next);
    let (txn_opcode, _) = read_i32(blob, next);
    Some(TxnInfo {
        client_id,
        cxid,
        txn_zxid,
        txn_time,
        txn_opcode,
    })
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for QuorumPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(zxid=0x{:x}", self.type_name(), self.zxid())?;
        match self {
            QuorumPacket::Request {
                session_id,
                cxid,
                req_opcode,
                ..
            } => write!(
                f,
                ", session=0x{session_id:x}, cxid={cxid}, op={req_opcode})"
            ),
            QuorumPacket::Proposal { txn: Some(txn), .. }
            | QuorumPacket::Inform { txn: Some(txn), .. } => write!(
                f,
                ", client=0x{:x}, cxid={}, txn_zxid=0x{:x}, txn_op={})",
                txn.client_id, txn.cxid, txn.txn_zxid, txn.txn_opcode
            ),
            QuorumPacket::Revalidate {
                session_id,
                timeout_ms,
                ..
            } => write!(f, ", session=0x{session_id:x}, timeout={timeout_ms}ms)"),
            QuorumPacket::CommitAndActivate {
                suggested_leader, ..
            }
            | QuorumPacket::InformAndActivate {
                suggested_leader, ..
            } => write!(f, ", suggested_leader={suggested_leader})"),
            QuorumPacket::FollowerInfo { sid, .. } | QuorumPacket::ObserverInfo { sid, .. } => {
                write!(f, ", sid={sid})")
            }
            QuorumPacket::LeaderInfo {
                protocol_version, ..
            } => write!(f, ", protocol_version=0x{protocol_version:x})"),
            QuorumPacket::AckEpoch { epoch, .. } => write!(f, ", epoch={epoch})"),
            _ => write!(f, ")"),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
