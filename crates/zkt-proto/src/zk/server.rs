//! Server-to-client decoding: replies and asynchronous watch events.
//!
//! A reply body is only meaningful given the opcode of the request it
//! answers, which the server never repeats on the wire. The caller supplies
//! that memory as a lookup closure over the connection's xid map; when the
//! xid is unknown (late capture start, evicted entry) the reply is returned
//! header-only.

use super::WATCH_EVENT_XID;
use super::opcode::OpCode;
use crate::endpoint::Endpoint;
use crate::error::DecodeError;
use std::fmt;
use std::time::SystemTime;
use zkt_wire::{DEFAULT_MAXLEN, read_i32, read_i64, read_string};

/// Cap on the number of children decoded from a GetChildren reply.
const CHILDREN_MAX: i32 = 1024;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Reply(Reply),
    Watch(WatchEvent),
}

/// A reply to a client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub size: usize,
    pub xid: i32,
    pub zxid: i64,
    pub err: i32,
    /// The opcode remembered for this xid, when the session had one.
    pub op: Option<OpCode>,
    pub body: ReplyBody,
    pub client: Endpoint,
    pub timestamp: SystemTime,
}

/// Typed reply payload, keyed by the remembered opcode. Replies to Ping,
/// Auth and Close are short and carry no body worth decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    None,
    Path(String),
    Children(Vec<String>),
}

/// An asynchronous watch-fired notification (xid −1, never paired with a
/// request).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub event_type: i32,
    pub state: i32,
    pub path: String,
    pub client: Endpoint,
    pub timestamp: SystemTime,
}

impl WatchEvent {
    pub fn type_name(&self) -> &'static str {
        match self.event_type {
            -1 => "None",
            1 => "NodeCreated",
            2 => "NodeDeleted",
            3 => "NodeDataChanged",
            4 => "NodeChildrenChanged",
            _ => "Unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

impl ServerMessage {
    pub fn from_payload(
        payload: &[u8],
        client: Endpoint,
        timestamp: SystemTime,
        lookup: impl FnOnce(i32) -> Option<OpCode>,
    ) -> Result<ServerMessage, DecodeError> {
        let (len, offset) = read_i32(payload, 0);
        if offset == 0 {
            return Err(DecodeError::Truncated("reply header"));
        }
        let size = len.max(0) as usize;
        let (xid, next) = read_i32(payload, offset);
        if next == offset {
            return Err(DecodeError::Truncated("reply xid"));
        }
        let (zxid, next2) = read_i64(payload, next);
        if next2 == next {
            return Err(DecodeError::Truncated("reply zxid"));
        }
        let (err, offset) = read_i32(payload, next2);
        if offset == next2 {
            return Err(DecodeError::Truncated("reply err"));
        }

        if xid == WATCH_EVENT_XID {
            let (event_type, next) = read_i32(payload, offset);
            let (state, next) = read_i32(payload, next);
            let (path, _) = read_string(payload, next, DEFAULT_MAXLEN)?;
            return Ok(ServerMessage::Watch(WatchEvent {
                event_type,
                state,
                path,
                client,
                timestamp,
            }));
        }

        let op = lookup(xid);
        let body = if err != 0 {
            ReplyBody::None
        } else {
            match op {
                Some(OpCode::Create | OpCode::Create2 | OpCode::Sync) => {
                    let (path, _) = read_string(payload, offset, DEFAULT_MAXLEN)?;
                    ReplyBody::Path(path)
                }
                Some(OpCode::GetChildren | OpCode::GetChildren2) => {
                    ReplyBody::Children(read_children(payload, offset))
                }
                _ => ReplyBody::None,
            }
        };

        Ok(ServerMessage::Reply(Reply {
            size,
            xid,
            zxid,
            err,
            op,
            body,
            client,
            timestamp,
        }))
    }
}

/// Read the child-name vector of a GetChildren reply, keeping whatever
/// parsed before the first malformed entry.
fn read_children(payload: &[u8], offset: usize) -> Vec<String> {
    let (count, mut offset2) = read_i32(payload, offset);
    if offset2 == offset || count < 0 || count > CHILDREN_MAX {
        return Vec::new();
    }
    let mut children = Vec::with_capacity(count as usize);
    for _ in 0..count {
        match read_string(payload, offset2, DEFAULT_MAXLEN) {
            Ok((name, next)) if next != offset2 => {
                children.push(name);
                offset2 = next;
            }
            _ => break,
        }
    }
    children
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = self.op.map_or("Unknown", OpCode::name);
        write!(
            f,
            "{}Reply(xid={}, zxid=0x{:x}, err={}, client={})",
            op, self.xid, self.zxid, self.err, self.client
        )?;
        match &self.body {
            ReplyBody::None => Ok(()),
            ReplyBody::Path(path) => write!(f, " path={path}"),
            ReplyBody::Children(children) => write!(f, " children={}", children.len()),
        }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "WatchEvent(type={}, state={}, path={}, client={})",
            self.type_name(),
            self.state,
            self.path,
            self.client
        )
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServerMessage::Reply(reply) => reply.fmt(f),
            ServerMessage::Watch(event) => event.fmt(f),
        }
    }
}
