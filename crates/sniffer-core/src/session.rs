//! Per-client connection state for the zk protocol.
//!
//! Replies do not repeat the opcode of the request they answer, so the
//! sniffer keeps an `xid -> opcode` memory per client endpoint. The map is
//! FIFO-capped: a client that never gets its replies captured (or a capture
//! started mid-stream) cannot grow state without bound. Sessions are created
//! lazily on the first request and never torn down; observing a Close is
//! interesting in itself, freeing the entry is not.

use std::collections::{HashMap, VecDeque};
use tracing::warn;
use zkt_proto::Endpoint;
use zkt_proto::zk::{FourLetterWord, OpCode};

#[derive(Debug, Default)]
struct Session {
    xids: HashMap<i32, OpCode>,
    order: VecDeque<i32>,
    four_letter: Option<FourLetterWord>,
}

/// Tracks every observed client connection.
#[derive(Debug)]
pub struct SessionTracker {
    sessions: HashMap<Endpoint, Session>,
    xid_cap: usize,
    overflows: u64,
}

impl SessionTracker {
    pub fn new(xid_cap: usize) -> SessionTracker {
        SessionTracker {
            sessions: HashMap::new(),
            xid_cap,
            overflows: 0,
        }
    }

    /// Remember the opcode behind an in-flight xid. Returns the xid that was
    /// evicted when the client was already at its cap.
    pub fn remember(&mut self, client: Endpoint, xid: i32, op: OpCode) -> Option<i32> {
        let cap = self.xid_cap;
        let session = self.sessions.entry(client).or_default();
        let mut evicted = None;
        while session.xids.len() >= cap {
            // The order deque can hold xids already recalled; skip those.
            match session.order.pop_front() {
                Some(old) => {
                    if session.xids.remove(&old).is_some() {
                        evicted = Some(old);
                        break;
                    }
                }
                None => break,
            }
        }
        if let Some(old) = evicted {
            self.overflows += 1;
            warn!(client = %client, xid = old, "xid map full, evicting oldest in-flight request");
        }
        session.xids.insert(xid, op);
        session.order.push_back(xid);
        evicted
    }

    /// Recall (and forget) the opcode for a reply's xid.
    pub fn recall(&mut self, client: &Endpoint, xid: i32) -> Option<OpCode> {
        self.sessions.get_mut(client)?.xids.remove(&xid)
    }

    /// Put the connection in four-letter mode. A second probe before the
    /// response overwrites the first; pipelined probes are not tracked.
    pub fn set_four_letter(&mut self, client: Endpoint, word: FourLetterWord) {
        self.sessions.entry(client).or_default().four_letter = Some(word);
    }

    /// Clear and return the pending four-letter mode, if any.
    pub fn take_four_letter(&mut self, client: &Endpoint) -> Option<FourLetterWord> {
        self.sessions.get_mut(client)?.four_letter.take()
    }

    /// Number of in-flight xids tracked for a client.
    pub fn outstanding(&self, client: &Endpoint) -> usize {
        self.sessions.get(client).map_or(0, |s| s.xids.len())
    }

    /// Total xid-map evictions since start.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }
}
