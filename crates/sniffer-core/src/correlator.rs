//! Request/reply pairing and latency measurement.
//!
//! Requests queue per `(client, xid)` as a list, not a slot, because
//! loopback captures deliver retransmits with duplicate xids. Replies pop their list
//! and come out as pairs carrying the observed latency. Close requests get
//! no reply and are forwarded immediately; watch events are asynchronous and
//! never pair. A reply with no matching request (late capture start) is
//! dropped; a request with no reply is eventually pushed out by FIFO
//! pressure once the per-client queue exceeds its cap.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{debug, warn};
use zkt_proto::Endpoint;
use zkt_proto::zk::{ClientMessage, Reply, RequestBody, ServerMessage, WatchEvent};

/// A request matched with its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestReplyPair {
    pub request: ClientMessage,
    pub reply: Reply,
    /// Reply capture time minus request capture time, clamped at zero.
    pub latency: Duration,
}

/// What a pushed message turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlated {
    /// A request forwarded without waiting for a reply (Close, Connect).
    Request(ClientMessage),
    /// Matched pairs; one unless loopback dedup is off and the xid queued
    /// several retransmits.
    Pairs(Vec<RequestReplyPair>),
    /// An asynchronous watch event, passed through.
    Watch(WatchEvent),
    /// A reply nobody was waiting for.
    Dropped,
}

#[derive(Debug)]
pub struct Correlator {
    outstanding: HashMap<(Endpoint, i32), Vec<ClientMessage>>,
    order: HashMap<Endpoint, VecDeque<i32>>,
    auths: HashMap<Endpoint, String>,
    per_client_cap: usize,
    dedup_loopback: bool,
    overflows: u64,
}

impl Correlator {
    pub fn new(per_client_cap: usize, dedup_loopback: bool) -> Correlator {
        Correlator {
            outstanding: HashMap::new(),
            order: HashMap::new(),
            auths: HashMap::new(),
            per_client_cap,
            dedup_loopback,
            overflows: 0,
        }
    }

    /// Feed a decoded client request.
    pub fn push_request(&mut self, mut request: ClientMessage) -> Correlated {
        if let RequestBody::SetAuth { credential, .. } = &request.body {
            self.auths.insert(request.client, credential.clone());
        }
        request.auth = self.auths.get(&request.client).cloned();

        if !request.expects_reply() {
            return Correlated::Request(request);
        }

        let client = request.client;
        let order = self.order.entry(client).or_default();
        if order.len() >= self.per_client_cap {
            // Oldest request never got its reply captured; push it out.
            if let Some(stale) = order.pop_front() {
                if let Some(list) = self.outstanding.get_mut(&(client, stale)) {
                    list.remove(0);
                    if list.is_empty() {
                        self.outstanding.remove(&(client, stale));
                    }
                }
                self.overflows += 1;
                warn!(client = %client, xid = stale, "correlator queue full, evicting oldest request");
            }
        }
        order.push_back(request.xid);
        self.outstanding
            .entry((client, request.xid))
            .or_default()
            .push(request);
        Correlated::Pairs(Vec::new())
    }

    /// Feed a decoded server message.
    pub fn push_reply(&mut self, message: ServerMessage) -> Correlated {
        let reply = match message {
            ServerMessage::Watch(event) => return Correlated::Watch(event),
            ServerMessage::Reply(reply) => reply,
        };
        let key = (reply.client, reply.xid);
        let Some(mut requests) = self.outstanding.remove(&key) else {
            debug!(client = %reply.client, xid = reply.xid, "reply without a matching request");
            return Correlated::Dropped;
        };
        if let Some(order) = self.order.get_mut(&reply.client) {
            order.retain(|&xid| xid != reply.xid);
        }
        if self.dedup_loopback && requests.len() > 1 {
            // Loopback captures see both the tx and the rx copy of the same
            // request; keep the earliest so latency spans the full round trip.
            requests.truncate(1);
        }
        let pairs = requests
            .into_iter()
            .map(|request| {
                let latency = reply
                    .timestamp
                    .duration_since(request.timestamp)
                    .unwrap_or_default();
                RequestReplyPair {
                    request,
                    reply: reply.clone(),
                    latency,
                }
            })
            .collect();
        Correlated::Pairs(pairs)
    }

    /// Requests evicted unanswered since start.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Requests currently awaiting their reply for one client.
    pub fn outstanding(&self, client: &Endpoint) -> usize {
        self.order.get(client).map_or(0, VecDeque::len)
    }
}
