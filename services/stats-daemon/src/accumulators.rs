//! Request-stream statistics.
//!
//! Counters are aggregated three ways over the decoded request stream: by
//! znode path, by client address, and by the auth credential the correlator
//! stamped on the request (SetAuth requests piggy-back their credential as
//! the path, so per-auth and per-path views compose). Everything is plain
//! counting; windowing and rates are the HTTP consumer's problem.

use serde::Serialize;
use sniffer_core::event::SniffEvent;
use std::collections::HashMap;
use std::time::SystemTime;
use zkt_proto::zk::{ClientMessage, ServerMessage};

/// Counters for one aggregation key.
#[derive(Debug, Default, Clone, Serialize)]
pub struct OpCounters {
    pub total: u64,
    pub writes: u64,
    pub watches: u64,
    /// Per-operation counts, keyed by opcode name.
    pub by_op: HashMap<String, u64>,
}

impl OpCounters {
    fn record(&mut self, message: &ClientMessage) {
        self.total += 1;
        if message.is_write() {
            self.writes += 1;
        }
        if message.watch {
            self.watches += 1;
        }
        *self
            .by_op
            .entry(message.opcode().name().to_owned())
            .or_default() += 1;
    }
}

/// Totals reported by `/json/info`.
#[derive(Debug, Clone, Serialize)]
pub struct InfoSnapshot {
    pub version: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub uptime_secs: u64,
    pub requests: u64,
    pub replies: u64,
    pub watch_events: u64,
    pub other_events: u64,
    pub tracked_paths: usize,
    pub tracked_ips: usize,
    pub tracked_auths: usize,
}

#[derive(Debug)]
pub struct StatsAccumulator {
    paths: HashMap<String, OpCounters>,
    ips: HashMap<String, OpCounters>,
    auths: HashMap<String, OpCounters>,
    /// Per-auth per-path request counts, for the full dump endpoint.
    auth_paths: HashMap<String, HashMap<String, u64>>,
    started: SystemTime,
    requests: u64,
    replies: u64,
    watch_events: u64,
    other_events: u64,
}

impl StatsAccumulator {
    pub fn new() -> StatsAccumulator {
        StatsAccumulator {
            paths: HashMap::new(),
            ips: HashMap::new(),
            auths: HashMap::new(),
            auth_paths: HashMap::new(),
            started: SystemTime::now(),
            requests: 0,
            replies: 0,
            watch_events: 0,
            other_events: 0,
        }
    }

    pub fn record(&mut self, event: &SniffEvent) {
        match event {
            SniffEvent::ZkRequest(message) => self.record_request(message),
            SniffEvent::ZkReply(ServerMessage::Reply(_)) => self.replies += 1,
            SniffEvent::ZkReply(ServerMessage::Watch(_)) => self.watch_events += 1,
            _ => self.other_events += 1,
        }
    }

    fn record_request(&mut self, message: &ClientMessage) {
        self.requests += 1;
        if !message.path.is_empty() {
            self.paths
                .entry(message.path.clone())
                .or_default()
                .record(message);
        }
        self.ips
            .entry(message.client.ip.to_string())
            .or_default()
            .record(message);
        if let Some(auth) = &message.auth {
            self.auths.entry(auth.clone()).or_default().record(message);
            if !message.path.is_empty() {
                *self
                    .auth_paths
                    .entry(auth.clone())
                    .or_default()
                    .entry(message.path.clone())
                    .or_default() += 1;
            }
        }
    }

    pub fn paths(&self) -> &HashMap<String, OpCounters> {
        &self.paths
    }

    pub fn ips(&self) -> &HashMap<String, OpCounters> {
        &self.ips
    }

    pub fn auths(&self) -> &HashMap<String, OpCounters> {
        &self.auths
    }

    pub fn auth_paths(&self) -> &HashMap<String, HashMap<String, u64>> {
        &self.auth_paths
    }

    pub fn info(&self, version: &str) -> InfoSnapshot {
        InfoSnapshot {
            version: version.to_owned(),
            started_at: self.started.into(),
            uptime_secs: self.started.elapsed().map_or(0, |d| d.as_secs()),
            requests: self.requests,
            replies: self.replies,
            watch_events: self.watch_events,
            other_events: self.other_events,
            tracked_paths: self.paths.len(),
            tracked_ips: self.ips.len(),
            tracked_auths: self.auths.len(),
        }
    }
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        StatsAccumulator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkt_proto::Endpoint;
    use zkt_proto::zk::RequestBody;

    fn request(path: &str, body: RequestBody, auth: Option<&str>) -> SniffEvent {
        SniffEvent::ZkRequest(ClientMessage {
            size: 16,
            xid: 1,
            path: path.to_owned(),
            client: Endpoint::v4(10, 0, 0, 7, 45000),
            watch: false,
            timestamp: SystemTime::UNIX_EPOCH,
            auth: auth.map(str::to_owned),
            body,
        })
    }

    #[test]
    fn requests_aggregate_three_ways() {
        let mut stats = StatsAccumulator::new();
        stats.record(&request("/a", RequestBody::GetData, Some("alice:pw")));
        stats.record(&request("/a", RequestBody::SetData, Some("alice:pw")));
        stats.record(&request("/b", RequestBody::GetData, None));

        let a = &stats.paths()["/a"];
        assert_eq!(a.total, 2);
        assert_eq!(a.writes, 1);
        assert_eq!(a.by_op["GetData"], 1);
        assert_eq!(a.by_op["SetData"], 1);

        assert_eq!(stats.ips()["10.0.0.7"].total, 3);
        assert_eq!(stats.auths()["alice:pw"].total, 2);
        assert_eq!(stats.auth_paths()["alice:pw"]["/a"], 2);
        assert_eq!(stats.info("test").requests, 3);
    }

    #[test]
    fn replies_and_watches_count_separately() {
        use zkt_proto::zk::{Reply, ReplyBody, WatchEvent};
        let mut stats = StatsAccumulator::new();
        stats.record(&SniffEvent::ZkReply(ServerMessage::Reply(Reply {
            size: 16,
            xid: 1,
            zxid: 1,
            err: 0,
            op: None,
            body: ReplyBody::None,
            client: Endpoint::v4(10, 0, 0, 7, 45000),
            timestamp: SystemTime::UNIX_EPOCH,
        })));
        stats.record(&SniffEvent::ZkReply(ServerMessage::Watch(WatchEvent {
            event_type: 3,
            state: 3,
            path: "/a".to_owned(),
            client: Endpoint::v4(10, 0, 0, 7, 45000),
            timestamp: SystemTime::UNIX_EPOCH,
        })));
        let info = stats.info("test");
        assert_eq!(info.replies, 1);
        assert_eq!(info.watch_events, 1);
        assert_eq!(info.requests, 0);
    }
}
