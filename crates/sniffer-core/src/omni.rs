//! The multi-protocol dispatcher.
//!
//! Nothing has to be told where the ensemble lives. The dispatcher watches
//! for the election handshake, whose strict shape makes it safe to probe on
//! unknown flows, and registers the handshake's destination as an election
//! listener. Election notifications from reconfig-aware servers then embed
//! the whole cluster configuration, from which every member's election,
//! broadcast and client endpoints are registered. From that point each
//! `(ip, port)` endpoint routes to its decoder.
//!
//! Loopback captures deliver both the tx and rx copy of every segment, so
//! flows are deduplicated on TCP sequence number; an RST clears the flow's
//! dedup entry.

use crate::SniffError;
use crate::SnifferKind;
use crate::config::SnifferConfig;
use crate::event::SniffEvent;
use crate::framing::{FrameError, LinkLayer, TcpSegment, parse_frame};
use crate::sniffer::ZkSniffer;
use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use zkt_proto::fle::{self, FleMessage};
use zkt_proto::quorum_config::QuorumConfig;
use zkt_proto::zab::QuorumPacket;
use zkt_proto::Endpoint;

#[derive(Debug)]
pub struct OmniSniffer {
    kinds: HashMap<Endpoint, SnifferKind>,
    last_seq: HashMap<(Endpoint, Endpoint), u32>,
    zk: ZkSniffer,
}

impl OmniSniffer {
    pub fn new(config: &SnifferConfig) -> OmniSniffer {
        OmniSniffer {
            kinds: HashMap::new(),
            last_seq: HashMap::new(),
            zk: ZkSniffer::new(config),
        }
    }

    /// Which kind, if any, an endpoint is registered as.
    pub fn kind_of(&self, endpoint: &Endpoint) -> Option<SnifferKind> {
        self.kinds.get(endpoint).copied()
    }

    /// Number of registered endpoints.
    pub fn registered(&self) -> usize {
        self.kinds.len()
    }

    pub fn handle_frame(
        &mut self,
        link: LinkLayer,
        frame: &[u8],
        timestamp: SystemTime,
    ) -> Result<Vec<SniffEvent>, SniffError> {
        let segment = parse_frame(link, frame)?;
        let flow = (segment.src, segment.dst);

        if segment.rst {
            self.last_seq.remove(&flow);
            return Err(FrameError::BadPacket("tcp rst").into());
        }
        if segment.payload.is_empty() {
            return Err(FrameError::BadPacket("empty payload").into());
        }

        // Loopback interfaces deliver both copies of a segment; sequence
        // numbers only move forward within a flow, so a non-advancing one is
        // the duplicate.
        if let Some(&last) = self.last_seq.get(&flow) {
            if segment.seq <= last {
                return Err(FrameError::BadPacket("duplicate sequence").into());
            }
        }
        self.last_seq.insert(flow, segment.seq);

        // The destination is checked first: for zk it distinguishes the
        // client-to-server direction.
        if let Some(kind) = self.kind_of(&segment.dst) {
            return self.dispatch(kind, &segment, true, timestamp);
        }
        if let Some(kind) = self.kind_of(&segment.src) {
            return self.dispatch(kind, &segment, false, timestamp);
        }

        // Unknown flow: probe for the election handshake. Its tight length
        // equation keeps false positives out.
        match fle::Initial::from_payload(segment.payload) {
            Ok(initial) => {
                info!(server_id = initial.server_id, endpoint = %segment.dst, "election handshake seen");
                self.register(segment.dst, SnifferKind::Fle)?;
                Ok(vec![SniffEvent::Fle {
                    message: FleMessage::Initial(initial),
                    src: segment.src,
                    dst: segment.dst,
                    timestamp,
                }])
            }
            Err(_) => Err(FrameError::BadPacket("unclaimed endpoint").into()),
        }
    }

    fn dispatch(
        &mut self,
        kind: SnifferKind,
        segment: &TcpSegment<'_>,
        toward_registered: bool,
        timestamp: SystemTime,
    ) -> Result<Vec<SniffEvent>, SniffError> {
        match kind {
            SnifferKind::Fle => {
                let message = fle::from_payload(segment.payload)?;
                if let FleMessage::Notification(notification) = &message {
                    if !notification.config.is_empty() {
                        self.register_from_config(&notification.config, segment)?;
                    }
                }
                Ok(vec![SniffEvent::Fle {
                    message,
                    src: segment.src,
                    dst: segment.dst,
                    timestamp,
                }])
            }
            SnifferKind::Zab => {
                let packet = QuorumPacket::from_payload(segment.payload)?;
                Ok(vec![SniffEvent::Zab {
                    packet,
                    src: segment.src,
                    dst: segment.dst,
                    timestamp,
                }])
            }
            SnifferKind::Zk => {
                let event = if toward_registered {
                    self.zk
                        .handle_client_payload(segment.payload, segment.src, timestamp)?
                } else {
                    self.zk
                        .handle_server_payload(segment.payload, segment.dst, timestamp)?
                };
                Ok(vec![event])
            }
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    fn register(&mut self, endpoint: Endpoint, kind: SnifferKind) -> Result<(), SniffError> {
        match self.kinds.get(&endpoint) {
            Some(&existing) if existing != kind => Err(SniffError::ConflictingKind {
                endpoint,
                existing,
                proposed: kind,
            }),
            Some(_) => Ok(()),
            None => {
                info!(endpoint = %endpoint, kind = %kind, "registering endpoint");
                self.kinds.insert(endpoint, kind);
                Ok(())
            }
        }
    }

    /// Register listeners for every member named by a notification-embedded
    /// cluster configuration.
    fn register_from_config(
        &mut self,
        config_text: &str,
        segment: &TcpSegment<'_>,
    ) -> Result<(), SniffError> {
        let config = QuorumConfig::parse(config_text).inspect_err(|e| {
            warn!(error = %e, "unparseable cluster config in notification");
        })?;
        for server in config.servers() {
            let Some(host_ip) = resolve_host(&server.zab_fle_host) else {
                warn!(host = %server.zab_fle_host, sid = server.sid, "cannot resolve quorum host, skipping member");
                continue;
            };
            self.register(Endpoint::new(host_ip, server.fle_port), SnifferKind::Fle)?;
            self.register(Endpoint::new(host_ip, server.zab_port), SnifferKind::Zab)?;

            let Some(client) = &server.client else {
                continue;
            };
            // A client listener bound on all interfaces (or localhost) is
            // reachable at the member's quorum address.
            let zk_ip = if client.host == "0.0.0.0" || client.host == "localhost" {
                if host_ip.is_unspecified() {
                    segment.src.ip
                } else {
                    host_ip
                }
            } else {
                match resolve_host(&client.host) {
                    Some(ip) => ip,
                    None => {
                        warn!(host = %client.host, sid = server.sid, "cannot resolve client host, skipping listener");
                        continue;
                    }
                }
            };
            if zk_ip != segment.src.ip && zk_ip != segment.dst.ip {
                debug!(ip = %zk_ip, sid = server.sid, "client listener off the observed flow");
            }
            self.register(Endpoint::new(zk_ip, client.port), SnifferKind::Zk)?;
        }
        Ok(())
    }
}

/// Resolve a host string to an address: literal IPs first, then DNS.
fn resolve_host(host: &str) -> Option<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip);
    }
    (host, 0u16)
        .to_socket_addrs()
        .ok()?
        .next()
        .map(|addr| addr.ip())
}
