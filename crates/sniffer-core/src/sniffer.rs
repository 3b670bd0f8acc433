//! Single-protocol sniffers: one protocol, one well-known port, decoded
//! statically. The omni dispatcher reuses the zk sniffer's payload handlers
//! with endpoints it discovered itself.

use crate::SniffError;
use crate::config::SnifferConfig;
use crate::event::SniffEvent;
use crate::framing::{Direction, FrameError, TcpSegment, classify};
use crate::session::SessionTracker;
use std::time::SystemTime;
use zkt_proto::zab::QuorumPacket;
use zkt_proto::zk::{ClientMessage, FourLetterWord, ServerMessage};
use zkt_proto::{Endpoint, fle};

// ---------------------------------------------------------------------------
// ZK
// ---------------------------------------------------------------------------

/// Client-protocol sniffer with per-client session state.
#[derive(Debug)]
pub struct ZkSniffer {
    config: SnifferConfig,
    sessions: SessionTracker,
}

impl ZkSniffer {
    pub fn new(config: &SnifferConfig) -> ZkSniffer {
        ZkSniffer {
            config: config.clone(),
            sessions: SessionTracker::new(config.xid_cap),
        }
    }

    pub fn handle_segment(
        &mut self,
        segment: &TcpSegment<'_>,
        timestamp: SystemTime,
    ) -> Result<SniffEvent, SniffError> {
        if segment.payload.is_empty() {
            return Err(FrameError::BadPacket("empty payload").into());
        }
        match classify(segment, self.config.zk_port, self.config.client_port)? {
            Direction::ClientToServer => {
                self.handle_client_payload(segment.payload, segment.src, timestamp)
            }
            Direction::ServerToClient => {
                self.handle_server_payload(segment.payload, segment.dst, timestamp)
            }
        }
    }

    /// Decode bytes flowing client → server.
    pub fn handle_client_payload(
        &mut self,
        payload: &[u8],
        client: Endpoint,
        timestamp: SystemTime,
    ) -> Result<SniffEvent, SniffError> {
        if let Some(word) = FourLetterWord::from_payload(payload) {
            self.sessions.set_four_letter(client, word);
            return Ok(SniffEvent::FourLetter {
                word,
                client,
                timestamp,
            });
        }
        let message = ClientMessage::from_payload(payload, client, timestamp)?;
        if message.expects_reply() {
            self.sessions.remember(client, message.xid, message.opcode());
        }
        Ok(SniffEvent::ZkRequest(message))
    }

    /// Decode bytes flowing server → client.
    pub fn handle_server_payload(
        &mut self,
        payload: &[u8],
        client: Endpoint,
        timestamp: SystemTime,
    ) -> Result<SniffEvent, SniffError> {
        if self.sessions.take_four_letter(&client).is_some() {
            // The single-packet response to an admin probe; not protocol bytes.
            return Err(FrameError::BadPacket("four-letter response").into());
        }
        let sessions = &mut self.sessions;
        let message = ServerMessage::from_payload(payload, client, timestamp, |xid| {
            sessions.recall(&client, xid)
        })?;
        Ok(SniffEvent::ZkReply(message))
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }
}

// ---------------------------------------------------------------------------
// FLE
// ---------------------------------------------------------------------------

/// Election-protocol sniffer; stateless beyond its port filter.
#[derive(Debug)]
pub struct FleSniffer {
    config: SnifferConfig,
}

impl FleSniffer {
    pub fn new(config: &SnifferConfig) -> FleSniffer {
        FleSniffer {
            config: config.clone(),
        }
    }

    pub fn handle_segment(
        &mut self,
        segment: &TcpSegment<'_>,
        timestamp: SystemTime,
    ) -> Result<SniffEvent, SniffError> {
        if segment.payload.is_empty() {
            return Err(FrameError::BadPacket("empty payload").into());
        }
        classify(segment, self.config.fle_port, 0)?;
        let message = fle::from_payload(segment.payload)?;
        Ok(SniffEvent::Fle {
            message,
            src: segment.src,
            dst: segment.dst,
            timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// ZAB
// ---------------------------------------------------------------------------

/// Broadcast-protocol sniffer; stateless beyond its port filter.
#[derive(Debug)]
pub struct ZabSniffer {
    config: SnifferConfig,
}

impl ZabSniffer {
    pub fn new(config: &SnifferConfig) -> ZabSniffer {
        ZabSniffer {
            config: config.clone(),
        }
    }

    pub fn handle_segment(
        &mut self,
        segment: &TcpSegment<'_>,
        timestamp: SystemTime,
    ) -> Result<SniffEvent, SniffError> {
        if segment.payload.is_empty() {
            return Err(FrameError::BadPacket("empty payload").into());
        }
        classify(segment, self.config.zab_port, 0)?;
        let packet = QuorumPacket::from_payload(segment.payload)?;
        Ok(SniffEvent::Zab {
            packet,
            src: segment.src,
            dst: segment.dst,
            timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{LinkLayer, build_ipv4_frame, parse_frame};
    use zkt_proto::zk::OpCode;

    fn config() -> SnifferConfig {
        SnifferConfig::default()
    }

    fn client() -> Endpoint {
        Endpoint::v4(10, 0, 0, 7, 45000)
    }

    fn server() -> Endpoint {
        Endpoint::v4(10, 0, 0, 1, 2181)
    }

    fn framed_request(xid: i32, op: i32, path: &str) -> Vec<u8> {
        let mut body = xid.to_be_bytes().to_vec();
        body.extend_from_slice(&op.to_be_bytes());
        body.extend_from_slice(&(path.len() as i32).to_be_bytes());
        body.extend_from_slice(path.as_bytes());
        body.push(0); // watch
        let mut payload = (body.len() as i32).to_be_bytes().to_vec();
        payload.extend_from_slice(&body);
        payload
    }

    fn reply(xid: i32, zxid: i64, err: i32) -> Vec<u8> {
        let mut body = xid.to_be_bytes().to_vec();
        body.extend_from_slice(&zxid.to_be_bytes());
        body.extend_from_slice(&err.to_be_bytes());
        let mut payload = (body.len() as i32).to_be_bytes().to_vec();
        payload.extend_from_slice(&body);
        payload
    }

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH
    }

    #[test]
    fn request_then_reply_restores_opcode() {
        let mut sniffer = ZkSniffer::new(&config());

        let frame = build_ipv4_frame(client(), server(), 1, false, &framed_request(7, 4, "/a"));
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        let event = sniffer.handle_segment(&segment, now()).unwrap();
        match event {
            SniffEvent::ZkRequest(msg) => assert_eq!(msg.opcode(), OpCode::GetData),
            other => panic!("unexpected event {other:?}"),
        }

        let frame = build_ipv4_frame(server(), client(), 1, false, &reply(7, 0x10, 0));
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        let event = sniffer.handle_segment(&segment, now()).unwrap();
        match event {
            SniffEvent::ZkReply(ServerMessage::Reply(reply)) => {
                assert_eq!(reply.op, Some(OpCode::GetData));
                assert_eq!(reply.zxid, 0x10);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn four_letter_probe_and_response_are_flagged() {
        let mut sniffer = ZkSniffer::new(&config());

        let frame = build_ipv4_frame(client(), server(), 1, false, b"ruok");
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        let event = sniffer.handle_segment(&segment, now()).unwrap();
        assert!(matches!(
            event,
            SniffEvent::FourLetter { word: FourLetterWord::Ruok, .. }
        ));

        // The response is excluded from protocol parsing and clears the mode.
        let frame = build_ipv4_frame(server(), client(), 1, false, b"imok");
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        assert_eq!(
            sniffer.handle_segment(&segment, now()),
            Err(SniffError::Frame(FrameError::BadPacket("four-letter response")))
        );
    }

    #[test]
    fn wrong_port_is_not_of_interest() {
        let mut sniffer = ZkSniffer::new(&config());
        let other = Endpoint::v4(10, 0, 0, 1, 8080);
        let frame = build_ipv4_frame(client(), other, 1, false, b"data");
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        assert_eq!(
            sniffer.handle_segment(&segment, now()),
            Err(SniffError::Frame(FrameError::BadPacket("wrong port")))
        );
    }

    #[test]
    fn zab_sniffer_decodes_commit() {
        let mut sniffer = ZabSniffer::new(&config());
        let leader = Endpoint::v4(10, 0, 0, 1, 2888);
        let follower = Endpoint::v4(10, 0, 0, 2, 51000);
        let mut payload = 4_i32.to_be_bytes().to_vec();
        payload.extend_from_slice(&0x100_i64.to_be_bytes());
        let frame = build_ipv4_frame(leader, follower, 1, false, &payload);
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        let event = sniffer.handle_segment(&segment, now()).unwrap();
        match event {
            SniffEvent::Zab { packet, .. } => {
                assert_eq!(packet, QuorumPacket::Commit { zxid: 0x100 });
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn fle_sniffer_decodes_notification() {
        let mut sniffer = FleSniffer::new(&config());
        let a = Endpoint::v4(10, 0, 0, 1, 3888);
        let b = Endpoint::v4(10, 0, 0, 2, 52000);
        let mut payload = 1_i32.to_be_bytes().to_vec();
        payload.extend_from_slice(&3_i64.to_be_bytes());
        payload.extend_from_slice(&0x2000_i64.to_be_bytes());
        payload.extend_from_slice(&10_i64.to_be_bytes());
        let frame = build_ipv4_frame(b, a, 1, false, &payload);
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        let event = sniffer.handle_segment(&segment, now()).unwrap();
        match event {
            SniffEvent::Fle { message: fle::FleMessage::Notification(n), .. } => {
                assert_eq!(n.leader, 3);
                assert_eq!(n.peer_epoch, -1);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
