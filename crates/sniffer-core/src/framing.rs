//! Link-layer to TCP-segment extraction.
//!
//! Captured frames arrive either with an Ethernet header, with the 4-byte
//! address-family header loopback interfaces use, or as a bare IP packet.
//! This module walks IP (v4 or v6) and TCP and hands back the payload slice
//! plus canonical endpoints. Anything that is not TCP over IP, or that does
//! not involve the port of interest, is a [`FrameError::BadPacket`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use zkt_proto::Endpoint;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("bad packet: {0}")]
    BadPacket(&'static str),
}

/// How the captured frame is framed below IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    Ethernet,
    /// BSD-style null/loopback encapsulation: 4-byte address family.
    Loopback,
    /// No link header at all; the frame starts at the IP version nibble.
    RawIp,
}

/// Which side of the server the payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

/// A TCP segment cut out of one captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSegment<'a> {
    pub src: Endpoint,
    pub dst: Endpoint,
    pub seq: u32,
    pub rst: bool,
    pub payload: &'a [u8],
}

// ---------------------------------------------------------------------------
// Frame walk
// ---------------------------------------------------------------------------

pub fn parse_frame(link: LinkLayer, frame: &[u8]) -> Result<TcpSegment<'_>, FrameError> {
    let (ip, v6) = match link {
        LinkLayer::Ethernet => {
            let ethertype = frame
                .get(12..14)
                .map(BigEndian::read_u16)
                .ok_or(FrameError::BadPacket("short ethernet header"))?;
            match ethertype {
                0x0800 => (&frame[14..], false),
                0x86DD => (&frame[14..], true),
                _ => return Err(FrameError::BadPacket("not an IP ethertype")),
            }
        }
        LinkLayer::Loopback => {
            let family = frame
                .get(..4)
                .ok_or(FrameError::BadPacket("short loopback header"))?;
            // The null-link family word is in the capturing host's byte
            // order; try both.
            let family = match LittleEndian::read_u32(family) {
                f @ (2 | 10 | 24 | 28 | 30) => f,
                _ => BigEndian::read_u32(family),
            };
            match family {
                2 => (&frame[4..], false),
                10 | 24 | 28 | 30 => (&frame[4..], true),
                _ => return Err(FrameError::BadPacket("unknown loopback family")),
            }
        }
        LinkLayer::RawIp => match frame.first().map(|b| b >> 4) {
            Some(4) => (frame, false),
            Some(6) => (frame, true),
            _ => return Err(FrameError::BadPacket("unknown IP version")),
        },
    };

    if v6 { parse_ipv6(ip) } else { parse_ipv4(ip) }
}

fn parse_ipv4(ip: &[u8]) -> Result<TcpSegment<'_>, FrameError> {
    if ip.len() < 20 || ip[0] >> 4 != 4 {
        return Err(FrameError::BadPacket("short or non-v4 IP header"));
    }
    let header_len = usize::from(ip[0] & 0x0f) * 4;
    if header_len < 20 || ip.len() < header_len {
        return Err(FrameError::BadPacket("bad IPv4 header length"));
    }
    if ip[9] != 6 {
        return Err(FrameError::BadPacket("not TCP"));
    }
    let total_len = usize::from(BigEndian::read_u16(&ip[2..4]));
    // Trailers past the declared total length (ethernet padding) are cut off.
    let end = total_len.clamp(header_len, ip.len());
    let src = IpAddr::V4(Ipv4Addr::new(ip[12], ip[13], ip[14], ip[15]));
    let dst = IpAddr::V4(Ipv4Addr::new(ip[16], ip[17], ip[18], ip[19]));
    parse_tcp(&ip[header_len..end], src, dst)
}

fn parse_ipv6(ip: &[u8]) -> Result<TcpSegment<'_>, FrameError> {
    if ip.len() < 40 || ip[0] >> 4 != 6 {
        return Err(FrameError::BadPacket("short or non-v6 IP header"));
    }
    // Extension-header chains are not walked; TCP must come first.
    if ip[6] != 6 {
        return Err(FrameError::BadPacket("not TCP"));
    }
    let payload_len = usize::from(BigEndian::read_u16(&ip[4..6]));
    let end = (40 + payload_len).min(ip.len());
    let mut src = [0u8; 16];
    src.copy_from_slice(&ip[8..24]);
    let mut dst = [0u8; 16];
    dst.copy_from_slice(&ip[24..40]);
    parse_tcp(
        &ip[40..end],
        IpAddr::V6(Ipv6Addr::from(src)),
        IpAddr::V6(Ipv6Addr::from(dst)),
    )
}

fn parse_tcp<'a>(
    tcp: &'a [u8],
    src_ip: IpAddr,
    dst_ip: IpAddr,
) -> Result<TcpSegment<'a>, FrameError> {
    if tcp.len() < 20 {
        return Err(FrameError::BadPacket("short TCP header"));
    }
    let header_len = usize::from(tcp[12] >> 4) * 4;
    if header_len < 20 || tcp.len() < header_len {
        return Err(FrameError::BadPacket("bad TCP data offset"));
    }
    Ok(TcpSegment {
        src: Endpoint::new(src_ip, BigEndian::read_u16(&tcp[0..2])),
        dst: Endpoint::new(dst_ip, BigEndian::read_u16(&tcp[2..4])),
        seq: BigEndian::read_u32(&tcp[4..8]),
        rst: tcp[13] & 0x04 != 0,
        payload: &tcp[header_len..],
    })
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Classify a segment against the server port of interest. When
/// `client_port` is nonzero the other side must match it too.
pub fn classify(
    segment: &TcpSegment,
    server_port: u16,
    client_port: u16,
) -> Result<Direction, FrameError> {
    if segment.dst.port == server_port {
        if client_port != 0 && segment.src.port != client_port {
            return Err(FrameError::BadPacket("client port mismatch"));
        }
        Ok(Direction::ClientToServer)
    } else if segment.src.port == server_port {
        if client_port != 0 && segment.dst.port != client_port {
            return Err(FrameError::BadPacket("client port mismatch"));
        }
        Ok(Direction::ServerToClient)
    } else {
        Err(FrameError::BadPacket("wrong port"))
    }
}

// ---------------------------------------------------------------------------
// Test support and unit tests
// ---------------------------------------------------------------------------

/// Build an Ethernet/IPv4/TCP frame around `payload`. Used by tests across
/// this crate and by the dump tools' self-checks.
pub fn build_ipv4_frame(src: Endpoint, dst: Endpoint, seq: u32, rst: bool, payload: &[u8]) -> Vec<u8> {
    let (IpAddr::V4(src_ip), IpAddr::V4(dst_ip)) = (src.ip, dst.ip) else {
        panic!("build_ipv4_frame requires IPv4 endpoints");
    };
    let mut frame = vec![0u8; 14];
    BigEndian::write_u16(&mut frame[12..14], 0x0800);

    let total_len = 20 + 20 + payload.len();
    let mut ip = vec![0u8; 20];
    ip[0] = 0x45;
    BigEndian::write_u16(&mut ip[2..4], total_len as u16);
    ip[8] = 64; // ttl
    ip[9] = 6; // tcp
    ip[12..16].copy_from_slice(&src_ip.octets());
    ip[16..20].copy_from_slice(&dst_ip.octets());
    frame.extend_from_slice(&ip);

    let mut tcp = vec![0u8; 20];
    BigEndian::write_u16(&mut tcp[0..2], src.port);
    BigEndian::write_u16(&mut tcp[2..4], dst.port);
    BigEndian::write_u32(&mut tcp[4..8], seq);
    tcp[12] = 0x50; // data offset 5 words
    tcp[13] = if rst { 0x04 } else { 0x18 }; // RST or PSH|ACK
    frame.extend_from_slice(&tcp);
    frame.extend_from_slice(payload);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> (Endpoint, Endpoint) {
        (Endpoint::v4(10, 0, 0, 7, 45000), Endpoint::v4(10, 0, 0, 1, 2181))
    }

    #[test]
    fn ethernet_ipv4_roundtrip() {
        let (src, dst) = endpoints();
        let frame = build_ipv4_frame(src, dst, 42, false, b"hello");
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        assert_eq!(segment.src, src);
        assert_eq!(segment.dst, dst);
        assert_eq!(segment.seq, 42);
        assert!(!segment.rst);
        assert_eq!(segment.payload, b"hello");
    }

    #[test]
    fn loopback_family_both_byte_orders() {
        let (src, dst) = endpoints();
        let inner = &build_ipv4_frame(src, dst, 1, false, b"x")[14..];
        for family in [[2, 0, 0, 0], [0, 0, 0, 2]] {
            let mut frame = family.to_vec();
            frame.extend_from_slice(inner);
            let segment = parse_frame(LinkLayer::Loopback, &frame).unwrap();
            assert_eq!(segment.payload, b"x");
        }
    }

    #[test]
    fn rst_flag_is_reported() {
        let (src, dst) = endpoints();
        let frame = build_ipv4_frame(src, dst, 9, true, b"");
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        assert!(segment.rst);
    }

    #[test]
    fn non_tcp_is_rejected() {
        let (src, dst) = endpoints();
        let mut frame = build_ipv4_frame(src, dst, 1, false, b"");
        frame[14 + 9] = 17; // udp
        assert_eq!(
            parse_frame(LinkLayer::Ethernet, &frame),
            Err(FrameError::BadPacket("not TCP"))
        );
    }

    #[test]
    fn ethernet_padding_is_trimmed() {
        let (src, dst) = endpoints();
        let mut frame = build_ipv4_frame(src, dst, 1, false, b"ab");
        frame.extend_from_slice(&[0u8; 6]); // pad to minimum frame size
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        assert_eq!(segment.payload, b"ab");
    }

    #[test]
    fn direction_classification() {
        let (client, server) = endpoints();
        let frame = build_ipv4_frame(client, server, 1, false, b"x");
        let segment = parse_frame(LinkLayer::Ethernet, &frame).unwrap();
        assert_eq!(classify(&segment, 2181, 0), Ok(Direction::ClientToServer));
        assert_eq!(classify(&segment, 45000, 0), Ok(Direction::ServerToClient));
        assert_eq!(
            classify(&segment, 2888, 0),
            Err(FrameError::BadPacket("wrong port"))
        );
        assert_eq!(classify(&segment, 2181, 45000), Ok(Direction::ClientToServer));
        assert_eq!(
            classify(&segment, 2181, 46000),
            Err(FrameError::BadPacket("client port mismatch"))
        );
    }
}
