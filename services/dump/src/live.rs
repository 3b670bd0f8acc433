//! Live capture via libpcap. Compiled only with the `live` feature.

use sniffer_core::SnifferConfig;
use sniffer_core::framing::LinkLayer;
use sniffer_core::source::{FrameSource, RawFrame, SourceError};
use std::time::{Duration, SystemTime};
use tracing::info;

/// An open libpcap handle on a network interface.
pub struct LiveSource {
    capture: pcap::Capture<pcap::Active>,
    link: LinkLayer,
}

impl LiveSource {
    pub fn open(iface: &str, config: &SnifferConfig) -> Result<LiveSource, SourceError> {
        let timeout = config
            .read_timeout
            .unwrap_or(Duration::from_millis(250))
            .as_millis() as i32;
        let capture = pcap::Capture::from_device(iface)
            .map_err(|e| SourceError::Capture(e.to_string()))?
            .promisc(true)
            .snaplen(65_535)
            .timeout(timeout)
            .open()
            .map_err(|e| SourceError::Capture(e.to_string()))?;

        let link = match capture.get_datalink().0 {
            1 => LinkLayer::Ethernet,
            0 | 108 => LinkLayer::Loopback,
            12 | 14 | 101 => LinkLayer::RawIp,
            other => {
                return Err(SourceError::Capture(format!(
                    "unsupported datalink type {other} on {iface}"
                )));
            }
        };
        info!(iface, ?link, "live capture open");
        Ok(LiveSource { capture, link })
    }
}

impl FrameSource for LiveSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        match self.capture.next_packet() {
            Ok(packet) => {
                let secs = packet.header.ts.tv_sec.max(0) as u64;
                let micros = packet.header.ts.tv_usec.max(0) as u64;
                let timestamp = SystemTime::UNIX_EPOCH
                    + Duration::from_secs(secs)
                    + Duration::from_micros(micros);
                Ok(Some(RawFrame {
                    timestamp,
                    link: self.link,
                    data: packet.data.to_vec(),
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Err(SourceError::Timeout),
            Err(e) => Err(SourceError::Capture(e.to_string())),
        }
    }
}
