//! Frame sources.
//!
//! The engine is agnostic about where frames come from; anything that can
//! yield timestamped link-layer frames implements [`FrameSource`]. The
//! built-in source replays pcap-ng capture files. Live capture lives in the
//! dump tools behind their `live` feature, since it drags in libpcap.

use crate::framing::LinkLayer;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture: {0}")]
    Capture(String),
    /// A read timeout elapsed with no frame; the caller should re-check its
    /// stop flag and poll again.
    #[error("read timeout")]
    Timeout,
}

/// One captured frame, as handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub timestamp: SystemTime,
    pub link: LinkLayer,
    pub data: Vec<u8>,
}

/// A producer of captured frames. `Ok(None)` means the source is exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError>;
}

impl FrameSource for Box<dyn FrameSource + Send> {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        (**self).next_frame()
    }
}

// ---------------------------------------------------------------------------
// pcap-ng file replay
// ---------------------------------------------------------------------------

/// Replays a pcap-ng capture file. Frames on interfaces with link types the
/// framer cannot walk are skipped.
pub struct PcapFileSource<R: Read> {
    capture: pcarp::Capture<R>,
}

impl PcapFileSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let capture = pcarp::Capture::new(BufReader::new(file))
            .map_err(|e| SourceError::Capture(e.to_string()))?;
        Ok(PcapFileSource { capture })
    }
}

impl<R: Read> FrameSource for PcapFileSource<R> {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        loop {
            match self.capture.next() {
                None => return Ok(None),
                Some(Err(e)) => return Err(SourceError::Capture(e.to_string())),
                Some(Ok(packet)) => {
                    let link = packet
                        .interface
                        .and_then(|interface| link_layer(interface.link_type));
                    let Some(link) = link else {
                        continue;
                    };
                    let timestamp = packet.timestamp.unwrap_or_else(SystemTime::now);
                    return Ok(Some(RawFrame {
                        timestamp,
                        link,
                        data: packet.data.to_vec(),
                    }));
                }
            }
        }
    }
}

fn link_layer(link: pcarp::LinkType) -> Option<LinkLayer> {
    match link {
        pcarp::LinkType::ETHERNET => Some(LinkLayer::Ethernet),
        pcarp::LinkType::NULL | pcarp::LinkType::LOOP => Some(LinkLayer::Loopback),
        pcarp::LinkType::RAW => Some(LinkLayer::RawIp),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// In-memory replay (tests, emulation)
// ---------------------------------------------------------------------------

/// Serves a fixed list of frames; used by tests and by anything that wants
/// to feed synthesized traffic through the engine.
#[derive(Debug, Default)]
pub struct ReplaySource {
    frames: VecDeque<RawFrame>,
}

impl ReplaySource {
    pub fn new(frames: Vec<RawFrame>) -> ReplaySource {
        ReplaySource {
            frames: frames.into(),
        }
    }

    pub fn push(&mut self, frame: RawFrame) {
        self.frames.push_back(frame);
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        Ok(self.frames.pop_front())
    }
}
