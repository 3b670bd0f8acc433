//! The ZooKeeper client-server protocol.

mod client;
mod opcode;
mod server;

pub use client::{Acl, ClientMessage, RequestBody, ACL_COUNT_MAX, DATA_MAXLEN, PATH_LIST_MAX};
pub use opcode::OpCode;
pub use server::{Reply, ReplyBody, ServerMessage, WatchEvent};

/// Reserved xid for ping requests and their replies.
pub const PING_XID: i32 = -2;
/// Reserved xid for auth requests and their replies.
pub const AUTH_XID: i32 = -4;
/// Reserved xid for set-watches requests and their replies.
pub const SET_WATCHES_XID: i32 = -8;
/// Reserved xid marking asynchronous watch events.
pub const WATCH_EVENT_XID: i32 = -1;

/// Requests at or above this size are assumed not to be requests at all:
/// a leading word this large is really the xid of a request whose outer
/// length the C client elided. A real request exactly at this size would be
/// misread as a reserved xid; accepted limitation.
pub const MAX_REQUEST_SIZE: i32 = 100 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Four-letter admin words
// ---------------------------------------------------------------------------

/// Four-ASCII-byte admin probes sent over the client port, outside the
/// binary protocol. Seeing one puts the connection in four-letter mode until
/// the single-packet response comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FourLetterWord {
    Conf,
    Cons,
    Crst,
    Dump,
    Envi,
    Ruok,
    Srst,
    Srvr,
    Stat,
    Wchs,
    Wchc,
    Wchp,
    Mntr,
}

impl FourLetterWord {
    pub fn as_str(self) -> &'static str {
        match self {
            FourLetterWord::Conf => "conf",
            FourLetterWord::Cons => "cons",
            FourLetterWord::Crst => "crst",
            FourLetterWord::Dump => "dump",
            FourLetterWord::Envi => "envi",
            FourLetterWord::Ruok => "ruok",
            FourLetterWord::Srst => "srst",
            FourLetterWord::Srvr => "srvr",
            FourLetterWord::Stat => "stat",
            FourLetterWord::Wchs => "wchs",
            FourLetterWord::Wchc => "wchc",
            FourLetterWord::Wchp => "wchp",
            FourLetterWord::Mntr => "mntr",
        }
    }

    /// Recognize a four-letter probe. Only exact 4-byte payloads match.
    pub fn from_payload(payload: &[u8]) -> Option<FourLetterWord> {
        match payload {
            b"conf" => Some(FourLetterWord::Conf),
            b"cons" => Some(FourLetterWord::Cons),
            b"crst" => Some(FourLetterWord::Crst),
            b"dump" => Some(FourLetterWord::Dump),
            b"envi" => Some(FourLetterWord::Envi),
            b"ruok" => Some(FourLetterWord::Ruok),
            b"srst" => Some(FourLetterWord::Srst),
            b"srvr" => Some(FourLetterWord::Srvr),
            b"stat" => Some(FourLetterWord::Stat),
            b"wchs" => Some(FourLetterWord::Wchs),
            b"wchc" => Some(FourLetterWord::Wchc),
            b"wchp" => Some(FourLetterWord::Wchp),
            b"mntr" => Some(FourLetterWord::Mntr),
            _ => None,
        }
    }
}

impl std::fmt::Display for FourLetterWord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
