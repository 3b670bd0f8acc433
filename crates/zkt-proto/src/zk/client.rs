//! Client-to-server request decoding.
//!
//! The entry point is [`ClientMessage::from_payload`], which takes one
//! reassembled TCP payload and the originating client endpoint. The official
//! Java client always frames requests with an outer length word; the C client
//! sometimes elides it, so the decoder has to decide whether the leading word
//! is a length, a reserved xid, or the protocol version of a Connect.

use super::opcode::OpCode;
use super::{AUTH_XID, MAX_REQUEST_SIZE, PING_XID, SET_WATCHES_XID};
use crate::endpoint::Endpoint;
use crate::error::DecodeError;
use std::fmt;
use std::time::SystemTime;
use zkt_wire::{DEFAULT_MAXLEN, read_bool, read_buffer, read_i32, read_i64, read_string};

/// Cap on the data blob carried by Create/Create2.
pub const DATA_MAXLEN: usize = 8192;
/// Cap on the number of ACLs in a Create/Create2.
pub const ACL_COUNT_MAX: i32 = 10;
/// Cap on each of the three SetWatches path lists.
pub const PATH_LIST_MAX: i32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One access-control entry: permission bits plus an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    pub perms: i32,
    pub scheme: String,
    pub credential: String,
}

/// Per-opcode request bodies. The common fields (xid, path, watch flag)
/// live on [`ClientMessage`]; variants only carry what their trailer adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Connect {
        protocol_version: i32,
        last_zxid_seen: i64,
        timeout_ms: i32,
        session_id: i64,
        passwd: Option<Vec<u8>>,
        readonly: bool,
    },
    Ping,
    SetAuth {
        auth_type: i32,
        scheme: String,
        credential: String,
    },
    Close,
    Create {
        ephemeral: bool,
        sequence: bool,
        acls: Vec<Acl>,
    },
    Create2 {
        ephemeral: bool,
        sequence: bool,
        acls: Vec<Acl>,
    },
    Delete,
    Exists,
    GetData,
    SetData,
    GetChildren,
    GetChildren2,
    Sync,
    GetAcl,
    SetAcl,
    Check,
    SetWatches {
        relative_zxid: i64,
        data_watches: Vec<String>,
        exist_watches: Vec<String>,
        child_watches: Vec<String>,
    },
    Multi {
        op: i32,
        done: bool,
        err: i32,
    },
    Reconfig {
        joining: String,
        leaving: String,
        new_members: String,
        config_id: i64,
    },
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    /// Total length declared in the outer frame, or the payload length when
    /// the outer length was elided.
    pub size: usize,
    pub xid: i32,
    /// Empty for operations without one. SetAuth stores the synthetic path
    /// `"/<credential>"` so statistics can aggregate per auth.
    pub path: String,
    pub client: Endpoint,
    pub watch: bool,
    pub timestamp: SystemTime,
    /// Filled in by the correlator from the connection's last SetAuth.
    pub auth: Option<String>,
    pub body: RequestBody,
}

impl ClientMessage {
    pub fn opcode(&self) -> OpCode {
        match self.body {
            RequestBody::Connect { .. } => OpCode::Connect,
            RequestBody::Ping => OpCode::Ping,
            RequestBody::SetAuth { .. } => OpCode::SetAuth,
            RequestBody::Close => OpCode::Close,
            RequestBody::Create { .. } => OpCode::Create,
            RequestBody::Create2 { .. } => OpCode::Create2,
            RequestBody::Delete => OpCode::Delete,
            RequestBody::Exists => OpCode::Exists,
            RequestBody::GetData => OpCode::GetData,
            RequestBody::SetData => OpCode::SetData,
            RequestBody::GetChildren => OpCode::GetChildren,
            RequestBody::GetChildren2 => OpCode::GetChildren2,
            RequestBody::Sync => OpCode::Sync,
            RequestBody::GetAcl => OpCode::GetAcl,
            RequestBody::SetAcl => OpCode::SetAcl,
            RequestBody::Check => OpCode::Check,
            RequestBody::SetWatches { .. } => OpCode::SetWatches,
            RequestBody::Multi { .. } => OpCode::Multi,
            RequestBody::Reconfig { .. } => OpCode::Reconfig,
        }
    }

    pub fn is_write(&self) -> bool {
        self.opcode().is_write()
    }

    pub fn is_close(&self) -> bool {
        matches!(self.body, RequestBody::Close)
    }

    /// Whether the server will answer this request with a reply carrying the
    /// same xid. Close gets no reply; Connect replies carry no xid at all.
    pub fn expects_reply(&self) -> bool {
        !matches!(self.body, RequestBody::Close | RequestBody::Connect { .. })
    }

    // -----------------------------------------------------------------------
    // Decoding
    // -----------------------------------------------------------------------

    pub fn from_payload(
        payload: &[u8],
        client: Endpoint,
        timestamp: SystemTime,
    ) -> Result<ClientMessage, DecodeError> {
        let (first, after_first) = read_i32(payload, 0);
        if after_first == 0 {
            return Err(DecodeError::Truncated("request header"));
        }

        if first == 0 {
            // The C client elided the outer length; a leading zero can only
            // be the protocol version of a Connect.
            return Self::parse_connect(payload, 0, payload.len(), client, timestamp);
        }

        let size;
        let xid;
        let mut offset = after_first;
        if matches!(first, PING_XID | AUTH_XID | SET_WATCHES_XID) || first >= MAX_REQUEST_SIZE {
            // The leading word was the xid, not a length (elided frame).
            size = payload.len();
            xid = first;
        } else {
            size = first.max(0) as usize;
            let (x, next) = read_i32(payload, offset);
            if next == offset {
                return Err(DecodeError::Truncated("xid"));
            }
            offset = next;
            xid = x;
            if x == 0 || x == 1 {
                // A Connect's protocol version sits where the xid would be.
                if let Ok(connect) =
                    Self::parse_connect(payload, after_first, size, client, timestamp)
                {
                    return Ok(connect);
                }
            }
        }

        if xid < 0 && !matches!(xid, PING_XID | AUTH_XID | SET_WATCHES_XID) {
            return Err(DecodeError::InvalidXid(xid));
        }

        let (code, next) = read_i32(payload, offset);
        if next == offset {
            return Err(DecodeError::Truncated("opcode"));
        }
        offset = next;
        let op = OpCode::try_from(code)?;
        if op == OpCode::Connect {
            // Connect never travels with a request header; an explicit
            // opcode 0 is garbage.
            return Err(DecodeError::UnknownOpCode(code));
        }

        let mut path = String::new();
        if op.has_path() {
            let (p, next) = read_string(payload, offset, DEFAULT_MAXLEN)?;
            if !p.starts_with('/') {
                return Err(DecodeError::InvalidPath(p));
            }
            offset = next;
            path = p;
        }

        let mut watch = false;
        if op.reads_watch() {
            let (w, next) = read_bool(payload, offset);
            offset = next;
            watch = w;
        }

        let body = match op {
            OpCode::Ping => RequestBody::Ping,
            OpCode::Close => RequestBody::Close,
            OpCode::SetAuth => {
                let (auth_type, next) = read_i32(payload, offset);
                let (scheme, next) = read_string(payload, next, DEFAULT_MAXLEN)?;
                let (credential, _) = read_string(payload, next, DEFAULT_MAXLEN)?;
                path = format!("/{credential}");
                RequestBody::SetAuth {
                    auth_type,
                    scheme,
                    credential,
                }
            }
            OpCode::Create => {
                let (ephemeral, sequence, acls) = parse_create_trailer(payload, offset);
                RequestBody::Create {
                    ephemeral,
                    sequence,
                    acls,
                }
            }
            OpCode::Create2 => {
                let (ephemeral, sequence, acls) = parse_create_trailer(payload, offset);
                RequestBody::Create2 {
                    ephemeral,
                    sequence,
                    acls,
                }
            }
            OpCode::SetWatches => {
                let (relative_zxid, next) = read_i64(payload, offset);
                let (data_watches, next, ok) = read_path_list(payload, next);
                let mut exist_watches = Vec::new();
                let mut child_watches = Vec::new();
                if ok {
                    let (ew, next, ok) = read_path_list(payload, next);
                    exist_watches = ew;
                    if ok {
                        let (cw, _, _) = read_path_list(payload, next);
                        child_watches = cw;
                    }
                }
                RequestBody::SetWatches {
                    relative_zxid,
                    data_watches,
                    exist_watches,
                    child_watches,
                }
            }
            OpCode::Multi => {
                // Only the first sub-operation header; the nested operations
                // are not decoded.
                let (op, next) = read_i32(payload, offset);
                let (done, next) = read_bool(payload, next);
                let (err, _) = read_i32(payload, next);
                RequestBody::Multi { op, done, err }
            }
            OpCode::Reconfig => {
                let (joining, next) = read_string(payload, offset, DEFAULT_MAXLEN)?;
                let (leaving, next) = read_string(payload, next, DEFAULT_MAXLEN)?;
                let (new_members, next) = read_string(payload, next, DEFAULT_MAXLEN)?;
                let (config_id, _) = read_i64(payload, next);
                RequestBody::Reconfig {
                    joining,
                    leaving,
                    new_members,
                    config_id,
                }
            }
            OpCode::Delete => RequestBody::Delete,
            OpCode::Exists => RequestBody::Exists,
            OpCode::GetData => RequestBody::GetData,
            OpCode::SetData => RequestBody::SetData,
            OpCode::GetChildren => RequestBody::GetChildren,
            OpCode::GetChildren2 => RequestBody::GetChildren2,
            OpCode::Sync => RequestBody::Sync,
            OpCode::GetAcl => RequestBody::GetAcl,
            OpCode::SetAcl => RequestBody::SetAcl,
            OpCode::Check => RequestBody::Check,
            OpCode::Connect => unreachable!("rejected above"),
        };

        Ok(ClientMessage {
            size,
            xid,
            path,
            client,
            watch,
            timestamp,
            auth: None,
            body,
        })
    }

    /// Parse a Connect body starting at `offset`. A Connect is exactly
    /// `protocol_version, last_zxid, timeout, session_id, passwd[, readonly]`;
    /// leftover bytes mean the caller misidentified a regular request.
    fn parse_connect(
        payload: &[u8],
        offset: usize,
        size: usize,
        client: Endpoint,
        timestamp: SystemTime,
    ) -> Result<ClientMessage, DecodeError> {
        let (protocol_version, offset) = read_i32(payload, offset);
        if protocol_version != 0 && protocol_version != 1 {
            return Err(DecodeError::InvalidProtocolVersion(protocol_version));
        }
        let (last_zxid_seen, offset) = read_i64(payload, offset);
        let (timeout_ms, offset) = read_i32(payload, offset);
        let (session_id, offset) = read_i64(payload, offset);
        let (passwd, offset) = read_buffer(payload, offset, DEFAULT_MAXLEN);
        let (readonly, offset) = read_bool(payload, offset);
        if offset != payload.len() {
            return Err(DecodeError::Truncated("connect body"));
        }
        Ok(ClientMessage {
            size,
            xid: 0,
            path: String::new(),
            client,
            watch: false,
            timestamp,
            auth: None,
            body: RequestBody::Connect {
                protocol_version,
                last_zxid_seen,
                timeout_ms,
                session_id,
                passwd,
                readonly,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Trailer helpers
// ---------------------------------------------------------------------------

/// Read the Create/Create2 trailer: data blob, ACL vector, flags word.
/// Any malformation stops the parse and reports no ACLs with both flags
/// false; the caps are the policy.
fn parse_create_trailer(payload: &[u8], offset: usize) -> (bool, bool, Vec<Acl>) {
    let abandoned = (false, false, Vec::new());

    let (data, after_data) = read_buffer(payload, offset, DATA_MAXLEN);
    if data.is_none() && after_data == offset {
        // Data blob over its cap; the rest of the trailer is unreachable.
        return abandoned;
    }

    let (count, mut offset) = read_i32(payload, after_data);
    if offset == after_data || count < 0 || count > ACL_COUNT_MAX {
        return abandoned;
    }

    let mut acls = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (perms, next) = read_i32(payload, offset);
        if next == offset {
            return abandoned;
        }
        let Ok((scheme, next)) = read_string(payload, next, DEFAULT_MAXLEN) else {
            return abandoned;
        };
        let Ok((credential, next)) = read_string(payload, next, DEFAULT_MAXLEN) else {
            return abandoned;
        };
        acls.push(Acl {
            perms,
            scheme,
            credential,
        });
        offset = next;
    }

    let (flags, _) = read_i32(payload, offset);
    (flags & 0x1 != 0, flags & 0x2 != 0, acls)
}

/// Read one bounded SetWatches path list. Returns the entries parsed so far,
/// the new offset, and whether the list was read in full; a failed list keeps
/// its partial contents.
fn read_path_list(payload: &[u8], offset: usize) -> (Vec<String>, usize, bool) {
    let (count, mut offset2) = read_i32(payload, offset);
    if offset2 == offset || count < 0 || count > PATH_LIST_MAX {
        return (Vec::new(), offset2, false);
    }
    let mut list = Vec::with_capacity(count as usize);
    for _ in 0..count {
        match read_string(payload, offset2, DEFAULT_MAXLEN) {
            Ok((path, next)) => {
                if next == offset2 {
                    return (list, offset2, false);
                }
                list.push(path);
                offset2 = next;
            }
            Err(_) => return (list, offset2, false),
        }
    }
    (list, offset2, true)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.body {
            RequestBody::Connect {
                session_id,
                timeout_ms,
                readonly,
                ..
            } => write!(
                f,
                "ConnectRequest(size={}, session=0x{:x}, timeout={}ms, readonly={}, client={})",
                self.size, session_id, timeout_ms, readonly, self.client
            ),
            RequestBody::SetWatches {
                data_watches,
                exist_watches,
                child_watches,
                ..
            } => write!(
                f,
                "SetWatchesRequest(size={}, xid={}, data={}, exist={}, child={}, client={})",
                self.size,
                self.xid,
                data_watches.len(),
                exist_watches.len(),
                child_watches.len(),
                self.client
            ),
            _ => write!(
                f,
                "{}Request(size={}, xid={}, path={}, watch={}, client={})",
                self.opcode(),
                self.size,
                self.xid,
                self.path,
                self.watch,
                self.client
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn client() -> Endpoint {
        Endpoint::v4(10, 0, 0, 7, 45000)
    }

    fn string(s: &str) -> Vec<u8> {
        let mut out = (s.len() as i32).to_be_bytes().to_vec();
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn buffer(bytes: &[u8]) -> Vec<u8> {
        let mut out = (bytes.len() as i32).to_be_bytes().to_vec();
        out.extend_from_slice(bytes);
        out
    }

    /// Frame a request body with the outer length word.
    fn framed(body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as i32).to_be_bytes().to_vec();
        out.extend_from_slice(body);
        out
    }

    fn decode(payload: &[u8]) -> Result<ClientMessage, DecodeError> {
        ClientMessage::from_payload(payload, client(), SystemTime::UNIX_EPOCH)
    }

    fn connect_body(protocol_version: i32) -> Vec<u8> {
        let mut body = protocol_version.to_be_bytes().to_vec();
        body.extend_from_slice(&0x500_i64.to_be_bytes()); // last zxid seen
        body.extend_from_slice(&30_000_i32.to_be_bytes()); // timeout
        body.extend_from_slice(&0x1234_i64.to_be_bytes()); // session id
        body.extend_from_slice(&buffer(&[0u8; 16])); // passwd
        body.push(1); // readonly
        body
    }

    #[test]
    fn get_data_with_watch() {
        let mut body = 15_i32.to_be_bytes().to_vec();
        body.extend_from_slice(&4_i32.to_be_bytes());
        body.extend_from_slice(&string("/config/topics"));
        body.push(1);
        let payload = framed(&body);

        let msg = decode(&payload).unwrap();
        assert_eq!(msg.opcode(), OpCode::GetData);
        assert_eq!(msg.xid, 15);
        assert_eq!(msg.path, "/config/topics");
        assert!(msg.watch);
        assert!(!msg.is_write());
        // The declared outer length is preserved.
        assert_eq!(msg.size, body.len());
    }

    #[test]
    fn framed_connect() {
        let payload = framed(&connect_body(0));
        let msg = decode(&payload).unwrap();
        assert_eq!(msg.opcode(), OpCode::Connect);
        assert_eq!(msg.size, connect_body(0).len());
        match msg.body {
            RequestBody::Connect {
                protocol_version,
                last_zxid_seen,
                timeout_ms,
                session_id,
                passwd,
                readonly,
            } => {
                assert_eq!(protocol_version, 0);
                assert_eq!(last_zxid_seen, 0x500);
                assert_eq!(timeout_ms, 30_000);
                assert_eq!(session_id, 0x1234);
                assert_eq!(passwd, Some(vec![0u8; 16]));
                assert!(readonly);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn elided_length_connect() {
        // The C client sends the Connect body without the outer length; the
        // leading zero is the protocol version itself.
        let body = connect_body(0);
        let msg = decode(&body).unwrap();
        assert_eq!(msg.opcode(), OpCode::Connect);
        assert_eq!(msg.size, body.len());
    }

    #[test]
    fn elided_length_ping() {
        let mut payload = PING_XID.to_be_bytes().to_vec();
        payload.extend_from_slice(&11_i32.to_be_bytes());
        let msg = decode(&payload).unwrap();
        assert_eq!(msg.opcode(), OpCode::Ping);
        assert_eq!(msg.xid, PING_XID);
        assert_eq!(msg.size, payload.len());
    }

    #[test]
    fn set_auth_uses_credential_as_path() {
        let mut body = AUTH_XID.to_be_bytes().to_vec();
        body.extend_from_slice(&100_i32.to_be_bytes());
        body.extend_from_slice(&0_i32.to_be_bytes()); // auth type
        body.extend_from_slice(&string("digest"));
        body.extend_from_slice(&string("alice:secret"));
        let payload = framed(&body);

        let msg = decode(&payload).unwrap();
        assert_eq!(msg.opcode(), OpCode::SetAuth);
        assert_eq!(msg.path, "/alice:secret");
        match msg.body {
            RequestBody::SetAuth { scheme, credential, .. } => {
                assert_eq!(scheme, "digest");
                assert_eq!(credential, "alice:secret");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    fn create_payload(acl_count: i32, acls: i32) -> Vec<u8> {
        let mut body = 7_i32.to_be_bytes().to_vec();
        body.extend_from_slice(&1_i32.to_be_bytes());
        body.extend_from_slice(&string("/locks/lock-"));
        body.extend_from_slice(&buffer(b"payload"));
        body.extend_from_slice(&acl_count.to_be_bytes());
        for _ in 0..acls {
            body.extend_from_slice(&31_i32.to_be_bytes());
            body.extend_from_slice(&string("world"));
            body.extend_from_slice(&string("anyone"));
        }
        body.extend_from_slice(&3_i32.to_be_bytes()); // ephemeral | sequence
        framed(&body)
    }

    #[test]
    fn create_with_acls_and_flags() {
        let msg = decode(&create_payload(1, 1)).unwrap();
        assert_eq!(msg.opcode(), OpCode::Create);
        assert_eq!(msg.path, "/locks/lock-");
        assert!(msg.is_write());
        match msg.body {
            RequestBody::Create {
                ephemeral,
                sequence,
                acls,
            } => {
                assert!(ephemeral);
                assert!(sequence);
                assert_eq!(
                    acls,
                    vec![Acl {
                        perms: 31,
                        scheme: "world".to_owned(),
                        credential: "anyone".to_owned(),
                    }]
                );
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn create_with_too_many_acls_keeps_none() {
        let msg = decode(&create_payload(11, 11)).unwrap();
        assert_eq!(msg.opcode(), OpCode::Create);
        match msg.body {
            RequestBody::Create {
                ephemeral,
                sequence,
                acls,
            } => {
                assert!(!ephemeral);
                assert!(!sequence);
                assert!(acls.is_empty());
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn set_watches_lists() {
        let mut body = SET_WATCHES_XID.to_be_bytes().to_vec();
        body.extend_from_slice(&101_i32.to_be_bytes());
        body.extend_from_slice(&0x900_i64.to_be_bytes());
        body.extend_from_slice(&2_i32.to_be_bytes());
        body.extend_from_slice(&string("/a"));
        body.extend_from_slice(&string("/b"));
        body.extend_from_slice(&1_i32.to_be_bytes());
        body.extend_from_slice(&string("/c"));
        body.extend_from_slice(&0_i32.to_be_bytes());
        let payload = framed(&body);

        let msg = decode(&payload).unwrap();
        match msg.body {
            RequestBody::SetWatches {
                relative_zxid,
                data_watches,
                exist_watches,
                child_watches,
            } => {
                assert_eq!(relative_zxid, 0x900);
                assert_eq!(data_watches, vec!["/a", "/b"]);
                assert_eq!(exist_watches, vec!["/c"]);
                assert!(child_watches.is_empty());
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn set_watches_keeps_partial_lists() {
        let mut body = SET_WATCHES_XID.to_be_bytes().to_vec();
        body.extend_from_slice(&101_i32.to_be_bytes());
        body.extend_from_slice(&0_i64.to_be_bytes());
        body.extend_from_slice(&3_i32.to_be_bytes());
        body.extend_from_slice(&string("/only"));
        // The remaining two entries never arrive.
        let msg = decode(&framed(&body)).unwrap();
        match msg.body {
            RequestBody::SetWatches { data_watches, exist_watches, .. } => {
                assert_eq!(data_watches, vec!["/only"]);
                assert!(exist_watches.is_empty());
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn multi_decodes_first_header_only() {
        let mut body = 9_i32.to_be_bytes().to_vec();
        body.extend_from_slice(&14_i32.to_be_bytes());
        body.extend_from_slice(&1_i32.to_be_bytes()); // first sub-op: create
        body.push(0); // done
        body.extend_from_slice(&(-1_i32).to_be_bytes());
        body.extend_from_slice(&string("/ignored/sub/op"));
        let msg = decode(&framed(&body)).unwrap();
        assert_eq!(
            msg.body,
            RequestBody::Multi {
                op: 1,
                done: false,
                err: -1
            }
        );
        assert!(msg.is_write());
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let mut body = 5_i32.to_be_bytes().to_vec();
        body.extend_from_slice(&77_i32.to_be_bytes());
        assert_eq!(decode(&framed(&body)), Err(DecodeError::UnknownOpCode(77)));
    }

    #[test]
    fn invalid_negative_xid_is_rejected() {
        let mut body = (-6_i32).to_be_bytes().to_vec();
        body.extend_from_slice(&4_i32.to_be_bytes());
        body.extend_from_slice(&string("/x"));
        assert_eq!(decode(&framed(&body)), Err(DecodeError::InvalidXid(-6)));
    }

    #[test]
    fn path_must_be_absolute() {
        let mut body = 3_i32.to_be_bytes().to_vec();
        body.extend_from_slice(&4_i32.to_be_bytes());
        body.extend_from_slice(&string("relative"));
        assert_eq!(
            decode(&framed(&body)),
            Err(DecodeError::InvalidPath("relative".to_owned()))
        );
    }

    #[test]
    fn oversized_path_fails_loudly() {
        let mut body = 3_i32.to_be_bytes().to_vec();
        body.extend_from_slice(&4_i32.to_be_bytes());
        let long = format!("/{}", "a".repeat(2000));
        body.extend_from_slice(&string(&long));
        assert!(matches!(
            decode(&framed(&body)),
            Err(DecodeError::Wire(_))
        ));
    }
}
