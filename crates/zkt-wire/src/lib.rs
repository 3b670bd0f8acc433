//! Big-endian primitive reads for the ZooKeeper wire protocols.
//!
//! Every function here is total over `(bytes, offset)` and returns the value
//! together with the new offset. Fixed-width reads fail *softly*: when the
//! buffer is too short they return a zero value and leave the offset alone,
//! so callers can validate the next step instead of unwinding. Length-prefixed
//! reads fail *loudly* when a declared length exceeds its cap, because a
//! corrupt length would otherwise send the parser scanning far into the next
//! frame. After a [`WireError::StringTooLong`] the returned offset must not
//! be trusted.

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

/// Default cap for length-prefixed strings and buffers.
pub const DEFAULT_MAXLEN: usize = 1024;

/// Placeholder emitted when length-prefixed bytes are not valid UTF-8.
pub const UNREADABLE: &str = "unreadable";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("declared length {length} exceeds cap {max}")]
    StringTooLong { length: i32, max: usize },
}

// ---------------------------------------------------------------------------
// Fixed-width reads (soft failure)
// ---------------------------------------------------------------------------

/// Read a big-endian i32. Returns `(0, offset)` when fewer than 4 bytes remain.
pub fn read_i32(data: &[u8], offset: usize) -> (i32, usize) {
    match data.get(offset..offset + 4) {
        Some(bytes) => (BigEndian::read_i32(bytes), offset + 4),
        None => (0, offset),
    }
}

/// Read a big-endian i64. Returns `(0, offset)` when fewer than 8 bytes remain.
pub fn read_i64(data: &[u8], offset: usize) -> (i64, usize) {
    match data.get(offset..offset + 8) {
        Some(bytes) => (BigEndian::read_i64(bytes), offset + 8),
        None => (0, offset),
    }
}

/// Read a single-byte boolean. Only the value `1` is true; anything else,
/// including a missing byte, is false.
pub fn read_bool(data: &[u8], offset: usize) -> (bool, usize) {
    match data.get(offset) {
        Some(&b) => (b == 1, offset + 1),
        None => (false, offset),
    }
}

// ---------------------------------------------------------------------------
// Length-prefixed reads (loud failure on cap overflow)
// ---------------------------------------------------------------------------

/// Read a length-prefixed UTF-8 string.
///
/// A negative length yields an empty string with the offset reset to where
/// the length word started. A length above `maxlen` is an error. When the
/// buffer holds fewer bytes than declared, the available prefix is decoded
/// and the offset still advances by the declared length; subsequent reads
/// then fail softly at the end of the buffer.
pub fn read_string(data: &[u8], offset: usize, maxlen: usize) -> Result<(String, usize), WireError> {
    let (length, after_len) = read_i32(data, offset);
    if length < 0 {
        return Ok((String::new(), offset));
    }
    let length = length as usize;
    if length > maxlen {
        return Err(WireError::StringTooLong {
            length: length as i32,
            max: maxlen,
        });
    }
    let end = (after_len + length).min(data.len());
    let raw = data.get(after_len..end).unwrap_or(&[]);
    let text = match std::str::from_utf8(raw) {
        Ok(s) => s.to_owned(),
        Err(_) => UNREADABLE.to_owned(),
    };
    Ok((text, after_len + length))
}

/// Read a length-prefixed byte buffer.
///
/// A negative length is a null buffer: `None`, offset past the length word.
/// A length above `maxlen` is an overflow: `None`, offset unchanged.
pub fn read_buffer(data: &[u8], offset: usize, maxlen: usize) -> (Option<Vec<u8>>, usize) {
    let (length, after_len) = read_i32(data, offset);
    if after_len == offset {
        return (None, offset);
    }
    if length < 0 {
        return (None, after_len);
    }
    let length = length as usize;
    if length > maxlen {
        return (None, offset);
    }
    let end = (after_len + length).min(data.len());
    let raw = data.get(after_len..end).unwrap_or(&[]).to_vec();
    (Some(raw), after_len + length)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
