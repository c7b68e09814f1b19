//! Provides the length-prefixed byte-string codec (§4.2). Unlike later
//! HPACK drafts, this format never Huffman-encodes literals — a plain
//! 8-bit-prefix integer length followed by the raw bytes is the only
//! representation.

use std::io::Write;

use super::integer::{decode_integer, encode_integer};
use crate::error::HdError;

/// Encodes `bytes` as an 8-bit-prefix length followed by the raw bytes.
pub fn encode_string<W: Write>(bytes: &[u8], mut dst: W) -> Result<(), HdError> {
    encode_integer(bytes.len() as u32, 0x0, 8, &mut dst)?;
    dst.write_all(bytes).map_err(|_| HdError::OutOfMemory)
}

/// Decodes a string from the start of `src`, returning a zero-copy slice
/// into `src` plus the number of bytes consumed (length prefix + payload).
///
/// The borrowed slice is valid for as long as `src` is, which is the
/// contract the inflater's callers must uphold for the duration documented
/// in §5.
pub fn decode_string_borrowed(src: &[u8]) -> Result<(&[u8], usize), HdError> {
    let (len, len_size) = decode_integer(src, 8)?;
    let len = len as usize;
    let start = len_size;
    let end = start
        .checked_add(len)
        .ok_or(HdError::Compression("string length overflow"))?;
    if end > src.len() {
        return Err(HdError::Compression("string length exceeds remaining input"));
    }
    Ok((&src[start..end], end))
}
