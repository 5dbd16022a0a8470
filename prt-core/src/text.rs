//! UTF-8 text boundary
//!
//! Strings are held as `String` in memory and stored on disk as UTF-8 with a
//! trailing NUL. These two functions are the only place the conversion
//! happens.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{PrtError, Result};

/// Encode text as NUL-terminated UTF-8
///
/// Interior NUL characters end the stored string, matching what a reader
/// will see.
pub fn to_utf8_nul(text: &str) -> Vec<u8> {
    let end = text.find('\0').unwrap_or(text.len());
    let mut bytes = Vec::with_capacity(end + 1);
    bytes.extend_from_slice(&text.as_bytes()[..end]);
    bytes.push(0);
    bytes
}

/// Decode NUL-terminated UTF-8, stopping at the first NUL
///
/// A missing terminator is tolerated; invalid UTF-8 is `CorruptMetadata`.
pub fn from_utf8_nul(bytes: &[u8]) -> Result<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end])
        .map(String::from)
        .map_err(|_| PrtError::CorruptMetadata)
}
