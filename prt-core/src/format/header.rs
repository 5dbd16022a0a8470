//! Fixed-layout records of the PRT header
//!
//! This module contains the byte layouts of the main file header, the
//! table headers, and the per-entry headers of the metadata and channel
//! tables. All integers are little-endian. Streaming the variable parts
//! (metadata payloads, unknown trailers) is left to the I/O layer.

use alloc::borrow::Cow;
use alloc::string::String;

use super::constants::{MAGIC, NAME_FIELD_SIZE, SIGNATURE};
use super::{PrimitiveType, TransformKind};
use crate::{PrtError, Result};

#[inline]
fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[inline]
fn read_i64(bytes: &[u8], at: usize) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    i64::from_le_bytes(raw)
}

/// Encode a name into a NUL-padded 32-byte field
///
/// Names must already be validated; longer input is truncated so that the
/// field always keeps a terminator.
pub fn encode_name(name: &str) -> [u8; NAME_FIELD_SIZE] {
    let mut field = [0u8; NAME_FIELD_SIZE];
    let len = name.len().min(NAME_FIELD_SIZE - 1);
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
    field
}

/// Decode a NUL-padded name field, stopping at the first NUL
///
/// Bytes that are not UTF-8 become U+FFFD, so the result is borrowed only
/// when the field was valid.
pub fn decode_name(field: &[u8; NAME_FIELD_SIZE]) -> Cow<'_, str> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(NAME_FIELD_SIZE);
    String::from_utf8_lossy(&field[..end])
}

/// Main PRT file header (56 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic bytes
    pub magic: [u8; 8],
    /// Length of the header up to the reserved value
    pub header_length: i32,
    /// NUL-padded signature string
    pub signature: [u8; NAME_FIELD_SIZE],
    /// Format version
    pub version: i32,
    /// Number of particles, -1 while the writer is still open
    pub particle_count: i64,
}

impl FileHeader {
    /// Size of the fixed header in bytes
    pub const SIZE: usize = 56;

    /// Byte offset of the particle count field
    pub const PARTICLE_COUNT_OFFSET: u64 = 48;

    /// Create a header for a stream that is still being written
    pub fn new(version: i32, header_length: i32) -> Self {
        let mut signature = [0u8; NAME_FIELD_SIZE];
        signature[..SIGNATURE.len()].copy_from_slice(SIGNATURE);
        Self {
            magic: MAGIC,
            header_length,
            signature,
            version,
            particle_count: -1,
        }
    }

    /// Parse and validate the header
    ///
    /// Checks run in file order: magic, signature, then particle count.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(PrtError::InsufficientBuffer);
        }

        if bytes[0..8] != MAGIC {
            return Err(PrtError::NotAPrtFile);
        }

        let mut signature = [0u8; NAME_FIELD_SIZE];
        signature.copy_from_slice(&bytes[12..44]);
        let mut expected = [0u8; NAME_FIELD_SIZE];
        expected[..SIGNATURE.len()].copy_from_slice(SIGNATURE);
        if signature != expected {
            return Err(PrtError::NotAPrtFile);
        }

        let header = Self {
            magic: MAGIC,
            header_length: read_i32(bytes, 8),
            signature,
            version: read_i32(bytes, 44),
            particle_count: read_i64(bytes, 48),
        };

        if header.particle_count < 0 {
            return Err(PrtError::CorruptHeader);
        }
        if header.header_length < Self::SIZE as i32 {
            return Err(PrtError::CorruptHeader);
        }

        Ok(header)
    }

    /// Convert header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.header_length.to_le_bytes());
        bytes[12..44].copy_from_slice(&self.signature);
        bytes[44..48].copy_from_slice(&self.version.to_le_bytes());
        bytes[48..56].copy_from_slice(&self.particle_count.to_le_bytes());
        bytes
    }
}

/// Count and per-entry stride that precede the metadata and channel tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    /// Number of entries in the table
    pub count: i32,
    /// Declared byte span of each entry header
    pub stride: i32,
}

impl TableHeader {
    /// Size of the table header in bytes
    pub const SIZE: usize = 8;

    /// Create a new table header
    pub const fn new(count: i32, stride: i32) -> Self {
        Self { count, stride }
    }

    /// Parse from bytes, requiring a non-negative count and a stride of at
    /// least `min_stride`; `error` is reported otherwise
    pub fn from_bytes(bytes: &[u8], min_stride: usize, error: PrtError) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(PrtError::InsufficientBuffer);
        }

        let count = read_i32(bytes, 0);
        let stride = read_i32(bytes, 4);

        if count < 0 || stride < 0 || (stride as usize) < min_stride {
            return Err(error);
        }

        Ok(Self { count, stride })
    }

    /// Convert to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.stride.to_le_bytes());
        bytes
    }

    /// Bytes past the known fields that a reader must skip per entry
    pub const fn trailer_len(&self, known: usize) -> usize {
        (self.stride as usize).saturating_sub(known)
    }
}

/// Fixed part of a metadata table entry (40 bytes)
///
/// The payload of `count` elements (or `count` bytes of UTF-8 for strings)
/// follows after the entry's declared stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataEntryHeader {
    /// NUL-padded entry name
    pub name: [u8; NAME_FIELD_SIZE],
    /// Type ordinal, or the string tag
    pub type_tag: i32,
    /// Element count, or byte length including terminator for strings
    pub count: i32,
}

impl MetadataEntryHeader {
    /// Size of the known fields in bytes
    pub const SIZE: usize = 40;

    /// Parse from bytes; validates the count sign
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(PrtError::InsufficientBuffer);
        }

        let mut name = [0u8; NAME_FIELD_SIZE];
        name.copy_from_slice(&bytes[0..32]);
        let entry = Self {
            name,
            type_tag: read_i32(bytes, 32),
            count: read_i32(bytes, 36),
        };

        if entry.count < 0 {
            return Err(PrtError::CorruptMetadata);
        }

        Ok(entry)
    }

    /// Convert to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..32].copy_from_slice(&self.name);
        bytes[32..36].copy_from_slice(&self.type_tag.to_le_bytes());
        bytes[36..40].copy_from_slice(&self.count.to_le_bytes());
        bytes
    }

    /// The entry name up to its terminator
    pub fn name_str(&self) -> Cow<'_, str> {
        decode_name(&self.name)
    }
}

/// One channel table entry (44 bytes in version 1, 48 bytes after)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEntry {
    /// NUL-padded channel name
    pub name: [u8; NAME_FIELD_SIZE],
    /// Type ordinal
    pub type_ordinal: i32,
    /// Element count
    pub arity: i32,
    /// Byte offset within the record
    pub offset: i32,
    /// Transform kind ordinal
    pub transform: i32,
}

impl ChannelEntry {
    /// Size of a version 1 entry, which lacks the transform field
    pub const SIZE_V1: usize = 44;

    /// Size of the known fields in bytes
    pub const SIZE: usize = 48;

    /// Parse from bytes
    ///
    /// Without `with_transform` the entry is read in the version 1 layout
    /// and its transform is left unspecified.
    pub fn from_bytes(bytes: &[u8], with_transform: bool) -> Result<Self> {
        let needed = if with_transform { Self::SIZE } else { Self::SIZE_V1 };
        if bytes.len() < needed {
            return Err(PrtError::InsufficientBuffer);
        }

        let mut name = [0u8; NAME_FIELD_SIZE];
        name.copy_from_slice(&bytes[0..32]);
        // Older writers did not always terminate the name
        name[NAME_FIELD_SIZE - 1] = 0;

        Ok(Self {
            name,
            type_ordinal: read_i32(bytes, 32),
            arity: read_i32(bytes, 36),
            offset: read_i32(bytes, 40),
            transform: if with_transform { read_i32(bytes, 44) } else { 0 },
        })
    }

    /// Convert to bytes in the current layout
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..32].copy_from_slice(&self.name);
        bytes[32..36].copy_from_slice(&self.type_ordinal.to_le_bytes());
        bytes[36..40].copy_from_slice(&self.arity.to_le_bytes());
        bytes[40..44].copy_from_slice(&self.offset.to_le_bytes());
        bytes[44..48].copy_from_slice(&self.transform.to_le_bytes());
        bytes
    }

    /// The channel name up to its terminator
    pub fn name_str(&self) -> Cow<'_, str> {
        decode_name(&self.name)
    }

    /// Validate the numeric fields and decode them
    pub fn decode(&self) -> Result<(PrimitiveType, usize, usize, TransformKind)> {
        let ty = PrimitiveType::from_ordinal(self.type_ordinal).ok_or(PrtError::CorruptChannel)?;
        if self.arity < 0 || self.offset < 0 {
            return Err(PrtError::CorruptChannel);
        }
        let transform = TransformKind::from_ordinal(self.transform).ok_or(PrtError::CorruptChannel)?;
        Ok((ty, self.arity as usize, self.offset as usize, transform))
    }
}
