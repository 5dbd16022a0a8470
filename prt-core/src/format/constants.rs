//! Format constants and magic bytes for the PRT format

/// Magic bytes at the start of every PRT file
pub const MAGIC: [u8; 8] = [0xC0, b'P', b'R', b'T', b'\r', b'\n', 0x1A, b'\n'];

/// Human readable signature embedded after the header length
pub const SIGNATURE: &[u8] = b"Extensible Particle Format";

/// Width of the fixed NUL-padded string fields
pub const NAME_FIELD_SIZE: usize = 32;

/// Version written by this implementation
pub const CURRENT_VERSION: i32 = 2;

/// First version with a metadata table and channel transform kinds
pub const METADATA_VERSION: i32 = 2;

/// Value that must precede the channel table
pub const RESERVED_VALUE: i32 = 4;

/// Tag used in place of a type ordinal for string metadata
pub const STRING_TAG: i32 = -1;

/// Default staging buffer size for the compressed stream (512 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 19;

/// Metadata format constants
pub mod metadata {
    /// Name of the automatically maintained bounding box entry
    pub const BOUND_BOX: &str = "BoundBox";

    /// Channel whose float32[3] values drive the bounding box
    pub const POSITION_CHANNEL: &str = "Position";
}
