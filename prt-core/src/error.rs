//! Error types for PRT operations

/// Errors that can occur while describing, encoding or decoding PRT data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrtError {
    /// Magic number or signature string did not match
    NotAPrtFile,
    /// The reserved value before the channel table was not 4
    BadReservedValue,
    /// Header fields violate structural invariants
    CorruptHeader,
    /// A channel table entry is invalid
    CorruptChannel,
    /// A metadata table entry is invalid
    CorruptMetadata,
    /// The compressed particle stream ended early or is malformed
    CorruptStream,
    /// A type ordinal does not name a registry type
    UnknownType,
    /// A channel or metadata name is not an identifier shorter than 32 bytes
    InvalidName,
    /// A channel with this name already exists in the layout
    DuplicateChannel,
    /// A metadata entry with this name already exists
    DuplicateMetadata,
    /// The transform kind does not fit the channel's type and arity
    IncompatibleTransform,
    /// No channel with the requested name
    ChannelNotFound,
    /// The conversion between the two types could lose information
    IncompatibleType,
    /// The requested arity differs from the channel's arity
    ArityMismatch,
    /// The channel has already been bound on this stream
    AlreadyBound,
    /// A metadata value was accessed as the wrong type or arity
    TypeMismatch,
    /// A byte buffer is shorter than the structure being decoded
    InsufficientBuffer,
    /// A size does not fit the 32-bit fields of the format
    ValueTooLarge,
    /// A previous particle operation failed; only close is permitted
    Poisoned,
}

/// Broad classification of a failure, used to decide how callers react
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The input is not a PRT file at all
    Format,
    /// The input claims to be PRT but violates structural invariants
    CorruptData,
    /// The caller configured a stream incorrectly
    Configuration,
    /// The underlying storage failed
    Io,
    /// The compressor or decompressor reported a failure
    Codec,
}

impl PrtError {
    /// Get the taxonomy category of this error
    pub const fn category(self) -> ErrorCategory {
        match self {
            PrtError::NotAPrtFile | PrtError::BadReservedValue => ErrorCategory::Format,
            PrtError::CorruptHeader
            | PrtError::CorruptChannel
            | PrtError::CorruptMetadata
            | PrtError::CorruptStream
            | PrtError::UnknownType
            | PrtError::InsufficientBuffer => ErrorCategory::CorruptData,
            PrtError::InvalidName
            | PrtError::DuplicateChannel
            | PrtError::DuplicateMetadata
            | PrtError::IncompatibleTransform
            | PrtError::ChannelNotFound
            | PrtError::IncompatibleType
            | PrtError::ArityMismatch
            | PrtError::AlreadyBound
            | PrtError::TypeMismatch
            | PrtError::ValueTooLarge
            | PrtError::Poisoned => ErrorCategory::Configuration,
        }
    }
}

impl core::fmt::Display for PrtError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            PrtError::NotAPrtFile => "Not a PRT file",
            PrtError::BadReservedValue => "Reserved header value is not 4",
            PrtError::CorruptHeader => "Corrupt PRT header",
            PrtError::CorruptChannel => "Corrupt channel table entry",
            PrtError::CorruptMetadata => "Corrupt metadata table entry",
            PrtError::CorruptStream => "Particle stream does not hold the declared particle count",
            PrtError::UnknownType => "Unknown data type ordinal",
            PrtError::InvalidName => "Invalid channel or metadata name",
            PrtError::DuplicateChannel => "Duplicate channel",
            PrtError::DuplicateMetadata => "Duplicate metadata entry",
            PrtError::IncompatibleTransform => "Transform kind incompatible with channel type",
            PrtError::ChannelNotFound => "Channel not found",
            PrtError::IncompatibleType => "Lossy type conversion requested",
            PrtError::ArityMismatch => "Arity mismatch",
            PrtError::AlreadyBound => "Channel already bound",
            PrtError::TypeMismatch => "Metadata value has a different type",
            PrtError::InsufficientBuffer => "Insufficient buffer space",
            PrtError::ValueTooLarge => "Value too large for the file format",
            PrtError::Poisoned => "Stream is unusable after a previous failure",
        };
        write!(f, "{msg}")
    }
}

impl core::error::Error for PrtError {}

/// Result type for PRT core operations
pub type Result<T> = core::result::Result<T, PrtError>;
