//! Error type for PRT streams
//!
//! Wraps the format errors of `prt-core` together with the failures that
//! only exist once real storage and a compressor are involved.

use prt_core::{ErrorCategory, PrtError};

/// Errors returned by readers and writers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Prt(#[from] PrtError),

    /// A format error tied to a named channel or metadata entry
    #[error("{kind}: \"{name}\"")]
    Named { name: String, kind: PrtError },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The deflate stream could not be produced or decoded
    #[error("Compression error: {0}")]
    Codec(#[source] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach a channel or metadata name to a format error
    pub(crate) fn named(name: &str, kind: PrtError) -> Self {
        Error::Named {
            name: name.to_owned(),
            kind,
        }
    }

    /// The underlying format error, if this is one
    pub fn kind(&self) -> Option<PrtError> {
        match self {
            Error::Prt(kind) | Error::Named { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Get the taxonomy category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Prt(kind) | Error::Named { kind, .. } => kind.category(),
            Error::Io(_) => ErrorCategory::Io,
            Error::Codec(_) => ErrorCategory::Codec,
            #[cfg(feature = "serde")]
            Error::Json(_) => ErrorCategory::Io,
        }
    }
}

/// Result type for PRT stream operations
pub type Result<T> = std::result::Result<T, Error>;
