//! Stream configuration

use flate2::Compression;
use prt_core::format::constants::DEFAULT_BUFFER_SIZE;

/// Smallest staging buffer a stream will use
pub const MIN_BUFFER_SIZE: usize = 1024;

/// Configuration shared by readers and writers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Size of the staging buffer between the compressor and storage
    pub buffer_size: usize,
    /// Deflate level used by writers; readers ignore it
    pub compression: Compression,
}

impl StreamConfig {
    /// Set the staging buffer size in bytes, clamped to at least 1 KiB
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(MIN_BUFFER_SIZE);
        self
    }

    /// Set the compression level for written files
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            compression: Compression::default(),
        }
    }
}
