//! Particle reader
//!
//! Opening a reader parses the header, after which channels can be bound
//! and particles pulled one at a time from the compressed stream.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use prt_core::{get_converter, is_compatible, Element, Layout, MetaValue, PrtError};
use tracing::debug;

use crate::binding::{Binding, Bindings};
use crate::compression::RecordSource;
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::header::{read_header, Metadata};

/// Streaming reader over a PRT file
pub struct ParticleReader<R: Read + Seek> {
    source: RecordSource<R>,
    version: i32,
    layout: Layout,
    metadata: Metadata,
    particle_count: u64,
    particles_read: u64,
    record: Vec<u8>,
    bindings: Bindings,
    /// Set once the end of the stream has been confirmed
    finished: bool,
    poisoned: bool,
}

impl ParticleReader<File> {
    /// Open a file on disk with the default configuration
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(File::open(path)?)
    }
}

impl<R: Read + Seek> ParticleReader<R> {
    /// Parse the header of `source` with the default configuration
    pub fn open(source: R) -> Result<Self> {
        Self::open_with_config(source, StreamConfig::default())
    }

    /// Parse the header of `source`
    ///
    /// The source must be positioned at the start of the file. On failure
    /// the source is dropped.
    pub fn open_with_config(mut source: R, config: StreamConfig) -> Result<Self> {
        let header = read_header(&mut source)?;

        debug!(
            version = header.version,
            channels = header.layout.num_channels(),
            record_size = header.layout.record_size(),
            particles = header.particle_count,
            "Opened PRT stream for reading"
        );

        Ok(Self {
            source: RecordSource::new(source, &config),
            version: header.version,
            record: vec![0u8; header.layout.record_size()],
            layout: header.layout,
            metadata: header.metadata,
            particle_count: header.particle_count,
            particles_read: 0,
            bindings: Bindings::default(),
            finished: false,
            poisoned: false,
        })
    }

    /// Format version of the file
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Channel layout of the file
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of particles the file declares
    pub fn particle_count(&self) -> u64 {
        self.particle_count
    }

    /// Particles not yet read
    pub fn particles_remaining(&self) -> u64 {
        self.particle_count - self.particles_read
    }

    /// All file-level metadata, ordered by name
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_value(&self, name: &str) -> Option<&MetaValue> {
        self.metadata.get(name)
    }

    /// A text metadata entry; `None` if absent or not text
    pub fn metadata_string(&self, name: &str) -> Option<&str> {
        self.metadata.get(name)?.as_str()
    }

    /// A numeric metadata entry stored exactly as `T`
    pub fn metadata_values<T: Element>(&self, name: &str) -> Option<&[T]> {
        self.metadata.get(name)?.as_slice()
    }

    /// Bind channel `name` to a buffer of `arity` elements of `T`
    ///
    /// The channel's stored type must convert into `T` without loss and
    /// its arity must match exactly. A failed bind changes nothing.
    pub fn bind<T: Element>(&mut self, name: &str, arity: usize) -> Result<Binding<T>> {
        let channel = self
            .layout
            .get_channel(name)
            .map_err(|kind| Error::named(name, kind))?;

        if !is_compatible(T::TYPE, channel.ty) {
            return Err(Error::named(name, PrtError::IncompatibleType));
        }
        if arity != channel.arity {
            return Err(Error::named(name, PrtError::ArityMismatch));
        }

        let convert = get_converter(T::TYPE, channel.ty);
        self.bindings.insert(name, arity, channel.offset, convert)
    }

    /// Values of a bound channel from the most recent particle
    pub fn value<T: Element>(&self, binding: &Binding<T>) -> &[T] {
        self.bindings.value(binding)
    }

    /// Read the next particle into the bound buffers
    ///
    /// Returns `false` once every declared particle has been read and the
    /// stream has ended. A stream that ends early, or that still holds data
    /// after the declared count, fails with `CorruptStream`; after any
    /// failure only [`close`](Self::close) is useful.
    pub fn read_next_particle(&mut self) -> Result<bool> {
        if self.poisoned {
            return Err(PrtError::Poisoned.into());
        }
        if self.particles_read >= self.particle_count {
            if !self.finished {
                if let Err(err) = self.source.expect_end() {
                    self.poisoned = true;
                    return Err(err);
                }
                self.finished = true;
            }
            return Ok(false);
        }

        if let Err(err) = self.source.next_record(&mut self.record) {
            self.poisoned = true;
            return Err(err);
        }
        self.bindings.scatter(&self.record);
        self.particles_read += 1;
        Ok(true)
    }

    /// Release the reader, returning the underlying source
    pub fn close(self) -> R {
        debug!(
            particles_read = self.particles_read,
            compressed_bytes = self.source.total_in(),
            "Closed PRT stream"
        );
        self.source.into_inner()
    }
}

#[cfg(feature = "mmap")]
mod mmap {
    use std::fs::File;
    use std::io::Cursor;
    use std::path::Path;

    use memmap2::Mmap;

    use super::ParticleReader;
    use crate::config::StreamConfig;
    use crate::error::Result;

    impl ParticleReader<Cursor<Mmap>> {
        /// Open a file through a read-only memory map
        pub fn open_mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
            Self::open_mmap_with_config(path, StreamConfig::default())
        }

        pub fn open_mmap_with_config<P: AsRef<Path>>(path: P, config: StreamConfig) -> Result<Self> {
            let file = File::open(path)?;
            // SAFETY: The map is read-only and owned by the reader. Another
            // process truncating the file while it is open is outside what
            // this crate can guard against.
            let mmap = unsafe { Mmap::map(&file)? };
            Self::open_with_config(Cursor::new(mmap), config)
        }
    }
}
