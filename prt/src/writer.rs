//! Particle writer
//!
//! A writer is configured through [`ParticleWriterBuilder`]: metadata is
//! added and channels are bound, which also builds the layout. Opening the
//! builder writes the header with placeholders for the particle count and
//! the bounding box. Closing finishes the compressed stream and patches
//! both placeholders. Dropping an open writer closes it as well.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use prt_core::format::constants::metadata::{BOUND_BOX, POSITION_CHANNEL};
use prt_core::{
    get_converter, is_compatible, validate_name, Element, Layout, MetaValue, PrimitiveType,
    PrtError, TransformKind,
};
use tracing::{debug, warn};

use crate::binding::{Binding, Bindings};
use crate::compression::RecordSink;
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::header::{patch_header, write_header, Metadata, Placeholders};

/// Collects the layout and metadata of a file before it is opened
#[derive(Default)]
pub struct ParticleWriterBuilder {
    layout: Layout,
    metadata: Metadata,
    bindings: Bindings,
    config: StreamConfig,
}

impl ParticleWriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for the opened stream
    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Layout built by the bindings so far
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Bind a new channel stored as `T`
    pub fn bind<T: Element>(&mut self, name: &str, arity: usize) -> Result<Binding<T>> {
        self.bind_channel(name, arity, T::TYPE, TransformKind::Unspecified)
    }

    /// Bind a new channel that holds `T` in memory and `dest` on disk
    ///
    /// `T` must convert into `dest` without loss; float types convert
    /// freely, so a float32 buffer can be stored as float16.
    pub fn bind_as<T: Element>(
        &mut self,
        name: &str,
        arity: usize,
        dest: PrimitiveType,
    ) -> Result<Binding<T>> {
        self.bind_channel(name, arity, dest, TransformKind::Unspecified)
    }

    /// Bind a new channel with an explicit transform kind
    pub fn bind_channel<T: Element>(
        &mut self,
        name: &str,
        arity: usize,
        dest: PrimitiveType,
        transform: TransformKind,
    ) -> Result<Binding<T>> {
        if self.bindings.is_bound(name) {
            return Err(Error::named(name, PrtError::AlreadyBound));
        }
        if !is_compatible(dest, T::TYPE) {
            return Err(Error::named(name, PrtError::IncompatibleType));
        }

        let offset = self
            .layout
            .add_channel(name, dest, arity, transform)
            .map_err(|kind| Error::named(name, kind))?
            .offset;
        let convert = get_converter(dest, T::TYPE);
        self.bindings.insert(name, arity, offset, convert)
    }

    /// Add a numeric metadata entry
    pub fn add_metadata<T: Element>(&mut self, name: &str, values: &[T]) -> Result<()> {
        self.add_metadata_value(name, MetaValue::from_values(values))
    }

    /// Add a text metadata entry
    pub fn add_metadata_string(&mut self, name: &str, text: &str) -> Result<()> {
        self.add_metadata_value(name, MetaValue::from_text(text))
    }

    /// Add a metadata entry
    ///
    /// Names follow the channel name rules and may only be used once. The
    /// `BoundBox` entry is replaced by the computed box when the layout has
    /// a float32[3] `Position` channel.
    pub fn add_metadata_value(&mut self, name: &str, value: MetaValue) -> Result<()> {
        validate_name(name).map_err(|kind| Error::named(name, kind))?;
        if value.is_empty() {
            return Err(Error::named(name, PrtError::TypeMismatch));
        }
        if self.metadata.contains_key(name) {
            return Err(Error::named(name, PrtError::DuplicateMetadata));
        }
        self.metadata.insert(name.to_owned(), value);
        Ok(())
    }

    /// Create `path` and open a writer on it
    pub fn create<P: AsRef<Path>>(self, path: P) -> Result<ParticleWriter<File>> {
        self.open(File::create(path)?)
    }

    /// Write the header to `sink` and start the particle stream
    pub fn open<W: Write + Seek>(self, mut sink: W) -> Result<ParticleWriter<W>> {
        let Self {
            layout,
            mut metadata,
            bindings,
            config,
        } = self;

        let bounds = layout
            .get_channel(POSITION_CHANNEL)
            .ok()
            .filter(|channel| channel.ty == PrimitiveType::Float32 && channel.arity == 3)
            .map(|channel| BoundsTracker::new(channel.offset));
        if bounds.is_some() {
            metadata.insert(BOUND_BOX.to_owned(), MetaValue::from_values(&[f32::NAN; 6]));
        }

        let placeholders = write_header(
            &mut sink,
            &layout,
            &metadata,
            bounds.as_ref().map(|_| BOUND_BOX),
        )?;

        debug!(
            channels = layout.num_channels(),
            record_size = layout.record_size(),
            metadata = metadata.len(),
            bound_box = bounds.is_some(),
            "Opened PRT stream for writing"
        );

        Ok(ParticleWriter {
            sink: Some(RecordSink::new(sink, &config)),
            placeholders,
            record: vec![0u8; layout.record_size()],
            layout,
            bindings,
            bounds,
            particle_count: 0,
            poisoned: false,
        })
    }
}

/// Running per-axis extrema of the Position channel
#[derive(Debug, Clone)]
struct BoundsTracker {
    offset: usize,
    min: [f32; 3],
    max: [f32; 3],
    seen: bool,
}

impl BoundsTracker {
    fn new(offset: usize) -> Self {
        Self {
            offset,
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
            seen: false,
        }
    }

    fn update(&mut self, record: &[u8]) {
        let position: [f32; 3] = bytemuck::pod_read_unaligned(&record[self.offset..self.offset + 12]);
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(position[axis]);
            self.max[axis] = self.max[axis].max(position[axis]);
        }
        self.seen = true;
    }

    /// Box as stored on disk; NaN when nothing was written
    fn to_array(&self) -> [f32; 6] {
        if !self.seen {
            return [f32::NAN; 6];
        }
        let [x0, y0, z0] = self.min;
        let [x1, y1, z1] = self.max;
        [x0, y0, z0, x1, y1, z1]
    }
}

/// Streaming writer of a PRT file
pub struct ParticleWriter<W: Write + Seek> {
    sink: Option<RecordSink<W>>,
    placeholders: Placeholders,
    layout: Layout,
    bindings: Bindings,
    record: Vec<u8>,
    bounds: Option<BoundsTracker>,
    particle_count: u64,
    poisoned: bool,
}

impl ParticleWriter<File> {
    /// Builder for a new writer
    pub fn builder() -> ParticleWriterBuilder {
        ParticleWriterBuilder::new()
    }
}

impl<W: Write + Seek> ParticleWriter<W> {
    /// Layout of the records being written
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Particles written so far
    pub fn particle_count(&self) -> u64 {
        self.particle_count
    }

    /// Buffer of a bound channel
    pub fn value<T: Element>(&self, binding: &Binding<T>) -> &[T] {
        self.bindings.value(binding)
    }

    /// Mutable buffer of a bound channel
    pub fn value_mut<T: Element>(&mut self, binding: &Binding<T>) -> &mut [T] {
        self.bindings.value_mut(binding)
    }

    /// Copy `values` into the buffer of a bound channel
    ///
    /// Panics if `values` does not have the binding's arity.
    pub fn set<T: Element>(&mut self, binding: &Binding<T>, values: &[T]) {
        self.bindings.value_mut(binding).copy_from_slice(values);
    }

    /// Gather the bound buffers into one record and compress it
    pub fn write_next_particle(&mut self) -> Result<()> {
        if self.poisoned {
            return Err(PrtError::Poisoned.into());
        }
        let Some(sink) = self.sink.as_mut() else {
            return Err(PrtError::Poisoned.into());
        };

        self.bindings.gather(&mut self.record);
        if let Err(err) = sink.push_record(&self.record) {
            self.poisoned = true;
            return Err(err);
        }
        if let Some(bounds) = self.bounds.as_mut() {
            bounds.update(&self.record);
        }
        self.particle_count += 1;
        Ok(())
    }

    /// Finish the stream, patch the header and return the sink
    pub fn close(mut self) -> Result<W> {
        self.finish()
    }

    fn finish(&mut self) -> Result<W> {
        let sink = self.sink.take().ok_or(PrtError::Poisoned)?;
        let mut inner = sink.finish()?;

        let bound_box = self.bounds.as_ref().map(BoundsTracker::to_array);
        patch_header(
            &mut inner,
            &self.placeholders,
            self.particle_count,
            bound_box.as_ref(),
        )?;

        debug!(particles = self.particle_count, "Closed PRT stream");
        Ok(inner)
    }
}

impl<W: Write + Seek> Drop for ParticleWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_some() {
            if let Err(err) = self.finish() {
                warn!(error = %err, "Failed to finalize PRT stream on drop");
            }
        }
    }
}
