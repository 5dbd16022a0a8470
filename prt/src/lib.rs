//! PRT - Streaming Particle File Reader and Writer
//!
//! This library reads and writes PRT particle files: a self-describing
//! header followed by a zlib-compressed stream of fixed-size particle
//! records.
//!
//! ## Architecture
//!
//! PRT separates format definitions from I/O:
//!
//! - **prt-core**: Type registry, conversions, layouts, metadata values and
//!   header records (no I/O)
//! - **prt**: Header codec, compression adapters and the particle streams
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prt::{ParticleReader, ParticleWriter, PrimitiveType};
//!
//! fn example() -> prt::Result<()> {
//!     let mut builder = ParticleWriter::builder();
//!     let position = builder.bind::<f32>("Position", 3)?;
//!     let color = builder.bind_as::<f32>("Color", 3, PrimitiveType::Float16)?;
//!     let mut writer = builder.create("particles_0001.prt")?;
//!
//!     for i in 0..100 {
//!         writer.set(&position, &[i as f32, 0.0, 0.0]);
//!         writer.set(&color, &[1.0, 0.5, 0.0]);
//!         writer.write_next_particle()?;
//!     }
//!     writer.close()?;
//!
//!     let mut reader = ParticleReader::open_file("particles_0001.prt")?;
//!     let position = reader.bind::<f64>("Position", 3)?;
//!     while reader.read_next_particle()? {
//!         println!("{:?}", reader.value(&position));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Lossless binding**: Channels bind to any type they widen into
//! - **Forward compatibility**: Unknown header fields are skipped
//! - **Bounding boxes**: Computed automatically from `Position`
//! - **Memory-mapped input** (`mmap`): Read files through `memmap2`
//! - **Summaries** (`serde`): Describe a file as JSON

// Re-export core format definitions
pub use prt_core::{
    // Type system
    convert_slice, get_converter, is_compatible, parse_data_type, ConvertFn, Element,
    PrimitiveType, TransformKind,
    // Layout and metadata
    Channel, Layout, MetaDisplay, MetaValue,
    // Error handling
    ErrorCategory, PrtError,
};

// Implementation modules
pub mod binding;
mod compression;
pub mod config;
pub mod error;
pub mod header;
pub mod reader;
pub mod standard;
#[cfg(feature = "serde")]
pub mod summary;
pub mod writer;

// Public exports
pub use binding::Binding;
pub use config::StreamConfig;
pub use error::{Error, Result};
pub use header::Metadata;
pub use reader::ParticleReader;
pub use standard::{BoundBox, CoordinateSystem, DistanceUnit};
#[cfg(feature = "serde")]
pub use summary::FileSummary;
pub use writer::{ParticleWriter, ParticleWriterBuilder};
