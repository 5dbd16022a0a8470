//! Binary format definitions for PRT files
//!
//! This module contains pure data structure definitions for the PRT wire
//! format. No I/O operations, only the byte layouts and registries.

pub mod constants;
pub mod data_type;
pub mod header;
pub mod transform;

// Re-export format definitions
pub use data_type::PrimitiveType;
pub use header::{ChannelEntry, FileHeader, MetadataEntryHeader, TableHeader};
pub use transform::TransformKind;
