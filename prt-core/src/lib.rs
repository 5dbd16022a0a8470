#![no_std]

//! PRT Core - Particle File Format Definitions
//!
//! This crate provides the pure, I/O-free parts of the PRT particle format:
//! the primitive type registry, the lossless conversion matrix, channel
//! layouts, metadata values and the fixed-layout header records.
//!
//! Element bytes inside records are handled in native byte order, so the
//! crate only builds for little-endian targets, matching the file format.

extern crate alloc;

#[cfg(not(target_endian = "little"))]
compile_error!("prt-core requires a little-endian target");

pub mod conversion;
pub mod error;
pub mod format;
pub mod layout;
pub mod meta_value;
pub mod text;
pub mod traits;
pub mod validation;

pub use conversion::{convert_slice, get_converter, is_compatible, ConvertFn};
pub use error::*;
pub use format::*;
pub use layout::{Channel, Layout};
pub use meta_value::{MetaDisplay, MetaValue};
pub use traits::*;
pub use validation::{is_valid_name, parse_data_type, validate_name};
