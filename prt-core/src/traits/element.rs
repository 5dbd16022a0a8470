//! Element type constraints for PRT data
//!
//! This module maps Rust numeric types onto the PRT type registry so that
//! user buffers can be bound to channels and metadata can be read back as
//! typed slices.

use crate::format::PrimitiveType;
use half::f16;

mod sealed {
    pub trait Sealed {}
}

/// Trait for Rust types that correspond to a PRT primitive type
///
/// This trait defines the requirements for types that can be stored in
/// channels and numeric metadata. All element types must be:
/// - Pod: Any bit pattern is valid and the type can be viewed as bytes
/// - PartialEq: Can be compared for equality
///
/// The trait is sealed; the eleven implementations below are the whole
/// registry.
pub trait Element: bytemuck::Pod + PartialEq + sealed::Sealed {
    /// The registry entry for this type
    const TYPE: PrimitiveType;

    /// Get the size in bytes of this element type
    fn size_bytes() -> usize {
        core::mem::size_of::<Self>()
    }
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Element for $ty {
                const TYPE: PrimitiveType = PrimitiveType::$variant;
            }
        )*
    };
}

impl_element! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f16 => Float16,
    f32 => Float32,
    f64 => Float64,
}
