//! Primitive element types of the PRT format
//!
//! Every channel and every numeric metadata value is an array of one of
//! these types. The enum discriminant is the ordinal stored on disk.

use crate::{PrtError, Result};

/// Element types supported in PRT files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(i32)]
pub enum PrimitiveType {
    /// 16-bit signed integer
    Int16 = 0,
    /// 32-bit signed integer
    Int32 = 1,
    /// 64-bit signed integer
    Int64 = 2,
    /// 16-bit IEEE half-precision float
    Float16 = 3,
    /// 32-bit floating point
    Float32 = 4,
    /// 64-bit floating point
    Float64 = 5,
    /// 16-bit unsigned integer
    UInt16 = 6,
    /// 32-bit unsigned integer
    UInt32 = 7,
    /// 64-bit unsigned integer
    UInt64 = 8,
    /// 8-bit signed integer
    Int8 = 9,
    /// 8-bit unsigned integer
    UInt8 = 10,
}

impl PrimitiveType {
    /// Number of registry types
    pub const COUNT: usize = 11;

    /// All registry types in ordinal order
    pub const ALL: [PrimitiveType; Self::COUNT] = [
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Float16,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::UInt16,
        PrimitiveType::UInt32,
        PrimitiveType::UInt64,
        PrimitiveType::Int8,
        PrimitiveType::UInt8,
    ];

    /// Convert from the on-disk ordinal
    pub const fn from_ordinal(value: i32) -> Option<Self> {
        if value < 0 || value >= Self::COUNT as i32 {
            return None;
        }
        Some(Self::ALL[value as usize])
    }

    /// Convert to the on-disk ordinal
    pub const fn ordinal(self) -> i32 {
        self as i32
    }

    /// Get the size in bytes of one element
    pub const fn size_bytes(self) -> usize {
        match self {
            PrimitiveType::Int8 | PrimitiveType::UInt8 => 1,
            PrimitiveType::Int16 | PrimitiveType::UInt16 | PrimitiveType::Float16 => 2,
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => 4,
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => 8,
        }
    }

    /// True for the three floating point types
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            PrimitiveType::Float16 | PrimitiveType::Float32 | PrimitiveType::Float64
        )
    }

    /// True for types that can hold negative values
    pub const fn is_signed(self) -> bool {
        !matches!(
            self,
            PrimitiveType::UInt8 | PrimitiveType::UInt16 | PrimitiveType::UInt32 | PrimitiveType::UInt64
        )
    }

    /// True for the integer types
    pub const fn is_integral(self) -> bool {
        !self.is_float()
    }

    /// Lowercase name as used in data type strings ("float32", "uint16", ...)
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float16 => "float16",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
        }
    }

    /// Byte span of `arity` elements, guarding against overflow
    pub const fn span(self, arity: usize) -> Option<usize> {
        self.size_bytes().checked_mul(arity)
    }
}

impl TryFrom<i32> for PrimitiveType {
    type Error = PrtError;

    fn try_from(value: i32) -> Result<Self> {
        Self::from_ordinal(value).ok_or(PrtError::UnknownType)
    }
}

impl core::str::FromStr for PrimitiveType {
    type Err = PrtError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or(PrtError::UnknownType)
    }
}

impl core::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
