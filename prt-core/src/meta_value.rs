//! Metadata values
//!
//! A [`MetaValue`] is a closed sum over the eleven registry types plus text.
//! Numeric payloads are owned, length-tracked vectors, so cloning a value is
//! a deep copy.
//!
//! ## Wire form
//!
//! Every value is stored as a 4-byte type tag, a 4-byte count, and the raw
//! payload. The tag is a [`PrimitiveType`] ordinal, or [`STRING_TAG`] for
//! text, in which case the count is the UTF-8 byte length including the
//! terminator.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use half::f16;

use crate::format::constants::STRING_TAG;
use crate::format::PrimitiveType;
use crate::text::{from_utf8_nul, to_utf8_nul};
use crate::traits::Element;
use crate::{PrtError, Result};

/// A typed metadata array or a text string
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MetaValue {
    /// No value has been assigned
    #[default]
    Empty,
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    /// Text, held without its terminator
    Text(String),
}

fn read_all<T: Element>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(core::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

impl MetaValue {
    /// Create an empty value
    pub const fn new() -> Self {
        MetaValue::Empty
    }

    /// Build a numeric value from a typed slice
    pub fn from_values<T: Element>(values: &[T]) -> Self {
        Self::collect(T::TYPE, bytemuck::cast_slice(values))
    }

    /// Build a text value
    pub fn from_text(text: &str) -> Self {
        let mut value = Self::Empty;
        value.set_string(text);
        value
    }

    /// Build a numeric value from `arity` raw native-endian elements of `ty`
    pub fn from_raw(ty: PrimitiveType, arity: usize, data: &[u8]) -> Result<Self> {
        let span = ty.span(arity).ok_or(PrtError::ValueTooLarge)?;
        if data.len() < span {
            return Err(PrtError::InsufficientBuffer);
        }
        Ok(Self::collect(ty, &data[..span]))
    }

    // `bytes` must be a whole number of elements
    fn collect(ty: PrimitiveType, bytes: &[u8]) -> Self {
        match ty {
            PrimitiveType::Int8 => MetaValue::Int8(read_all(bytes)),
            PrimitiveType::Int16 => MetaValue::Int16(read_all(bytes)),
            PrimitiveType::Int32 => MetaValue::Int32(read_all(bytes)),
            PrimitiveType::Int64 => MetaValue::Int64(read_all(bytes)),
            PrimitiveType::UInt8 => MetaValue::UInt8(bytes.to_vec()),
            PrimitiveType::UInt16 => MetaValue::UInt16(read_all(bytes)),
            PrimitiveType::UInt32 => MetaValue::UInt32(read_all(bytes)),
            PrimitiveType::UInt64 => MetaValue::UInt64(read_all(bytes)),
            PrimitiveType::Float16 => MetaValue::Float16(read_all(bytes)),
            PrimitiveType::Float32 => MetaValue::Float32(read_all(bytes)),
            PrimitiveType::Float64 => MetaValue::Float64(read_all(bytes)),
        }
    }

    /// Replace the contents with a deep copy of `arity` elements of `ty`
    ///
    /// On failure the previous value is left untouched.
    pub fn set(&mut self, ty: PrimitiveType, arity: usize, data: &[u8]) -> Result<()> {
        *self = Self::from_raw(ty, arity, data)?;
        Ok(())
    }

    /// Replace the contents with a typed slice
    pub fn set_values<T: Element>(&mut self, values: &[T]) {
        *self = Self::from_values(values);
    }

    /// Replace the contents with text; anything after an interior NUL is
    /// dropped, as it would be on disk
    pub fn set_string(&mut self, text: &str) {
        let end = text.find('\0').unwrap_or(text.len());
        *self = MetaValue::Text(String::from(&text[..end]));
    }

    /// True when no value has been assigned
    pub fn is_empty(&self) -> bool {
        matches!(self, MetaValue::Empty)
    }

    /// True for text values
    pub fn is_string(&self) -> bool {
        matches!(self, MetaValue::Text(_))
    }

    /// Element type of a numeric value
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        self.numeric_bytes().map(|(ty, _)| ty)
    }

    /// Number of elements in a numeric value; zero for text and empty values
    pub fn arity(&self) -> usize {
        self.numeric_bytes()
            .map_or(0, |(ty, bytes)| bytes.len() / ty.size_bytes())
    }

    /// Raw native-endian payload of a numeric value
    pub fn bytes(&self) -> &[u8] {
        self.numeric_bytes().map_or(&[], |(_, bytes)| bytes)
    }

    fn numeric_bytes(&self) -> Option<(PrimitiveType, &[u8])> {
        let bytes = match self {
            MetaValue::Empty | MetaValue::Text(_) => return None,
            MetaValue::Int8(v) => (PrimitiveType::Int8, bytemuck::cast_slice(v)),
            MetaValue::Int16(v) => (PrimitiveType::Int16, bytemuck::cast_slice(v)),
            MetaValue::Int32(v) => (PrimitiveType::Int32, bytemuck::cast_slice(v)),
            MetaValue::Int64(v) => (PrimitiveType::Int64, bytemuck::cast_slice(v)),
            MetaValue::UInt8(v) => (PrimitiveType::UInt8, v.as_slice()),
            MetaValue::UInt16(v) => (PrimitiveType::UInt16, bytemuck::cast_slice(v)),
            MetaValue::UInt32(v) => (PrimitiveType::UInt32, bytemuck::cast_slice(v)),
            MetaValue::UInt64(v) => (PrimitiveType::UInt64, bytemuck::cast_slice(v)),
            MetaValue::Float16(v) => (PrimitiveType::Float16, bytemuck::cast_slice(v)),
            MetaValue::Float32(v) => (PrimitiveType::Float32, bytemuck::cast_slice(v)),
            MetaValue::Float64(v) => (PrimitiveType::Float64, bytemuck::cast_slice(v)),
        };
        Some(bytes)
    }

    /// Access the elements as `T`
    ///
    /// Fails with `TypeMismatch` unless the stored type is exactly `T`; no
    /// conversion is attempted.
    pub fn get<T: Element>(&self) -> Result<&[T]> {
        match self.numeric_bytes() {
            Some((ty, bytes)) if ty == T::TYPE => {
                bytemuck::try_cast_slice(bytes).map_err(|_| PrtError::TypeMismatch)
            }
            _ => Err(PrtError::TypeMismatch),
        }
    }

    /// Like [`get`](Self::get), returning `None` on mismatch
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        self.get().ok()
    }

    /// Access a single-element value
    pub fn get_scalar<T: Element>(&self) -> Result<T> {
        match self.get::<T>()? {
            [value] => Ok(*value),
            _ => Err(PrtError::TypeMismatch),
        }
    }

    /// Access a value of exactly `N` elements
    pub fn get_array<T: Element, const N: usize>(&self) -> Result<[T; N]> {
        self.get::<T>()?
            .try_into()
            .map_err(|_| PrtError::TypeMismatch)
    }

    /// Access a text value
    pub fn get_string(&self) -> Result<&str> {
        self.as_str().ok_or(PrtError::TypeMismatch)
    }

    /// Like [`get_string`](Self::get_string), returning `None` on mismatch
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Wire type tag; `None` for an empty value, which cannot be stored
    pub fn type_tag(&self) -> Option<i32> {
        match self {
            MetaValue::Empty => None,
            MetaValue::Text(_) => Some(STRING_TAG),
            _ => self.primitive_type().map(PrimitiveType::ordinal),
        }
    }

    /// Encode the wire payload and its count
    ///
    /// Numeric payloads are the element bytes in little-endian order; text
    /// is NUL-terminated UTF-8.
    pub fn encode_payload(&self) -> Result<(i32, Vec<u8>)> {
        let (count, payload) = match self {
            MetaValue::Empty => return Err(PrtError::TypeMismatch),
            MetaValue::Text(text) => {
                let bytes = to_utf8_nul(text);
                (bytes.len(), bytes)
            }
            _ => (self.arity(), self.bytes().to_vec()),
        };
        let count = i32::try_from(count).map_err(|_| PrtError::ValueTooLarge)?;
        Ok((count, payload))
    }

    /// Payload byte length implied by a wire tag and count
    pub fn payload_len(tag: i32, count: i32) -> Result<usize> {
        let count = usize::try_from(count).map_err(|_| PrtError::CorruptMetadata)?;
        if tag == STRING_TAG {
            return Ok(count);
        }
        let ty = PrimitiveType::from_ordinal(tag).ok_or(PrtError::CorruptMetadata)?;
        ty.span(count).ok_or(PrtError::ValueTooLarge)
    }

    /// Decode a value from its wire tag, count and payload
    pub fn decode_payload(tag: i32, count: i32, payload: &[u8]) -> Result<Self> {
        let len = Self::payload_len(tag, count)?;
        if payload.len() < len {
            return Err(PrtError::InsufficientBuffer);
        }
        if tag == STRING_TAG {
            return from_utf8_nul(&payload[..len]).map(MetaValue::Text);
        }
        let ty = PrimitiveType::from_ordinal(tag).ok_or(PrtError::CorruptMetadata)?;
        Ok(Self::collect(ty, &payload[..len]))
    }

    /// Display the elements joined by `separator`
    pub fn display_with<'a>(&'a self, separator: &'a str) -> MetaDisplay<'a> {
        MetaDisplay {
            value: self,
            separator,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(text: &str) -> Self {
        MetaValue::from_text(text)
    }
}

impl From<String> for MetaValue {
    fn from(text: String) -> Self {
        MetaValue::from_text(&text)
    }
}

/// Formatter returned by [`MetaValue::display_with`]
pub struct MetaDisplay<'a> {
    value: &'a MetaValue,
    separator: &'a str,
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T], sep: &str) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl fmt::Display for MetaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = self.separator;
        match self.value {
            MetaValue::Empty => Ok(()),
            MetaValue::Text(text) => f.write_str(text),
            MetaValue::Int8(v) => write_joined(f, v, sep),
            MetaValue::Int16(v) => write_joined(f, v, sep),
            MetaValue::Int32(v) => write_joined(f, v, sep),
            MetaValue::Int64(v) => write_joined(f, v, sep),
            MetaValue::UInt8(v) => write_joined(f, v, sep),
            MetaValue::UInt16(v) => write_joined(f, v, sep),
            MetaValue::UInt32(v) => write_joined(f, v, sep),
            MetaValue::UInt64(v) => write_joined(f, v, sep),
            MetaValue::Float16(v) => write_joined(f, v, sep),
            MetaValue::Float32(v) => write_joined(f, v, sep),
            MetaValue::Float64(v) => write_joined(f, v, sep),
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_with(", ").fmt(f)
    }
}
