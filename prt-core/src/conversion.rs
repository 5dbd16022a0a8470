//! Runtime conversion between registry types
//!
//! Channels are stored in the file with one type and bound by the caller
//! with another. The conversion matrix provides an array-copy-with-cast
//! function for every pair of registry types, and a predicate that rejects
//! pairs where the conversion could lose information.
//!
//! Buffers handed to a [`ConvertFn`] are raw byte views in native byte
//! order. Element access is unaligned, so record buffers can be sliced at
//! any channel offset.

use crate::format::PrimitiveType;
use crate::traits::Element;
use half::f16;

/// Copies `arity` elements from `src` into `dst`, casting each one
///
/// Both slices must hold at least `arity` elements of their respective
/// types; shorter slices panic.
pub type ConvertFn = fn(dst: &mut [u8], src: &[u8], arity: usize);

/// Check whether converting `src` elements into `dest` elements is lossless
///
/// - floats convert freely between each other, including float16
/// - signed to signed needs a destination at least as wide
/// - unsigned to unsigned needs a destination at least as wide
/// - unsigned to signed needs a strictly wider destination
pub const fn is_compatible(dest: PrimitiveType, src: PrimitiveType) -> bool {
    if src.is_float() {
        return dest.is_float();
    }
    if dest.is_float() {
        return false;
    }
    if src.is_signed() {
        return dest.is_signed() && dest.size_bytes() >= src.size_bytes();
    }
    if dest.is_signed() {
        dest.size_bytes() > src.size_bytes()
    } else {
        dest.size_bytes() >= src.size_bytes()
    }
}

/// Get the function that converts arrays of `src` into arrays of `dest`
///
/// When the types match the returned function is a plain byte copy.
/// Conversions touching float16 go through float32.
pub fn get_converter(dest: PrimitiveType, src: PrimitiveType) -> ConvertFn {
    if dest == src {
        return raw_copy(dest);
    }
    match dest {
        PrimitiveType::Int8 => converter_into::<i8>(src),
        PrimitiveType::Int16 => converter_into::<i16>(src),
        PrimitiveType::Int32 => converter_into::<i32>(src),
        PrimitiveType::Int64 => converter_into::<i64>(src),
        PrimitiveType::UInt8 => converter_into::<u8>(src),
        PrimitiveType::UInt16 => converter_into::<u16>(src),
        PrimitiveType::UInt32 => converter_into::<u32>(src),
        PrimitiveType::UInt64 => converter_into::<u64>(src),
        PrimitiveType::Float16 => converter_into::<f16>(src),
        PrimitiveType::Float32 => converter_into::<f32>(src),
        PrimitiveType::Float64 => converter_into::<f64>(src),
    }
}

/// Convert a typed slice into another typed slice of the same length
///
/// Convenience wrapper over [`get_converter`]; panics if `dst` is shorter
/// than `src`.
pub fn convert_slice<D: Element, S: Element>(dst: &mut [D], src: &[S]) {
    let convert = get_converter(D::TYPE, S::TYPE);
    convert(
        bytemuck::cast_slice_mut(dst),
        bytemuck::cast_slice(src),
        src.len(),
    );
}

fn raw_copy(ty: PrimitiveType) -> ConvertFn {
    match ty.size_bytes() {
        1 => copy_bytes::<1>,
        2 => copy_bytes::<2>,
        4 => copy_bytes::<4>,
        _ => copy_bytes::<8>,
    }
}

fn copy_bytes<const SIZE: usize>(dst: &mut [u8], src: &[u8], arity: usize) {
    let len = SIZE * arity;
    dst[..len].copy_from_slice(&src[..len]);
}

fn convert_array<D, S>(dst: &mut [u8], src: &[u8], arity: usize)
where
    D: Element + CastFrom<S>,
    S: Element,
{
    let dst_size = core::mem::size_of::<D>();
    let src_size = core::mem::size_of::<S>();

    let dst = dst[..dst_size * arity].chunks_exact_mut(dst_size);
    let src = src[..src_size * arity].chunks_exact(src_size);
    for (out, input) in dst.zip(src) {
        let value: S = bytemuck::pod_read_unaligned(input);
        out.copy_from_slice(bytemuck::bytes_of(&D::cast_from(value)));
    }
}

fn converter_into<D: CastFromAll>(src: PrimitiveType) -> ConvertFn {
    match src {
        PrimitiveType::Int8 => convert_array::<D, i8>,
        PrimitiveType::Int16 => convert_array::<D, i16>,
        PrimitiveType::Int32 => convert_array::<D, i32>,
        PrimitiveType::Int64 => convert_array::<D, i64>,
        PrimitiveType::UInt8 => convert_array::<D, u8>,
        PrimitiveType::UInt16 => convert_array::<D, u16>,
        PrimitiveType::UInt32 => convert_array::<D, u32>,
        PrimitiveType::UInt64 => convert_array::<D, u64>,
        PrimitiveType::Float16 => convert_array::<D, f16>,
        PrimitiveType::Float32 => convert_array::<D, f32>,
        PrimitiveType::Float64 => convert_array::<D, f64>,
    }
}

/// Element-wise numeric cast, `as` semantics
trait CastFrom<S> {
    fn cast_from(value: S) -> Self;
}

trait CastFromAll:
    Element
    + CastFrom<i8>
    + CastFrom<i16>
    + CastFrom<i32>
    + CastFrom<i64>
    + CastFrom<u8>
    + CastFrom<u16>
    + CastFrom<u32>
    + CastFrom<u64>
    + CastFrom<f16>
    + CastFrom<f32>
    + CastFrom<f64>
{
}

impl<T> CastFromAll for T where
    T: Element
        + CastFrom<i8>
        + CastFrom<i16>
        + CastFrom<i32>
        + CastFrom<i64>
        + CastFrom<u8>
        + CastFrom<u16>
        + CastFrom<u32>
        + CastFrom<u64>
        + CastFrom<f16>
        + CastFrom<f32>
        + CastFrom<f64>
{
}

macro_rules! impl_cast_from {
    ($($ty:ty),*) => {
        impl_cast_from!(@each [$($ty),*] [$($ty),*]);
    };
    (@each [$($dst:ty),*] $srcs:tt) => {
        $( impl_cast_from!(@one $dst, $srcs); )*
    };
    (@one $dst:ty, [$($src:ty),*]) => {
        $(
            impl CastFrom<$src> for $dst {
                #[inline]
                fn cast_from(value: $src) -> Self {
                    value as $dst
                }
            }
        )*
    };
}

impl_cast_from!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

// half only converts through f32
macro_rules! impl_half_cast {
    ($($ty:ty),*) => {
        $(
            impl CastFrom<f16> for $ty {
                #[inline]
                fn cast_from(value: f16) -> Self {
                    value.to_f32() as $ty
                }
            }

            impl CastFrom<$ty> for f16 {
                #[inline]
                fn cast_from(value: $ty) -> Self {
                    f16::from_f32(value as f32)
                }
            }
        )*
    };
}

impl_half_cast!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl CastFrom<f16> for f16 {
    #[inline]
    fn cast_from(value: f16) -> Self {
        value
    }
}
