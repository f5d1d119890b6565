//! # **Primitive Traits** - *Element types of `NumpyArray` leaves*
//!
//! Constrains the primitive universe of leaf buffers (`bool`, the signed and
//! unsigned integers and both float widths) and gives the kernels the
//! conversions they need without going through `f64` everywhere.

use std::fmt::{Debug, Display};

use num_traits::{Bounded, Float as NumFloat};

use crate::enums::dtype::DType;
use crate::enums::scalar::Scalar;
use crate::macros::impl_le_bytes;
use crate::structs::buffer::Buffer;
use crate::structs::variants::numpy::NumpyData;

/// Fixed-width little-endian encoding, used by `to_buffers`/`from_buffers`.
pub trait LeBytes: Copy {
    const WIDTH: usize;

    fn write_le(self, out: &mut Vec<u8>);

    /// Reads one value from the first `WIDTH` bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

impl_le_bytes!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl LeBytes for bool {
    const WIDTH: usize = 1;

    #[inline]
    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Trait for types valid as `NumpyArray` elements.
///
/// Useful when specifying `my_fn::<T: NumpyPrimitive>() {}`.
pub trait NumpyPrimitive:
    LeBytes + Default + PartialEq + PartialOrd + Debug + Display + Send + Sync + 'static
{
    const DTYPE: DType;

    /// Identity of `min`: the largest representable value (`+inf` for floats).
    const MIN_IDENTITY: Self;

    /// Identity of `max`: the smallest representable value (`-inf` for floats).
    const MAX_IDENTITY: Self;

    /// Wraps a typed buffer into the dtype-erased leaf storage.
    fn wrap(buffer: Buffer<Self>) -> NumpyData;

    fn as_f64(self) -> f64;
    fn as_i64(self) -> i64;
    fn as_u64(self) -> u64;
    fn is_nonzero(self) -> bool;

    fn from_f64(v: f64) -> Self;
    fn from_i64(v: i64) -> Self;
    fn from_u64(v: u64) -> Self;

    fn to_scalar(self) -> Scalar;
}

macro_rules! impl_numpy_int {
    ($($t:ty => $dtype:ident),*) => {
        $(
            impl NumpyPrimitive for $t {
                const DTYPE: DType = DType::$dtype;
                const MIN_IDENTITY: Self = <$t>::MAX;
                const MAX_IDENTITY: Self = <$t>::MIN;

                #[inline]
                fn wrap(buffer: Buffer<Self>) -> NumpyData {
                    NumpyData::$dtype(buffer)
                }
                #[inline]
                fn as_f64(self) -> f64 { self as f64 }
                #[inline]
                fn as_i64(self) -> i64 { self as i64 }
                #[inline]
                fn as_u64(self) -> u64 { self as u64 }
                #[inline]
                fn is_nonzero(self) -> bool { self != 0 }
                #[inline]
                fn from_f64(v: f64) -> Self { v as $t }
                #[inline]
                fn from_i64(v: i64) -> Self { v as $t }
                #[inline]
                fn from_u64(v: u64) -> Self { v as $t }
                #[inline]
                fn to_scalar(self) -> Scalar { Scalar::$dtype(self) }
            }
        )*
    };
}

macro_rules! impl_numpy_float {
    ($($t:ty => $dtype:ident),*) => {
        $(
            impl NumpyPrimitive for $t {
                const DTYPE: DType = DType::$dtype;
                const MIN_IDENTITY: Self = <$t>::INFINITY;
                const MAX_IDENTITY: Self = <$t>::NEG_INFINITY;

                #[inline]
                fn wrap(buffer: Buffer<Self>) -> NumpyData {
                    NumpyData::$dtype(buffer)
                }
                #[inline]
                fn as_f64(self) -> f64 { self as f64 }
                #[inline]
                fn as_i64(self) -> i64 { self as i64 }
                #[inline]
                fn as_u64(self) -> u64 { self as u64 }
                #[inline]
                fn is_nonzero(self) -> bool { self != 0.0 }
                #[inline]
                fn from_f64(v: f64) -> Self { v as $t }
                #[inline]
                fn from_i64(v: i64) -> Self { v as $t }
                #[inline]
                fn from_u64(v: u64) -> Self { v as $t }
                #[inline]
                fn to_scalar(self) -> Scalar { Scalar::$dtype(self) }
            }
        )*
    };
}

impl_numpy_int!(
    i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64,
    u8 => UInt8, u16 => UInt16, u32 => UInt32, u64 => UInt64
);
impl_numpy_float!(f32 => Float32, f64 => Float64);

impl NumpyPrimitive for bool {
    const DTYPE: DType = DType::Bool;
    const MIN_IDENTITY: Self = true;
    const MAX_IDENTITY: Self = false;

    #[inline]
    fn wrap(buffer: Buffer<Self>) -> NumpyData {
        NumpyData::Bool(buffer)
    }
    #[inline]
    fn as_f64(self) -> f64 {
        if self { 1.0 } else { 0.0 }
    }
    #[inline]
    fn as_i64(self) -> i64 {
        self as i64
    }
    #[inline]
    fn as_u64(self) -> u64 {
        self as u64
    }
    #[inline]
    fn is_nonzero(self) -> bool {
        self
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v != 0.0
    }
    #[inline]
    fn from_i64(v: i64) -> Self {
        v != 0
    }
    #[inline]
    fn from_u64(v: u64) -> Self {
        v != 0
    }
    #[inline]
    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }
}

/// Casts one value between primitive types with NumPy `astype` semantics.
#[inline]
pub fn cast<T: NumpyPrimitive, U: NumpyPrimitive>(v: T) -> U {
    if U::DTYPE.is_float() {
        U::from_f64(v.as_f64())
    } else if U::DTYPE.is_bool() {
        U::from_i64(v.is_nonzero() as i64)
    } else if T::DTYPE.is_unsigned() {
        U::from_u64(v.as_u64())
    } else {
        U::from_i64(v.as_i64())
    }
}

/// Trait for the float element types, used where NaN handling matters.
pub trait Float: NumFloat + NumpyPrimitive + Bounded {}
impl Float for f32 {}
impl Float for f64 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_semantics() {
        assert_eq!(cast::<f64, i32>(2.9), 2);
        assert_eq!(cast::<i8, u8>(-1), 255);
        assert_eq!(cast::<u64, f64>(u64::MAX), u64::MAX as f64);
        assert!(cast::<i64, bool>(7));
        assert_eq!(cast::<bool, f32>(true), 1.0);
    }

    #[test]
    fn test_le_bytes() {
        let mut out = Vec::new();
        (-2i32).write_le(&mut out);
        1.5f64.write_le(&mut out);
        true.write_le(&mut out);
        assert_eq!(out.len(), 4 + 8 + 1);
        assert_eq!(i32::read_le(&out[0..4]), -2);
        assert_eq!(f64::read_le(&out[4..12]), 1.5);
        assert!(bool::read_le(&out[12..]));
    }

    #[test]
    fn test_identities() {
        assert_eq!(<i16 as NumpyPrimitive>::MIN_IDENTITY, i16::MAX);
        assert_eq!(<f32 as NumpyPrimitive>::MAX_IDENTITY, f32::NEG_INFINITY);
        assert!(<bool as NumpyPrimitive>::MIN_IDENTITY);
    }
}
