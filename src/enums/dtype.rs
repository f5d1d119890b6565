//! # **DType** - *NumPy-compatible primitive dtypes*
//!
//! Identifies the element type of a [`NumpyArray`](crate::NumpyArray) leaf
//! and implements the NumPy promotion lattice used when merging leaves.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Primitive element type of a `NumpyArray` buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DType {
    /// NumPy name, e.g. `"int64"`.
    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    pub fn from_name(name: &str) -> Option<DType> {
        Some(match name {
            "bool" => DType::Bool,
            "int8" => DType::Int8,
            "int16" => DType::Int16,
            "int32" => DType::Int32,
            "int64" => DType::Int64,
            "uint8" => DType::UInt8,
            "uint16" => DType::UInt16,
            "uint32" => DType::UInt32,
            "uint64" => DType::UInt64,
            "float32" => DType::Float32,
            "float64" => DType::Float64,
            _ => return None,
        })
    }

    /// Bytes per element.
    pub fn itemsize(&self) -> usize {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 => 8,
        }
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, DType::Bool)
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        matches!(self, DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64)
    }

    #[inline]
    pub fn is_unsigned(&self) -> bool {
        matches!(self, DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64)
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    fn signed_of_size(size: usize) -> DType {
        match size {
            1 => DType::Int8,
            2 => DType::Int16,
            4 => DType::Int32,
            _ => DType::Int64,
        }
    }

    /// Result dtype of combining `self` and `other`, following NumPy's
    /// `promote_types`.
    ///
    /// Mixed signed/unsigned integers widen to the next signed size that
    /// holds both, and `int64 + uint64` falls back to `float64`. Integers
    /// of up to 16 bits fit `float32`; anything wider needs `float64`.
    pub fn promote(self, other: DType) -> DType {
        use DType::*;
        if self == other {
            return self;
        }
        match (self, other) {
            (Bool, x) | (x, Bool) => x,
            (Float64, _) | (_, Float64) => Float64,
            (Float32, x) | (x, Float32) => {
                if x.itemsize() <= 2 {
                    Float32
                } else {
                    Float64
                }
            }
            (a, b) if a.is_signed() && b.is_signed() => {
                DType::signed_of_size(a.itemsize().max(b.itemsize()))
            }
            (a, b) if a.is_unsigned() && b.is_unsigned() => {
                if a.itemsize() >= b.itemsize() { a } else { b }
            }
            (a, b) => {
                let (signed, unsigned) = if a.is_signed() { (a, b) } else { (b, a) };
                if signed.itemsize() > unsigned.itemsize() {
                    signed
                } else if unsigned.itemsize() == 8 {
                    Float64
                } else {
                    DType::signed_of_size(unsigned.itemsize() * 2)
                }
            }
        }
    }

    /// Output dtype of `sum`/`prod` over this dtype.
    pub fn accumulator(&self) -> DType {
        match self {
            DType::Bool | DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => DType::Int64,
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64 => DType::UInt64,
            DType::Float32 => DType::Float32,
            DType::Float64 => DType::Float64,
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_follows_numpy() {
        assert_eq!(DType::Bool.promote(DType::Int8), DType::Int8);
        assert_eq!(DType::Int8.promote(DType::UInt8), DType::Int16);
        assert_eq!(DType::Int32.promote(DType::UInt32), DType::Int64);
        assert_eq!(DType::Int64.promote(DType::UInt64), DType::Float64);
        assert_eq!(DType::Int64.promote(DType::UInt8), DType::Int64);
        assert_eq!(DType::Int16.promote(DType::Float32), DType::Float32);
        assert_eq!(DType::Int32.promote(DType::Float32), DType::Float64);
        assert_eq!(DType::UInt16.promote(DType::UInt64), DType::UInt64);
        assert_eq!(DType::Float32.promote(DType::Float64), DType::Float64);
    }

    #[test]
    fn test_promotion_is_symmetric() {
        let all = [
            DType::Bool,
            DType::Int8,
            DType::Int16,
            DType::Int32,
            DType::Int64,
            DType::UInt8,
            DType::UInt16,
            DType::UInt32,
            DType::UInt64,
            DType::Float32,
            DType::Float64,
        ];
        for a in all {
            for b in all {
                assert_eq!(a.promote(b), b.promote(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_names_round_trip() {
        for d in [DType::Bool, DType::UInt32, DType::Float32] {
            assert_eq!(DType::from_name(d.name()), Some(d));
        }
        assert_eq!(DType::from_name("complex128"), None);
    }
}
