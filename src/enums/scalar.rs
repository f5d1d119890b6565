//! # **Scalar** - *A single primitive leaf value*
//!
//! Returned by integer indexing into a one-dimensional `NumpyArray`.

use std::fmt::{Display, Formatter};

use crate::enums::dtype::DType;
use crate::enums::value::Value;
use crate::traits::print::format_float;

/// One element of a `NumpyArray`, tagged by dtype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    pub fn dtype(&self) -> DType {
        match self {
            Scalar::Bool(_) => DType::Bool,
            Scalar::Int8(_) => DType::Int8,
            Scalar::Int16(_) => DType::Int16,
            Scalar::Int32(_) => DType::Int32,
            Scalar::Int64(_) => DType::Int64,
            Scalar::UInt8(_) => DType::UInt8,
            Scalar::UInt16(_) => DType::UInt16,
            Scalar::UInt32(_) => DType::UInt32,
            Scalar::UInt64(_) => DType::UInt64,
            Scalar::Float32(_) => DType::Float32,
            Scalar::Float64(_) => DType::Float64,
        }
    }

    /// Lossy conversion to `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Bool(v) => v as u8 as f64,
            Scalar::Int8(v) => v as f64,
            Scalar::Int16(v) => v as f64,
            Scalar::Int32(v) => v as f64,
            Scalar::Int64(v) => v as f64,
            Scalar::UInt8(v) => v as f64,
            Scalar::UInt16(v) => v as f64,
            Scalar::UInt32(v) => v as f64,
            Scalar::UInt64(v) => v as f64,
            Scalar::Float32(v) => v as f64,
            Scalar::Float64(v) => v,
        }
    }

    /// Integer value, if the scalar holds an integer that fits `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::Int8(v) => Some(v as i64),
            Scalar::Int16(v) => Some(v as i64),
            Scalar::Int32(v) => Some(v as i64),
            Scalar::Int64(v) => Some(v),
            Scalar::UInt8(v) => Some(v as i64),
            Scalar::UInt16(v) => Some(v as i64),
            Scalar::UInt32(v) => Some(v as i64),
            Scalar::UInt64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match *self {
            Scalar::Bool(v) => Value::Bool(v),
            Scalar::Int8(v) => Value::Int(v as i64),
            Scalar::Int16(v) => Value::Int(v as i64),
            Scalar::Int32(v) => Value::Int(v as i64),
            Scalar::Int64(v) => Value::Int(v),
            Scalar::UInt8(v) => Value::UInt(v as u64),
            Scalar::UInt16(v) => Value::UInt(v as u64),
            Scalar::UInt32(v) => Value::UInt(v as u64),
            Scalar::UInt64(v) => Value::UInt(v),
            Scalar::Float32(v) => Value::Float(v as f64),
            Scalar::Float64(v) => Value::Float(v),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Scalar::Float32(v) => f.write_str(&format_float(v)),
            Scalar::Float64(v) => f.write_str(&format_float(v)),
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::UInt64(v) => write!(f, "{}", v),
            _ => write!(f, "{}", self.as_i64().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(Scalar::UInt8(7).as_i64(), Some(7));
        assert_eq!(Scalar::UInt64(u64::MAX).as_i64(), None);
        assert_eq!(Scalar::Float32(1.5).as_i64(), None);
        assert_eq!(Scalar::Int16(-3).to_value(), Value::Int(-3));
        assert_eq!(Scalar::Float64(2.5).dtype(), DType::Float64);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Float64(2.50).to_string(), "2.5");
        assert_eq!(Scalar::Int32(-4).to_string(), "-4");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::UInt64(u64::MAX).to_string(), u64::MAX.to_string());
    }
}
