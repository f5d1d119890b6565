//! # **Aliases** - *Short names for common instantiations*

use std::collections::BTreeMap;

use crate::enums::error::JaggedError;
use crate::structs::index::Index;

/// Signed 8-bit index, used for union tags and byte masks.
pub type Index8 = Index<i8>;

/// Unsigned 8-bit index, used for packed bit masks.
pub type IndexU8 = Index<u8>;

/// Signed 32-bit index.
pub type Index32 = Index<i32>;

/// Unsigned 32-bit index.
pub type IndexU32 = Index<u32>;

/// Signed 64-bit index. All intermediate carries and parents are 64-bit.
pub type Index64 = Index<i64>;

/// Free-form node metadata.
///
/// The `__array__` key marks list layouts that hold strings
/// (`"string"`, `"bytestring"`) and their leaf characters (`"char"`, `"byte"`).
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, JaggedError>;
