//! # **Index Types** - *Element widths of index buffers*
//!
//! Index-bearing nodes are generic over the width of their index buffers.
//! [`IndexType`] covers every width an [`Index`](crate::Index) may hold;
//! [`ListIndex`] and [`SignedIndex`] narrow that to the widths a node kind
//! supports, and name the [`Content`] variant each instantiation lands in.

use std::fmt::{Debug, Display};

use num_traits::{FromPrimitive, PrimInt, ToPrimitive};

use crate::enums::content::Content;
use crate::enums::dtype::DType;
use crate::structs::variants::indexed::IndexedArray;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::structs::variants::list::ListArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::union::UnionArray;
use crate::traits::primitive::LeBytes;

/// Trait for types valid as index buffer elements.
///
/// Extends and constrains the *num-traits* `PrimInt` implementation to the
/// crate's index universe (`i8`, `u8`, `i32`, `u32`, `i64`).
pub trait IndexType:
    PrimInt + FromPrimitive + ToPrimitive + LeBytes + Default + Debug + Display + Send + Sync + 'static
{
    /// Suffix used in class names, e.g. `"64"` in `ListArray64`.
    const SUFFIX: &'static str;

    /// Matching leaf dtype, used when an index is exposed as data.
    const DTYPE: DType;

    /// Widens to `i64`.
    #[inline]
    fn as_index(self) -> i64 {
        self.to_i64().unwrap_or(i64::MAX)
    }

    /// Narrows from `i64`, or `None` if the value does not fit.
    #[inline]
    fn from_index(v: i64) -> Option<Self> {
        Self::from_i64(v)
    }
}

impl IndexType for i8 {
    const SUFFIX: &'static str = "8";
    const DTYPE: DType = DType::Int8;
}

impl IndexType for u8 {
    const SUFFIX: &'static str = "U8";
    const DTYPE: DType = DType::UInt8;
}

impl IndexType for i32 {
    const SUFFIX: &'static str = "32";
    const DTYPE: DType = DType::Int32;
}

impl IndexType for u32 {
    const SUFFIX: &'static str = "U32";
    const DTYPE: DType = DType::UInt32;
}

impl IndexType for i64 {
    const SUFFIX: &'static str = "64";
    const DTYPE: DType = DType::Int64;
}

/// Index widths accepted by list, indexed and union nodes.
pub trait ListIndex: IndexType {
    fn list_content(node: ListArray<Self>) -> Content;
    fn list_offset_content(node: ListOffsetArray<Self>) -> Content;
    fn indexed_content(node: IndexedArray<Self>) -> Content;
    fn union_content(node: UnionArray<Self>) -> Content;
}

/// Index widths that can mark missing values with negative entries.
pub trait SignedIndex: ListIndex {
    fn indexed_option_content(node: IndexedOptionArray<Self>) -> Content;
}

macro_rules! impl_list_index {
    ($t:ty, $list:ident, $offset:ident, $indexed:ident, $union:ident) => {
        impl ListIndex for $t {
            #[inline]
            fn list_content(node: ListArray<Self>) -> Content {
                Content::$list(std::sync::Arc::new(node))
            }
            #[inline]
            fn list_offset_content(node: ListOffsetArray<Self>) -> Content {
                Content::$offset(std::sync::Arc::new(node))
            }
            #[inline]
            fn indexed_content(node: IndexedArray<Self>) -> Content {
                Content::$indexed(std::sync::Arc::new(node))
            }
            #[inline]
            fn union_content(node: UnionArray<Self>) -> Content {
                Content::$union(std::sync::Arc::new(node))
            }
        }
    };
}

impl_list_index!(i32, List32, ListOffset32, Indexed32, Union8I32);
impl_list_index!(u32, ListU32, ListOffsetU32, IndexedU32, Union8U32);
impl_list_index!(i64, List64, ListOffset64, Indexed64, Union8I64);

impl SignedIndex for i32 {
    #[inline]
    fn indexed_option_content(node: IndexedOptionArray<Self>) -> Content {
        Content::IndexedOption32(std::sync::Arc::new(node))
    }
}

impl SignedIndex for i64 {
    #[inline]
    fn indexed_option_content(node: IndexedOptionArray<Self>) -> Content {
        Content::IndexedOption64(std::sync::Arc::new(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_and_narrowing() {
        assert_eq!((-3i32).as_index(), -3);
        assert_eq!(u32::MAX.as_index(), u32::MAX as i64);
        assert_eq!(i32::from_index(1 << 40), None);
        assert_eq!(u32::from_index(-1), None);
        assert_eq!(i8::from_index(-1), Some(-1i8));
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(<i64 as IndexType>::SUFFIX, "64");
        assert_eq!(<u32 as IndexType>::SUFFIX, "U32");
        assert_eq!(<i32 as IndexType>::DTYPE, DType::Int32);
    }
}
