//! # **jagged** - *Columnar jagged arrays*
//!
//! A layout tree for nested, variable-length, nullable and heterogeneous
//! columnar data, with NumPy-style slicing, axis reductions and
//! concatenation that operate on whole buffers rather than per element.
//!
//! ## Layout
//! - [`Content`] is the closed set of node kinds. Every node is immutable and
//!   shared through `Arc`, so slicing returns new trees that reuse the
//!   untouched buffers of the original.
//! - Index buffers are generic over their element width (`i32`, `u32`, `i64`,
//!   with `i8`/`u8` for tags and masks), see [`IndexType`].
//! - Leaves are [`NumpyArray`] blocks of a primitive dtype, optionally
//!   multi-dimensional and rectangular.
//!
//! ## Engines
//! - **Slicing**: [`Content::getitem`] with a [`Slice`] of integers, ranges,
//!   fields, ellipsis, newaxis, integer/boolean arrays and jagged or
//!   option-typed index arrays.
//! - **Reduction**: [`Content::reduce`] for `count`, `sum`, `prod`, `any`,
//!   `all`, `min`, `max`, `argmin`, `argmax` at any axis.
//! - **Merge**: [`Content::merge`] and the [`Concatenate`] trait, promoting to
//!   option and union layouts as needed.
//! - **Builder**: [`ArrayBuilder`] infers the layout from a stream of events.
//!
//! ## Example
//! ```rust
//! use jagged::{ArrayBuilder, Reducer, Slice};
//!
//! let mut b = ArrayBuilder::default();
//! for row in [vec![1.5, 2.5], vec![], vec![3.0]] {
//!     b.begin_list().unwrap();
//!     for x in row {
//!         b.real(x).unwrap();
//!     }
//!     b.end_list().unwrap();
//! }
//! let array = b.snapshot().unwrap();
//!
//! let firsts = array.getitem(&Slice::new().range(None, None).at(0)).ok();
//! assert!(firsts.is_none()); // the empty list has no element 0
//!
//! let sums = array.reduce(Reducer::Sum, -1, false, false).unwrap();
//! assert_eq!(sums.to_value().unwrap().to_json(), "[4.0,0.0,3.0]");
//! ```

pub mod enums {
    pub mod content;
    pub mod dtype;
    pub mod element;
    pub mod error;
    pub mod reducer;
    pub mod scalar;
    pub mod slice_item;
    pub mod value;
}

pub mod structs {
    pub mod bitmask;
    pub mod buffer;
    pub mod form;
    pub mod index;
    pub mod operations;
    pub mod slice;

    pub mod variants {
        pub mod bit_masked;
        pub mod byte_masked;
        pub mod empty;
        pub mod indexed;
        pub mod indexed_option;
        pub mod list;
        pub mod list_offset;
        pub mod numpy;
        pub mod record;
        pub mod regular;
        pub mod union;
        pub mod unmasked;
    }

    pub mod builder;
}

pub mod kernels {
    pub mod getitem;
    pub mod reducers;
    pub mod structure;
}

pub mod traits {
    pub mod concatenate;
    pub mod index_type;
    pub mod layout;
    pub mod primitive;
    pub mod print;
}

pub mod aliases;
pub(crate) mod macros;

pub use aliases::{
    Index32, Index64, Index8, IndexU32, IndexU8, Parameters, Result,
};

pub use enums::content::Content;
pub use enums::dtype::DType;
pub use enums::element::{Element, Record};
pub use enums::error::{ErrorCategory, JaggedError, KernelError};
pub use enums::reducer::Reducer;
pub use enums::scalar::Scalar;
pub use enums::slice_item::{SliceArray, SliceItem, SliceJagged, SliceMissing};
pub use enums::value::Value;

pub use structs::bitmask::Bitmask;
pub use structs::buffer::Buffer;
pub use structs::builder::{ArrayBuilder, BuilderOptions};
pub use structs::form::{Buffers, Form, FormInfo, IndexKind};
pub use structs::index::Index;
pub use structs::slice::Slice;
pub use structs::variants::bit_masked::BitMaskedArray;
pub use structs::variants::byte_masked::ByteMaskedArray;
pub use structs::variants::empty::EmptyArray;
pub use structs::variants::indexed::IndexedArray;
pub use structs::variants::indexed_option::IndexedOptionArray;
pub use structs::variants::list::ListArray;
pub use structs::variants::list_offset::ListOffsetArray;
pub use structs::variants::numpy::{NumpyArray, NumpyData};
pub use structs::variants::record::RecordArray;
pub use structs::variants::regular::RegularArray;
pub use structs::variants::union::UnionArray;
pub use structs::variants::unmasked::UnmaskedArray;

pub use traits::concatenate::{Concatenate, merge_many};
pub use traits::index_type::{IndexType, ListIndex, SignedIndex};
pub use traits::primitive::NumpyPrimitive;
pub use traits::print::Print;
