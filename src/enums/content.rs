//! # **Content Module** - *The closed set of layout nodes*
//!
//! `Content` is the unified node type of the layout tree. Each variant holds
//! an `Arc` to its node struct, so cloning is a reference-count bump and
//! subtrees are shared freely between trees.
//!
//! ## Overview
//! - Index-bearing kinds have one variant per supported index width,
//!   e.g. `ListOffset32`, `ListOffsetU32` and `ListOffset64`.
//! - Per-kind behaviour lives in the node structs behind the
//!   [`Layout`] trait; this module holds the dispatch and the parts of the
//!   slicing engine that are the same for every kind.
//!
//! ## Example
//! ```rust
//! use jagged::{Content, Index64, ListOffsetArray, NumpyArray, Slice, Value};
//!
//! let flat: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4, 5]).into();
//! let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 3, 3, 5]), flat)
//!     .unwrap()
//!     .into();
//! let last = lists.getitem(&Slice::new().at(-1)).unwrap();
//! assert_eq!(last.to_value().unwrap(), Value::from(vec![4i64, 5]));
//! ```

use std::sync::Arc;

use log::debug;

use crate::aliases::{Index64, Parameters, Result};
use crate::enums::element::Element;
use crate::enums::error::JaggedError;
use crate::enums::slice_item::{SliceItem, SliceMissing};
use crate::enums::value::Value;
use crate::kernels::structure::missing_repeat;
use crate::match_content;
use crate::structs::slice::Slice;
use crate::structs::variants::bit_masked::BitMaskedArray;
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::empty::EmptyArray;
use crate::structs::variants::indexed::IndexedArray;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::structs::variants::list::ListArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::numpy::NumpyArray;
use crate::structs::variants::record::RecordArray;
use crate::structs::variants::regular::RegularArray;
use crate::structs::variants::union::UnionArray;
use crate::structs::variants::unmasked::UnmaskedArray;
use crate::traits::index_type::{ListIndex, SignedIndex};
use crate::traits::layout::Layout;

/// # Content
///
/// A node of the layout tree: a logical one-dimensional sequence of
/// `length()` elements, each of which may itself be nested.
#[derive(Clone, Debug)]
pub enum Content {
    Empty(Arc<EmptyArray>),
    Numpy(Arc<NumpyArray>),
    Regular(Arc<RegularArray>),
    List32(Arc<ListArray<i32>>),
    ListU32(Arc<ListArray<u32>>),
    List64(Arc<ListArray<i64>>),
    ListOffset32(Arc<ListOffsetArray<i32>>),
    ListOffsetU32(Arc<ListOffsetArray<u32>>),
    ListOffset64(Arc<ListOffsetArray<i64>>),
    Indexed32(Arc<IndexedArray<i32>>),
    IndexedU32(Arc<IndexedArray<u32>>),
    Indexed64(Arc<IndexedArray<i64>>),
    IndexedOption32(Arc<IndexedOptionArray<i32>>),
    IndexedOption64(Arc<IndexedOptionArray<i64>>),
    ByteMasked(Arc<ByteMaskedArray>),
    BitMasked(Arc<BitMaskedArray>),
    Unmasked(Arc<UnmaskedArray>),
    Record(Arc<RecordArray>),
    Union8I32(Arc<UnionArray<i32>>),
    Union8U32(Arc<UnionArray<u32>>),
    Union8I64(Arc<UnionArray<i64>>),
}

impl From<EmptyArray> for Content {
    fn from(node: EmptyArray) -> Self {
        Content::Empty(Arc::new(node))
    }
}

impl From<NumpyArray> for Content {
    fn from(node: NumpyArray) -> Self {
        Content::Numpy(Arc::new(node))
    }
}

impl From<RegularArray> for Content {
    fn from(node: RegularArray) -> Self {
        Content::Regular(Arc::new(node))
    }
}

impl From<ByteMaskedArray> for Content {
    fn from(node: ByteMaskedArray) -> Self {
        Content::ByteMasked(Arc::new(node))
    }
}

impl From<BitMaskedArray> for Content {
    fn from(node: BitMaskedArray) -> Self {
        Content::BitMasked(Arc::new(node))
    }
}

impl From<UnmaskedArray> for Content {
    fn from(node: UnmaskedArray) -> Self {
        Content::Unmasked(Arc::new(node))
    }
}

impl From<RecordArray> for Content {
    fn from(node: RecordArray) -> Self {
        Content::Record(Arc::new(node))
    }
}

impl<T: ListIndex> From<ListArray<T>> for Content {
    fn from(node: ListArray<T>) -> Self {
        T::list_content(node)
    }
}

impl<T: ListIndex> From<ListOffsetArray<T>> for Content {
    fn from(node: ListOffsetArray<T>) -> Self {
        T::list_offset_content(node)
    }
}

impl<T: ListIndex> From<IndexedArray<T>> for Content {
    fn from(node: IndexedArray<T>) -> Self {
        T::indexed_content(node)
    }
}

impl<T: SignedIndex> From<IndexedOptionArray<T>> for Content {
    fn from(node: IndexedOptionArray<T>) -> Self {
        T::indexed_option_content(node)
    }
}

impl<T: ListIndex> From<UnionArray<T>> for Content {
    fn from(node: UnionArray<T>) -> Self {
        T::union_content(node)
    }
}

impl Default for Content {
    fn default() -> Self {
        EmptyArray::new().into()
    }
}

/// Python slice-bound clamping of `[start, stop)` against `length`.
pub(crate) fn regularize_range(start: Option<i64>, stop: Option<i64>, length: usize) -> (usize, usize) {
    let len = length as i64;
    let clamp = |v: Option<i64>, default: i64| -> i64 {
        match v {
            None => default,
            Some(v) if v < 0 => (v + len).max(0),
            Some(v) => v.min(len),
        }
    };
    let start = clamp(start, 0);
    let stop = clamp(stop, len).max(start);
    (start as usize, stop as usize)
}

impl Content {
    // ----------------------------------------------------------------
    // Identity and metadata
    // ----------------------------------------------------------------

    #[inline]
    pub fn classname(&self) -> String {
        match_content!(self, node => node.classname())
    }

    #[inline]
    pub fn length(&self) -> usize {
        match_content!(self, node => node.length())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        match_content!(self, node => node.parameters())
    }

    pub fn parameter(&self, key: &str) -> Option<&serde_json::Value> {
        self.parameters().get(key)
    }

    /// The `__array__` parameter as a string, if set.
    pub fn array_parameter(&self) -> Option<&str> {
        self.parameter("__array__").and_then(|v| v.as_str())
    }

    pub fn with_parameters(&self, parameters: Parameters) -> Content {
        match_content!(self, node => node.with_parameters(parameters))
    }

    /// Direct children of this node.
    pub fn children(&self) -> Vec<Content> {
        match_content!(self, node => node.children())
    }

    pub fn is_option(&self) -> bool {
        matches!(
            self,
            Content::IndexedOption32(_)
                | Content::IndexedOption64(_)
                | Content::ByteMasked(_)
                | Content::BitMasked(_)
                | Content::Unmasked(_)
        )
    }

    pub fn is_indexed(&self) -> bool {
        matches!(
            self,
            Content::Indexed32(_) | Content::IndexedU32(_) | Content::Indexed64(_)
        )
    }

    pub fn is_union(&self) -> bool {
        matches!(
            self,
            Content::Union8I32(_) | Content::Union8U32(_) | Content::Union8I64(_)
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Content::Regular(_)
                | Content::List32(_)
                | Content::ListU32(_)
                | Content::List64(_)
                | Content::ListOffset32(_)
                | Content::ListOffsetU32(_)
                | Content::ListOffset64(_)
        )
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Content::Record(_))
    }

    /// True when this node is a record with positional fields.
    pub fn is_tuple(&self) -> bool {
        match self {
            Content::Record(r) => r.is_tuple(),
            _ => false,
        }
    }

    // ----------------------------------------------------------------
    // Structure
    // ----------------------------------------------------------------

    pub fn purelist_depth(&self) -> i64 {
        match_content!(self, node => node.purelist_depth())
    }

    pub fn minmax_depth(&self) -> (i64, i64) {
        match_content!(self, node => node.minmax_depth())
    }

    pub fn branch_depth(&self) -> (bool, i64) {
        match_content!(self, node => node.branch_depth())
    }

    /// Record field names reachable without crossing another record.
    pub fn keys(&self) -> Vec<String> {
        match_content!(self, node => node.keys())
    }

    /// Walks the tree and reports the first broken invariant.
    pub fn validity_error(&self) -> Option<String> {
        self.validity_error_at("layout")
    }

    pub(crate) fn validity_error_at(&self, path: &str) -> Option<String> {
        match_content!(self, node => node.validity_error(path))
    }

    /// `validity_error` as a `Result`.
    pub fn validate(&self) -> Result<()> {
        match self.validity_error() {
            None => Ok(()),
            Some(message) => Err(JaggedError::value(self.classname(), message)),
        }
    }

    #[cfg(feature = "validate_outputs")]
    pub(crate) fn checked(self) -> Result<Content> {
        self.validate()?;
        Ok(self)
    }

    #[cfg(not(feature = "validate_outputs"))]
    #[inline(always)]
    pub(crate) fn checked(self) -> Result<Content> {
        Ok(self)
    }

    // ----------------------------------------------------------------
    // Element access
    // ----------------------------------------------------------------

    /// Element `at`; negative positions count from the end, once.
    pub fn getitem_at(&self, at: i64) -> Result<Element> {
        let length = self.length() as i64;
        let regular_at = if at < 0 { at + length } else { at };
        if regular_at < 0 || regular_at >= length {
            return Err(JaggedError::index(
                self.classname(),
                format!("index {} out of range for length {}", at, length),
            ));
        }
        self.getitem_at_nowrap(regular_at as usize)
    }

    #[inline]
    pub fn getitem_at_nowrap(&self, at: usize) -> Result<Element> {
        match_content!(self, node => node.getitem_at_nowrap(at))
    }

    /// Elements `[start, stop)` with Python slice clamping; never out of range.
    pub fn getitem_range(&self, start: Option<i64>, stop: Option<i64>) -> Result<Content> {
        let (start, stop) = regularize_range(start, stop, self.length());
        self.getitem_range_nowrap(start, stop)
    }

    #[inline]
    pub fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        match_content!(self, node => node.getitem_range_nowrap(start, stop))
    }

    /// Projects one record field through any list, option or union wrappers.
    #[inline]
    pub fn getitem_field(&self, key: &str) -> Result<Content> {
        match_content!(self, node => node.getitem_field(key))
    }

    #[inline]
    pub fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        match_content!(self, node => node.getitem_fields(keys))
    }

    /// Gathers elements by position; out-of-range positions are an error.
    #[inline]
    pub fn carry(&self, carry: &Index64) -> Result<Content> {
        match_content!(self, node => node.carry(carry))
    }

    /// Plain value of element `at` (no bounds wrap).
    pub fn value_at(&self, at: usize) -> Result<Value> {
        if at >= self.length() {
            return Err(JaggedError::index(
                self.classname(),
                format!("index {} out of range for length {}", at, self.length()),
            ));
        }
        match_content!(self, node => node.value_at(at))
    }

    /// The whole array as nested values; `__array__ = "char"`/`"byte"`
    /// leaves become a single string.
    pub fn to_value(&self) -> Result<Value> {
        if let Content::Numpy(n) = self {
            if let Some(s) = n.as_string() {
                return Ok(Value::Str(s));
            }
        }
        (0..self.length())
            .map(|i| self.value_at(i))
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    // ----------------------------------------------------------------
    // Slicing engine
    // ----------------------------------------------------------------

    /// NumPy-style slicing.
    ///
    /// The root is wrapped in a one-element `RegularArray` so that the first
    /// slice item is handled like any inner dimension, then the single
    /// element of the result is returned.
    pub fn getitem(&self, slice: &Slice) -> Result<Element> {
        let prepared = slice.prepare()?;
        debug!(
            "getitem on {} (length {}) with {} slice items",
            self.classname(),
            self.length(),
            prepared.len()
        );
        if prepared.len() == 1 {
            match prepared.head() {
                Some(SliceItem::At(at)) => return self.getitem_at(*at),
                Some(SliceItem::Range { start, stop, step: 1 }) => {
                    return Ok(Element::List(self.getitem_range(*start, *stop)?));
                }
                Some(SliceItem::Field(key)) => {
                    return Ok(Element::List(self.getitem_field(key)?));
                }
                Some(SliceItem::Fields(keys)) => {
                    return Ok(Element::List(self.getitem_fields(keys)?));
                }
                _ => {}
            }
        }
        let wrapper: Content = RegularArray::new(self.clone(), self.length(), 1)?.into();
        let out = wrapper
            .getitem_next(prepared.head(), &prepared.tail(), None)?
            .checked()?;
        if out.length() == 0 {
            let nothing = match &out {
                Content::Regular(r) => r.content().getitem_range_nowrap(0, 0)?,
                other => other.getitem_range_nowrap(0, 0)?,
            };
            Ok(Element::List(nothing))
        } else {
            out.getitem_at_nowrap(0)
        }
    }

    pub(crate) fn getitem_next(
        &self,
        head: Option<&SliceItem>,
        tail: &Slice,
        advanced: Option<&Index64>,
    ) -> Result<Content> {
        let Some(head) = head else {
            return Ok(self.clone());
        };
        match head {
            SliceItem::Ellipsis => self.getitem_next_ellipsis(tail, advanced),
            SliceItem::NewAxis => {
                let next = self.getitem_next(tail.head(), &tail.tail(), advanced)?;
                Ok(RegularArray::new(next, 1, self.length())?.into())
            }
            SliceItem::Field(key) => {
                self.getitem_field(key)?
                    .getitem_next(tail.head(), &tail.tail(), advanced)
            }
            SliceItem::Fields(keys) => {
                self.getitem_fields(keys)?
                    .getitem_next(tail.head(), &tail.tail(), advanced)
            }
            SliceItem::Missing(missing) => self.getitem_next_missing(missing, tail, advanced),
            SliceItem::Bools { .. } => Err(JaggedError::type_error(
                "boolean array in slice was not normalized to integer positions",
            )),
            SliceItem::At(_)
            | SliceItem::Range { .. }
            | SliceItem::Array(_)
            | SliceItem::Jagged(_) => {
                match_content!(self, node => node.getitem_next(head, tail, advanced))
            }
        }
    }

    pub(crate) fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        match_content!(self, node => node.getitem_next_jagged(slicestarts, slicestops, slicecontent, tail))
    }

    fn getitem_next_ellipsis(&self, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        let (mindepth, maxdepth) = self.minmax_depth();
        let dimlength = tail.dimlength() as i64;
        if tail.is_empty() || (mindepth - 1 == dimlength && maxdepth - 1 == dimlength) {
            self.getitem_next(tail.head(), &tail.tail(), advanced)
        } else if mindepth - 1 == dimlength || maxdepth - 1 == dimlength {
            Err(JaggedError::index(
                self.classname(),
                "ellipsis (...) can't be used on a data structure of different depths",
            ))
        } else {
            let mut items = vec![SliceItem::Ellipsis];
            items.extend(tail.items().iter().cloned());
            self.getitem_next(Some(&SliceItem::full_range()), &Slice::from(items), advanced)
        }
    }

    fn getitem_next_missing(
        &self,
        missing: &SliceMissing,
        tail: &Slice,
        advanced: Option<&Index64>,
    ) -> Result<Content> {
        if advanced.is_some_and(|a| !a.is_empty()) {
            return Err(JaggedError::value(
                self.classname(),
                "cannot mix missing values in slice with NumPy-style advanced indexing",
            ));
        }
        let next = self.getitem_next(Some(missing.content()), tail, advanced)?;
        match &next {
            Content::Regular(raw) => Self::missing_wrap(raw, missing.index()),
            Content::Record(rec) => {
                if rec.num_fields() == 0 {
                    return Ok(next.clone());
                }
                let mut contents = Vec::with_capacity(rec.num_fields());
                for field in rec.contents() {
                    match field {
                        Content::Regular(raw) => contents.push(Self::missing_wrap(raw, missing.index())?),
                        other => {
                            return Err(JaggedError::not_implemented(format!(
                                "missing values in a slice over a record field of type {}",
                                other.classname()
                            )));
                        }
                    }
                }
                let length = contents.first().map(|c| c.length()).unwrap_or(0);
                Ok(RecordArray::new(contents, rec.recordlookup().cloned(), Some(length))?.into())
            }
            other => Err(JaggedError::not_implemented(format!(
                "missing values in a slice applied to {}",
                other.classname()
            ))),
        }
    }

    fn missing_wrap(raw: &RegularArray, index: &Index64) -> Result<Content> {
        let outindex = missing_repeat(index, raw.length(), raw.size());
        let out = IndexedOptionArray::<i64>::new(outindex, raw.content().clone())?;
        Ok(RegularArray::new(out.into(), index.len(), raw.length())?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Index64, NumpyArray, Slice};

    fn lists() -> Content {
        let flat: Content = NumpyArray::from_vec(vec![0.0f64, 1.1, 2.2, 3.3, 4.4, 5.5]).into();
        ListOffsetArray::new(Index64::from(vec![0i64, 3, 3, 5, 6]), flat)
            .unwrap()
            .into()
    }

    #[test]
    fn test_regularize_range() {
        assert_eq!(regularize_range(None, None, 5), (0, 5));
        assert_eq!(regularize_range(Some(-2), None, 5), (3, 5));
        assert_eq!(regularize_range(Some(4), Some(2), 5), (4, 4));
        assert_eq!(regularize_range(Some(-10), Some(10), 5), (0, 5));
    }

    #[test]
    fn test_negative_index_boundary() {
        let a = lists();
        let n = a.length() as i64;
        let last = a.getitem_at(-1).unwrap().to_value().unwrap();
        let explicit = a.getitem_at(n - 1).unwrap().to_value().unwrap();
        assert_eq!(last, explicit);
        let err = a.getitem_at(-n - 1).unwrap_err();
        assert!(err.is_index_error());
        assert!(a.getitem_at(n).unwrap_err().is_index_error());
    }

    #[test]
    fn test_range_round_trip() {
        let a = lists();
        let whole = a.getitem_range(Some(0), Some(a.length() as i64)).unwrap();
        assert_eq!(whole.to_value().unwrap(), a.to_value().unwrap());
    }

    #[test]
    fn test_ellipsis_and_newaxis() {
        let a = lists();
        let firsts = a
            .getitem(&Slice::new().range(Some(0), Some(1)).ellipsis().at(0))
            .unwrap();
        assert_eq!(firsts.to_value().unwrap().to_json(), "[0.0]");
        let wrapped = a.getitem(&Slice::new().newaxis()).unwrap();
        assert_eq!(wrapped.as_content().map(|c| c.length()), Some(1));
    }

    #[test]
    fn test_kind_predicates() {
        let a = lists();
        assert!(a.is_list());
        assert!(!a.is_option());
        assert_eq!(a.purelist_depth(), 2);
        assert_eq!(a.classname(), "ListOffsetArray64");
        assert!(a.validity_error().is_none());
    }
}
