//! # **Operations** - *Whole-tree structural operations*
//!
//! Conversions between equivalent node kinds, and the axis-driven
//! operations `num`, `flatten` and `local_index` together with `drop_none`.
//!
//! Axis-driven operations walk the tree with a `depth` that starts at 1 at
//! the root. A list node acts when the positive axis equals its depth;
//! option, indexed, record and union nodes pass the depth through unchanged.

use log::trace;

use crate::aliases::{Index64, Index8, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::scalar::Scalar;
use crate::kernels::structure::{indexedarray_simplify, listoffsetarray_drop_none_indexes};
use crate::match_content;
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::indexed::IndexedArray;
use crate::structs::variants::indexed_option::{IndexedOptionArray, simplified};
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::numpy::NumpyArray;
use crate::structs::variants::record::RecordArray;
use crate::structs::variants::regular::RegularArray;
use crate::structs::variants::union::UnionArray;
use crate::traits::layout::Layout;

/// Positive axis in depth units, or `None` when a negative axis cannot be
/// resolved because the tree below branches.
pub(crate) fn maybe_posaxis(branch_depth: (bool, i64), axis: i64, depth: i64) -> Option<i64> {
    if axis >= 0 {
        return Some(axis);
    }
    match branch_depth {
        (false, below) => Some(axis + depth + below - 1),
        (true, _) => None,
    }
}

/// Lists tagged as strings or bytestrings count as leaves.
pub(crate) fn is_string_like(parameters: &Parameters) -> bool {
    matches!(
        parameters.get("__array__").and_then(|v| v.as_str()),
        Some("string") | Some("bytestring")
    )
}

impl Content {
    pub(crate) fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        match_content!(self, node => node.num_next(axis, depth))
    }

    pub(crate) fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        match_content!(self, node => node.offsets_and_flattened(axis, depth))
    }

    pub(crate) fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        match_content!(self, node => node.local_index_next(axis, depth))
    }

    // ----------------------------------------------------------------
    // Conversions
    // ----------------------------------------------------------------

    /// Drops the option or indexed layer, keeping only valid elements in
    /// order. Other nodes are returned as they are.
    pub fn project(&self) -> Result<Content> {
        match self {
            Content::Indexed32(n) => n.project(),
            Content::IndexedU32(n) => n.project(),
            Content::Indexed64(n) => n.project(),
            Content::IndexedOption32(n) => n.project(),
            Content::IndexedOption64(n) => n.project(),
            Content::ByteMasked(_) | Content::BitMasked(_) => self.to_indexed_option_array64()?.project(),
            Content::Unmasked(n) => Ok(n.content().clone()),
            other => Ok(other.clone()),
        }
    }

    /// Collapses option-of-option and indexed-of-indexed into one node and
    /// merges union contents. Anything else is returned unchanged.
    pub fn simplify(&self) -> Result<Content> {
        match self {
            Content::Union8I32(u) => u.simplify(),
            Content::Union8U32(u) => u.simplify(),
            Content::Union8I64(u) => u.simplify(),
            _ if self.is_indexed() => {
                let outer = self.to_indexed_option_array64()?;
                let content = outer.content();
                if content.is_option() {
                    simplified(outer.index().clone(), content.clone())
                } else if content.is_indexed() {
                    let inner = content.to_indexed_option_array64()?;
                    let index = indexedarray_simplify(outer.index(), inner.index()).ctx(&self.classname())?;
                    Ok(IndexedArray::new(index, inner.content().clone())?
                        .replace_parameters(self.parameters().clone())
                        .into())
                } else {
                    Ok(self.clone())
                }
            }
            _ if self.is_option() => {
                let outer = self.to_indexed_option_array64()?;
                let content = outer.content();
                if content.is_option() || content.is_indexed() {
                    let out = simplified(outer.index().clone(), content.clone())?;
                    Ok(out.with_parameters(self.parameters().clone()))
                } else {
                    Ok(self.clone())
                }
            }
            other => Ok(other.clone()),
        }
    }

    /// Option and indexed nodes as an `IndexedOptionArray64`; any other node
    /// is wrapped with an identity index.
    pub fn to_indexed_option_array64(&self) -> Result<IndexedOptionArray<i64>> {
        let parameters = self.parameters().clone();
        match self {
            Content::IndexedOption32(n) => Ok(n.to_index64()),
            Content::IndexedOption64(n) => Ok(n.as_ref().clone()),
            Content::ByteMasked(n) => n.to_indexed_option_array64(),
            Content::BitMasked(n) => n.to_indexed_option_array64(),
            Content::Unmasked(n) => n.to_indexed_option_array64(),
            Content::Indexed32(n) => {
                Ok(IndexedOptionArray::new(n.index().to_index64(), n.content().clone())?.replace_parameters(parameters))
            }
            Content::IndexedU32(n) => {
                Ok(IndexedOptionArray::new(n.index().to_index64(), n.content().clone())?.replace_parameters(parameters))
            }
            Content::Indexed64(n) => {
                Ok(IndexedOptionArray::new(n.index().clone(), n.content().clone())?.replace_parameters(parameters))
            }
            other => Ok(IndexedOptionArray::new(Index64::arange(other.length()), other.clone())?),
        }
    }

    pub fn to_byte_masked_array(&self) -> Result<ByteMaskedArray> {
        match self {
            Content::ByteMasked(n) => Ok(n.as_ref().clone()),
            Content::BitMasked(n) => n.to_byte_masked_array(),
            Content::Unmasked(n) => n.to_byte_masked_array(),
            other => other.to_indexed_option_array64()?.to_byte_masked_array(),
        }
    }

    /// Any list-like node as offsets over its content. With
    /// `start_at_zero`, the offsets begin at 0.
    pub fn to_list_offset_array64(&self, start_at_zero: bool) -> Result<ListOffsetArray<i64>> {
        match self {
            Content::Regular(n) => n.to_list_offset_array64(),
            Content::List32(n) => n.to_list_offset_array64(start_at_zero),
            Content::ListU32(n) => n.to_list_offset_array64(start_at_zero),
            Content::List64(n) => n.to_list_offset_array64(start_at_zero),
            Content::ListOffset32(n) => n.to_list_offset_array64(start_at_zero),
            Content::ListOffsetU32(n) => n.to_list_offset_array64(start_at_zero),
            Content::ListOffset64(n) => n.to_list_offset_array64(start_at_zero),
            Content::Numpy(n) if n.ndim() > 1 => n.to_regular_array()?.to_list_offset_array64(start_at_zero),
            other => Err(JaggedError::type_error(format!(
                "{} is not a list type",
                other.classname()
            ))),
        }
    }

    /// Multi-dimensional leaves as nested `RegularArray`s, and lists whose
    /// sublists all have one length as a `RegularArray`.
    pub fn to_regular_array(&self) -> Result<Content> {
        match self {
            Content::Numpy(n) => n.to_regular_array(),
            Content::Regular(_) => Ok(self.clone()),
            _ if self.is_list() => {
                let lists = self.to_list_offset_array64(true)?;
                let offsets = lists.offsets();
                let size = if offsets.len() > 1 { offsets.get(1) - offsets.get(0) } else { 0 };
                if let Some(i) = (0..self.length()).find(|&i| offsets.get(i + 1) - offsets.get(i) != size) {
                    return Err(JaggedError::value(
                        self.classname(),
                        format!("list {} has length {}, not {}", i, offsets.get(i + 1) - offsets.get(i), size),
                    ));
                }
                let content = lists.content().getitem_range_nowrap(0, lists.content_stop())?;
                let mut out: Content = RegularArray::new(content, size as usize, self.length())?.into();
                if !self.parameters().is_empty() {
                    out = out.with_parameters(self.parameters().clone());
                }
                Ok(out)
            }
            other => Err(JaggedError::type_error(format!(
                "{} cannot be made regular",
                other.classname()
            ))),
        }
    }

    // ----------------------------------------------------------------
    // Axis operations
    // ----------------------------------------------------------------

    /// Number of elements at `axis`: the length at axis 0, list lengths at
    /// deeper axes.
    pub fn num(&self, axis: i64) -> Result<Element> {
        trace!("num on {} at axis={}", self.classname(), axis);
        if maybe_posaxis(self.branch_depth(), axis, 1) == Some(0) {
            return Ok(Element::Scalar(Scalar::Int64(self.length() as i64)));
        }
        if axis < 0 && maybe_posaxis(self.branch_depth(), axis, 1).is_some_and(|p| p < 0) {
            return Err(self.axis_range_error(axis));
        }
        Ok(Element::List(self.num_next(axis, 1)?.checked()?))
    }

    /// Removes one level of list nesting at `axis`; missing lists vanish.
    pub fn flatten(&self, axis: i64) -> Result<Content> {
        trace!("flatten on {} at axis={}", self.classname(), axis);
        match maybe_posaxis(self.branch_depth(), axis, 1) {
            Some(0) => Err(JaggedError::value(
                self.classname(),
                "axis=0 not allowed for flatten",
            )),
            Some(p) if p < 0 => Err(self.axis_range_error(axis)),
            _ => {
                let (_, flattened) = self.offsets_and_flattened(axis, 1)?;
                flattened.checked()
            }
        }
    }

    /// Position of every element within its list at `axis`; at axis 0, the
    /// positions of the outer elements.
    pub fn local_index(&self, axis: i64) -> Result<Content> {
        trace!("local_index on {} at axis={}", self.classname(), axis);
        match maybe_posaxis(self.branch_depth(), axis, 1) {
            Some(0) => {
                let positions: Vec<i64> = (0..self.length() as i64).collect();
                Ok(NumpyArray::from_vec(positions).into())
            }
            Some(p) if p < 0 => Err(self.axis_range_error(axis)),
            _ => self.local_index_next(axis, 1)?.checked(),
        }
    }

    fn axis_range_error(&self, axis: i64) -> JaggedError {
        JaggedError::value(
            self.classname(),
            format!("axis={} exceeds the depth of this array ({})", axis, self.purelist_depth()),
        )
    }

    // ----------------------------------------------------------------
    // Missing values
    // ----------------------------------------------------------------

    /// Removes missing values at every level. An option directly under a
    /// record field or union content stays, so that siblings keep their
    /// lengths, but its content is cleaned.
    pub fn drop_none(&self) -> Result<Content> {
        self.drop_none_next()?.checked()
    }

    fn drop_none_next(&self) -> Result<Content> {
        match self {
            Content::Empty(_) | Content::Numpy(_) => Ok(self.clone()),
            _ if self.is_list() => {
                let lists = self.to_list_offset_array64(true)?;
                let content = lists.content();
                let parameters = lists.parameters().clone();
                let (offsets, inner) = if content.is_option() {
                    let option = content.to_indexed_option_array64()?;
                    let offsets = listoffsetarray_drop_none_indexes(option.index(), lists.offsets())
                        .ctx("listoffsetarray_drop_none")?;
                    (offsets, option.project()?)
                } else {
                    (lists.offsets().clone(), content.clone())
                };
                Ok(ListOffsetArray::new(offsets, inner.drop_none_next()?)?
                    .replace_parameters(parameters)
                    .into())
            }
            _ if self.is_option() || self.is_indexed() => self.project()?.drop_none_next(),
            Content::Record(r) => {
                let contents = r
                    .contents()
                    .iter()
                    .map(|c| c.drop_none_kept())
                    .collect::<Result<Vec<_>>>()?;
                Ok(RecordArray::new(contents, r.recordlookup().cloned(), Some(r.length()))?
                    .replace_parameters(r.parameters().clone())
                    .into())
            }
            Content::Union8I32(u) => Self::drop_none_union(u.tags().clone(), u.index().to_index64(), u.contents()),
            Content::Union8U32(u) => Self::drop_none_union(u.tags().clone(), u.index().to_index64(), u.contents()),
            Content::Union8I64(u) => Self::drop_none_union(u.tags().clone(), u.index().clone(), u.contents()),
            other => Ok(other.clone()),
        }
    }

    /// `drop_none` that keeps this node's own length.
    fn drop_none_kept(&self) -> Result<Content> {
        let node = self.simplify()?;
        if node.is_option() {
            let option = node.to_indexed_option_array64()?;
            let content = option.content().drop_none_next()?;
            Ok(IndexedOptionArray::new(option.index().clone(), content)?
                .replace_parameters(option.parameters().clone())
                .into())
        } else {
            node.drop_none_next()
        }
    }

    fn drop_none_union(tags: Index8, index: Index64, contents: &[Content]) -> Result<Content> {
        let contents = contents
            .iter()
            .map(|c| c.drop_none_kept())
            .collect::<Result<Vec<_>>>()?;
        UnionArray::new(tags, index, contents)?.simplify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> Content {
        // [[[0, 1], []], [], [[2], [3, 4, 5]]]
        let flat: Content = NumpyArray::from_vec(vec![0i64, 1, 2, 3, 4, 5]).into();
        let inner: Content = ListOffsetArray::new(Index64::from(vec![0i64, 2, 2, 3, 6]), flat)
            .unwrap()
            .into();
        ListOffsetArray::new(Index64::from(vec![0i64, 2, 2, 4]), inner)
            .unwrap()
            .into()
    }

    fn with_missing() -> Content {
        // [[1.5, None, 2.5], None, [None]]
        let values: Content = NumpyArray::from_vec(vec![1.5f64, 2.5]).into();
        let option: Content = IndexedOptionArray::new(Index64::from(vec![0i64, -1, 1, -1]), values)
            .unwrap()
            .into();
        let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 3, 3, 4]), option)
            .unwrap()
            .into();
        ByteMaskedArray::new(Index8::from(vec![1i8, 0, 1]), lists, true)
            .unwrap()
            .into()
    }

    #[test]
    fn test_maybe_posaxis() {
        assert_eq!(maybe_posaxis((false, 3), -1, 1), Some(2));
        assert_eq!(maybe_posaxis((false, 3), 1, 1), Some(1));
        assert_eq!(maybe_posaxis((true, 2), -1, 1), None);
    }

    #[test]
    fn test_num() {
        let a = nested();
        assert_eq!(a.num(0).unwrap().to_value().unwrap().to_json(), "3");
        assert_eq!(a.num(1).unwrap().to_value().unwrap().to_json(), "[2,0,2]");
        assert_eq!(a.num(-1).unwrap().to_value().unwrap().to_json(), "[[2,0],[],[1,3]]");
        assert!(a.num(3).is_err());
    }

    #[test]
    fn test_flatten() {
        let a = nested();
        assert!(a.flatten(0).is_err());
        assert_eq!(a.flatten(1).unwrap().to_value().unwrap().to_json(), "[[0,1],[],[2],[3,4,5]]");
        assert_eq!(a.flatten(2).unwrap().to_value().unwrap().to_json(), "[[0,1],[],[2,3,4,5]]");
        let m = with_missing();
        assert_eq!(m.flatten(1).unwrap().to_value().unwrap().to_json(), "[1.5,null,2.5,null]");
    }

    #[test]
    fn test_local_index() {
        let a = nested();
        assert_eq!(a.local_index(0).unwrap().to_value().unwrap().to_json(), "[0,1,2]");
        assert_eq!(
            a.local_index(-1).unwrap().to_value().unwrap().to_json(),
            "[[[0,1],[]],[],[[0],[0,1,2]]]"
        );
    }

    #[test]
    fn test_drop_none() {
        let m = with_missing();
        assert_eq!(m.drop_none().unwrap().to_value().unwrap().to_json(), "[[1.5,2.5],[]]");
    }

    #[test]
    fn test_drop_none_keeps_record_fields_aligned() {
        let values: Content = NumpyArray::from_vec(vec![1i64, 2]).into();
        let x: Content = IndexedOptionArray::new(Index64::from(vec![0i64, -1, 1]), values)
            .unwrap()
            .into();
        let y: Content = NumpyArray::from_vec(vec![10i64, 20, 30]).into();
        let rec: Content = RecordArray::from_fields(vec![("x", x), ("y", y)]).unwrap().into();
        let out = rec.drop_none().unwrap();
        assert_eq!(out.length(), 3);
        assert_eq!(
            out.to_value().unwrap().to_json(),
            r#"[{"x":1,"y":10},{"x":null,"y":20},{"x":2,"y":30}]"#
        );
    }

    #[test]
    fn test_simplify_nested_options() {
        let values: Content = NumpyArray::from_vec(vec![1i64, 2, 3]).into();
        let inner: Content = IndexedOptionArray::new(Index64::from(vec![2i64, -1, 0]), values)
            .unwrap()
            .into();
        let outer: Content = IndexedOptionArray::new(Index64::from(vec![0i64, 1, -1, 2]), inner)
            .unwrap()
            .into();
        let simple = outer.simplify().unwrap();
        let Content::IndexedOption64(node) = &simple else {
            panic!("expected IndexedOptionArray64, got {}", simple.classname());
        };
        assert!(!node.content().is_option());
        assert_eq!(simple.to_value().unwrap().to_json(), "[3,null,null,1]");
    }

    #[test]
    fn test_to_regular_array() {
        let flat: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4]).into();
        let even: Content = ListOffsetArray::new(Index64::from(vec![0i64, 2, 4]), flat.clone())
            .unwrap()
            .into();
        let regular = even.to_regular_array().unwrap();
        assert_eq!(regular.classname(), "RegularArray");
        assert_eq!(regular.to_value().unwrap().to_json(), "[[1,2],[3,4]]");
        let uneven: Content = ListOffsetArray::new(Index64::from(vec![0i64, 1, 4]), flat)
            .unwrap()
            .into();
        assert!(uneven.to_regular_array().is_err());
    }
}
