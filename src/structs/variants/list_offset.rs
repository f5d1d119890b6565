//! # **ListOffsetArray** - *Variable-length lists from monotonic offsets*
//!
//! The canonical list node: list `i` is `content[offsets[i]..offsets[i + 1]]`.
//! Strings are `ListOffsetArray`s tagged `__array__ = "string"` over a `u8`
//! leaf tagged `"char"`.
//!
//! Reductions are implemented here for every list kind. `RegularArray` and
//! `ListArray` convert to `ListOffsetArray64` before reducing.

use crate::aliases::{Index64, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::reducers::{
    NonlocalNext, listoffsetarray_reduce_local_nextparents, listoffsetarray_reduce_local_outoffsets,
    listoffsetarray_reduce_nonlocal_outstartsstops, listoffsetarray_reduce_nonlocal_preparenext,
};
use crate::kernels::structure::{listarray_localindex, listoffsetarray_flatten_offsets};
use crate::structs::index::Index;
use crate::structs::operations::{is_string_like, maybe_posaxis};
use crate::structs::slice::Slice;
use crate::structs::variants::list::ListArray;
use crate::structs::variants::numpy::NumpyArray;
use crate::structs::variants::regular::RegularArray;
use crate::traits::concatenate::{lists_mergeable, merge_lists};
use crate::traits::index_type::ListIndex;
use crate::traits::layout::Layout;

/// # ListOffsetArray
///
/// Lists packed end to end. `offsets` has `length + 1` entries and need not
/// start at zero.
///
/// ## Example
/// ```rust
/// use jagged::{Content, Index64, ListOffsetArray, NumpyArray, Slice};
///
/// let flat: Content = NumpyArray::from_vec(vec![1.1f64, 2.2, 3.3, 4.4]).into();
/// let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 3, 3, 4]), flat)
///     .unwrap()
///     .into();
/// let firsts = lists.getitem(&Slice::new().array(vec![0, 2]).at(0)).unwrap();
/// assert_eq!(firsts.to_value().unwrap().to_json(), "[1.1,4.4]");
/// ```
#[derive(Clone, Debug)]
pub struct ListOffsetArray<T> {
    offsets: Index<T>,
    content: Content,
    parameters: Parameters,
}

impl<T: ListIndex> ListOffsetArray<T> {
    pub fn new(offsets: Index<T>, content: Content) -> Result<Self> {
        if offsets.is_empty() {
            return Err(JaggedError::value(
                format!("ListOffsetArray{}", T::SUFFIX),
                "offsets must have at least one element",
            ));
        }
        Ok(ListOffsetArray {
            offsets,
            content,
            parameters: Parameters::new(),
        })
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub(crate) fn replace_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[inline]
    pub fn offsets(&self) -> &Index<T> {
        &self.offsets
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// `offsets[..length]`, zero-copy.
    pub fn starts(&self) -> Index<T> {
        self.offsets.range(0, self.offsets.len() - 1)
    }

    /// `offsets[1..]`, zero-copy.
    pub fn stops(&self) -> Index<T> {
        self.offsets.range(1, self.offsets.len())
    }

    /// The content position just past the last list.
    pub fn content_stop(&self) -> usize {
        self.offsets.get_i64(self.offsets.len() - 1).max(0) as usize
    }

    /// Offsets shifted to start at zero.
    pub fn compact_offsets64(&self) -> Index64 {
        let first = self.offsets.get_i64(0);
        self.offsets.iter_i64().map(|o| o - first).collect()
    }

    /// The same lists as a `ListArray`, sharing the offsets buffer.
    pub fn to_list_array(&self) -> Result<ListArray<T>> {
        Ok(ListArray::new(self.starts(), self.stops(), self.content.clone())?
            .replace_parameters(self.parameters.clone()))
    }

    pub fn to_list_offset_array64(&self, start_at_zero: bool) -> Result<ListOffsetArray<i64>> {
        let first = self.offsets.get_i64(0);
        let out = if start_at_zero && first != 0 {
            let trimmed = self
                .content
                .getitem_range_nowrap(first.max(0) as usize, self.content_stop())?;
            ListOffsetArray::new(self.compact_offsets64(), trimmed)?
        } else {
            ListOffsetArray::new(self.offsets.to_index64(), self.content.clone())?
        };
        Ok(out.replace_parameters(self.parameters.clone()))
    }

    fn list_bounds(&self, at: usize) -> Result<(usize, usize)> {
        let start = self.offsets.get_i64(at);
        let stop = self.offsets.get_i64(at + 1);
        if start < 0 || stop < start || stop as usize > self.content.length() {
            return Err(JaggedError::index(
                self.classname(),
                format!("list {} has invalid bounds {}..{}", at, start, stop),
            ));
        }
        Ok((start as usize, stop as usize))
    }

    fn rewrap(&self, content: Content) -> Result<Content> {
        Ok(ListOffsetArray::new(self.offsets.clone(), content)?.into())
    }
}

impl ListOffsetArray<i64> {
    /// A string array: `__array__ = "string"` lists over UTF-8 bytes.
    pub fn from_strings<S: AsRef<str>>(strings: &[S]) -> Result<Self> {
        let mut offsets = Vec::with_capacity(strings.len() + 1);
        let mut bytes = Vec::new();
        offsets.push(0i64);
        for s in strings {
            bytes.extend_from_slice(s.as_ref().as_bytes());
            offsets.push(bytes.len() as i64);
        }
        let chars = NumpyArray::from_vec(bytes).with_parameter("__array__", "char");
        Ok(ListOffsetArray::new(offsets.into(), chars.into())?.with_parameter("__array__", "string"))
    }
}

impl<T: ListIndex> Layout for ListOffsetArray<T> {
    fn classname(&self) -> String {
        format!("ListOffsetArray{}", T::SUFFIX)
    }

    fn length(&self) -> usize {
        self.offsets.len() - 1
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Content {
        self.clone().replace_parameters(parameters).into()
    }

    fn children(&self) -> Vec<Content> {
        vec![self.content.clone()]
    }

    fn getitem_at_nowrap(&self, at: usize) -> Result<Element> {
        let (start, stop) = self.list_bounds(at)?;
        Ok(Element::List(self.content.getitem_range_nowrap(start, stop)?))
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        let (start, stop) = self.list_bounds(at)?;
        self.content.getitem_range_nowrap(start, stop)?.to_value()
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        Ok(ListOffsetArray {
            offsets: self.offsets.range(start, stop + 1),
            content: self.content.clone(),
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_field(&self, key: &str) -> Result<Content> {
        self.rewrap(self.content.getitem_field(key)?)
    }

    fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        self.rewrap(self.content.getitem_fields(keys)?)
    }

    fn carry(&self, carry: &Index64) -> Result<Content> {
        self.to_list_array()?.carry_in(&self.classname(), carry)
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        self.to_list_array()?
            .getitem_next_in(&self.classname(), head, tail, advanced)
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        self.to_list_array()?
            .getitem_next_jagged_in(&self.classname(), slicestarts, slicestops, slicecontent, tail)
    }

    fn purelist_depth(&self) -> i64 {
        if is_string_like(&self.parameters) {
            1
        } else {
            self.content.purelist_depth() + 1
        }
    }

    fn minmax_depth(&self) -> (i64, i64) {
        if is_string_like(&self.parameters) {
            return (1, 1);
        }
        let (min, max) = self.content.minmax_depth();
        (min + 1, max + 1)
    }

    fn branch_depth(&self) -> (bool, i64) {
        if is_string_like(&self.parameters) {
            return (false, 1);
        }
        let (branch, depth) = self.content.branch_depth();
        (branch, depth + 1)
    }

    fn keys(&self) -> Vec<String> {
        self.content.keys()
    }

    fn validity_error(&self, path: &str) -> Option<String> {
        let classname = self.classname();
        for i in 0..self.length() {
            if self.offsets.get_i64(i + 1) < self.offsets.get_i64(i) {
                return Some(format!(
                    "at {} ({}): offsets must be monotonically increasing at i={}",
                    path, classname, i
                ));
            }
        }
        if self.offsets.get_i64(0) < 0 {
            return Some(format!("at {} ({}): offsets[0] < 0", path, classname));
        }
        if self.content_stop() > self.content.length() {
            return Some(format!(
                "at {} ({}): offsets[-1] > len(content)",
                path, classname
            ));
        }
        self.content.validity_error_at(&format!("{}.content", path))
    }

    fn reduce_next(
        &self,
        reducer: Reducer,
        negaxis: i64,
        _starts: &Index64,
        parents: &Index64,
        outlength: usize,
        mask: bool,
        keepdims: bool,
    ) -> Result<Content> {
        let classname = self.classname();
        let offsets = self.offsets.to_index64();
        let (branch, depth) = self.branch_depth();

        if !branch && negaxis == depth {
            let NonlocalNext {
                nextcarry,
                nextparents,
                nextstarts,
                maxcount,
                maxlens,
            } = listoffsetarray_reduce_nonlocal_preparenext(&offsets, parents, outlength).ctx(&classname)?;
            let nextcontent = self.content.carry(&nextcarry)?;
            let outcontent = nextcontent.reduce_next(
                reducer,
                negaxis - 1,
                &nextstarts,
                &nextparents,
                outlength * maxcount,
                mask,
                false,
            )?;
            let (outstarts, outstops) = listoffsetarray_reduce_nonlocal_outstartsstops(&maxlens, maxcount);
            let out: Content = ListArray::new(outstarts, outstops, outcontent)?.into();
            if keepdims {
                return Ok(RegularArray::new(out, 1, outlength)?.into());
            }
            Ok(out)
        } else {
            let length = self.length();
            let start = offsets.get(0);
            let stop = offsets.get(length);
            if start < 0 || stop < start || stop as usize > self.content.length() {
                return Err(JaggedError::value(
                    classname,
                    "offsets out of range of the content",
                ));
            }
            let trimmed = self.content.getitem_range_nowrap(start as usize, stop as usize)?;
            let nextstarts: Index64 = offsets.iter_i64().take(length).map(|o| o - start).collect();
            let nextparents = listoffsetarray_reduce_local_nextparents(&offsets);
            let outcontent =
                trimmed.reduce_next(reducer, negaxis, &nextstarts, &nextparents, length, mask, keepdims)?;
            let outoffsets = listoffsetarray_reduce_local_outoffsets(parents, outlength).ctx(&classname)?;
            Ok(ListOffsetArray::new(outoffsets, outcontent)?.into())
        }
    }

    fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        lists_mergeable(&self.content, other, mergebool)
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        merge_lists(&self.clone().into(), other)
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        match maybe_posaxis(self.branch_depth(), axis, depth) {
            Some(posaxis) if posaxis == depth => {
                let counts: Vec<i64> = (0..self.length())
                    .map(|i| self.offsets.get_i64(i + 1) - self.offsets.get_i64(i))
                    .collect();
                Ok(NumpyArray::from_vec(counts).into())
            }
            _ => self.rewrap(self.content.num_next(axis, depth + 1)?),
        }
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        match maybe_posaxis(self.branch_depth(), axis, depth) {
            Some(posaxis) if posaxis == depth => {
                let packed = self.to_list_offset_array64(true)?;
                let flattened = packed.content().getitem_range_nowrap(0, packed.content_stop())?;
                Ok((Some(packed.offsets().clone()), flattened))
            }
            Some(posaxis) if posaxis < depth => Err(JaggedError::value(
                self.classname(),
                format!("axis={} is not a list dimension that can be flattened", axis),
            )),
            _ => {
                let (inneroffsets, flattened) = self.content.offsets_and_flattened(axis, depth + 1)?;
                let offsets = self.offsets.to_index64();
                let tooffsets = match inneroffsets {
                    None => offsets,
                    Some(inner) => listoffsetarray_flatten_offsets(&offsets, &inner).ctx(&self.classname())?,
                };
                Ok((None, ListOffsetArray::new(tooffsets, flattened)?.into()))
            }
        }
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        match maybe_posaxis(self.branch_depth(), axis, depth) {
            Some(posaxis) if posaxis == depth => {
                let offsets = self.compact_offsets64();
                let local = NumpyArray::from_buffer(listarray_localindex(&offsets).buffer().clone());
                Ok(ListOffsetArray::new(offsets, local.into())?.into())
            }
            _ => self.rewrap(self.content.local_index_next(axis, depth + 1)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::IndexU32;

    fn ragged() -> Content {
        let flat: Content = NumpyArray::from_vec(vec![30i64, 1, 77]).into();
        ListOffsetArray::new(Index64::from(vec![0i64, 1, 1, 3]), flat)
            .unwrap()
            .into()
    }

    #[test]
    fn test_empty_offsets_rejected() {
        let flat: Content = NumpyArray::from_vec(vec![1i64]).into();
        assert!(ListOffsetArray::new(Index64::default(), flat).is_err());
    }

    #[test]
    fn test_strings() {
        let s: Content = ListOffsetArray::from_strings(&["one", "", "three"]).unwrap().into();
        assert_eq!(s.purelist_depth(), 1);
        assert_eq!(s.to_value().unwrap().to_json(), r#"["one","","three"]"#);
        let firsts = s.getitem_at(2).unwrap();
        assert_eq!(firsts.to_value().unwrap().to_json(), r#""three""#);
    }

    #[test]
    fn test_unsigned_offsets_and_range() {
        let flat: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4, 5]).into();
        let lists: Content = ListOffsetArray::new(IndexU32::from(vec![1u32, 3, 5]), flat).unwrap().into();
        assert_eq!(lists.classname(), "ListOffsetArrayU32");
        assert_eq!(lists.to_value().unwrap().to_json(), "[[2,3],[4,5]]");
        assert_eq!(lists.getitem_range(Some(1), None).unwrap().to_value().unwrap().to_json(), "[[4,5]]");
    }

    #[test]
    fn test_ragged_reductions() {
        let r = ragged();
        assert_eq!(r.prod(-1, false).unwrap().to_value().unwrap().to_json(), "[30,1,77]");
        assert_eq!(r.prod(0, false).unwrap().to_value().unwrap().to_json(), "[30,77]");
        assert_eq!(r.sum(0, true).unwrap().to_value().unwrap().to_json(), "[[31,77]]");
        assert_eq!(r.min(1, true).unwrap().to_value().unwrap().to_json(), "[[30],[null],[1]]");
        assert_eq!(r.argmin(0, false).unwrap().to_value().unwrap().to_json(), "[1,0]");
    }

    #[test]
    fn test_jagged_slice() {
        let r = ragged();
        let index: Content = ListOffsetArray::new(
            Index64::from(vec![0i64, 1, 1, 3]),
            NumpyArray::from_vec(vec![0i64, 1, 0]).into(),
        )
        .unwrap()
        .into();
        let picked = r.getitem(&Slice::new().content(&index).unwrap()).unwrap();
        assert_eq!(picked.to_value().unwrap().to_json(), "[[30],[],[77,1]]");
    }
}
