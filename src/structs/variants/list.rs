//! # **ListArray** - *Variable-length lists from starts and stops*
//!
//! The most general list node: list `i` is `content[starts[i]..stops[i]]`.
//! Lists may overlap, appear out of order or leave gaps in the content.
//! `ListOffsetArray` routes its slicing through the same code with
//! `starts`/`stops` views over its offsets.

use log::warn;

use crate::aliases::{Index64, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::getitem::{
    listarray_compact_offsets, listarray_flatten_carry, listarray_getitem_carry,
    listarray_getitem_jagged_apply, listarray_getitem_jagged_descend, listarray_getitem_jagged_expand,
    listarray_getitem_jagged_missing, listarray_getitem_next_array, listarray_getitem_next_array_advanced,
    listarray_getitem_next_at, listarray_getitem_next_range, listarray_getitem_next_range_spreadadvanced,
};
use crate::structs::index::Index;
use crate::structs::operations::{is_string_like, maybe_posaxis};
use crate::structs::slice::Slice;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::numpy::NumpyArray;
use crate::structs::variants::regular::{RegularArray, getitem_next_array_wrap};
use crate::traits::concatenate::{lists_mergeable, merge_lists};
use crate::traits::index_type::ListIndex;
use crate::traits::layout::Layout;

/// # ListArray
///
/// Lists addressed by independent `starts` and `stops`. `stops` may be
/// longer than `starts`; the extra entries are ignored.
#[derive(Clone, Debug)]
pub struct ListArray<T> {
    starts: Index<T>,
    stops: Index<T>,
    content: Content,
    parameters: Parameters,
}

impl<T: ListIndex> ListArray<T> {
    pub fn new(starts: Index<T>, stops: Index<T>, content: Content) -> Result<Self> {
        if stops.len() < starts.len() {
            return Err(JaggedError::value(
                format!("ListArray{}", T::SUFFIX),
                "len(stops) < len(starts)",
            ));
        }
        Ok(ListArray {
            starts,
            stops,
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
    pub fn starts(&self) -> &Index<T> {
        &self.starts
    }

    #[inline]
    pub fn stops(&self) -> &Index<T> {
        &self.stops
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Offsets of the same lists packed end to end from zero.
    pub fn compact_offsets64(&self) -> Result<Index64> {
        listarray_compact_offsets(&self.starts, &self.stops).ctx(&self.classname())
    }

    fn is_contiguous(&self) -> bool {
        (0..self.starts.len()).all(|i| {
            self.starts.get(i) <= self.stops.get(i) && (i == 0 || self.starts.get(i) == self.stops.get(i - 1))
        })
    }

    /// Equivalent `ListOffsetArray64`. Contiguous lists reuse the content;
    /// anything else is gathered into a packed copy.
    pub fn to_list_offset_array64(&self, start_at_zero: bool) -> Result<ListOffsetArray<i64>> {
        let length = self.starts.len();
        if length == 0 {
            let empty = self.content.getitem_range_nowrap(0, 0)?;
            return Ok(ListOffsetArray::new(Index64::zeros(1), empty)?.replace_parameters(self.parameters.clone()));
        }
        if self.is_contiguous() {
            let mut offsets: Vec<i64> = self.starts.iter_i64().collect();
            offsets.push(self.stops.get_i64(length - 1));
            let first = offsets[0];
            let last = offsets[length];
            if first >= 0 && first <= last && last as usize <= self.content.length() {
                let out = if start_at_zero && first != 0 {
                    let shifted: Index64 = offsets.iter().map(|o| o - first).collect();
                    let trimmed = self.content.getitem_range_nowrap(first as usize, last as usize)?;
                    ListOffsetArray::new(shifted, trimmed)?
                } else {
                    ListOffsetArray::new(offsets.into(), self.content.clone())?
                };
                return Ok(out.replace_parameters(self.parameters.clone()));
            }
        }
        let classname = self.classname();
        let offsets = self.compact_offsets64()?;
        let nextcarry = listarray_flatten_carry(&self.starts, &self.stops).ctx(&classname)?;
        let content = self.content.carry(&nextcarry)?;
        Ok(ListOffsetArray::new(offsets, content)?.replace_parameters(self.parameters.clone()))
    }

    fn as_list_offset(&self) -> Result<Content> {
        Ok(self.to_list_offset_array64(true)?.into())
    }

    fn list_bounds(&self, at: usize) -> Result<(usize, usize)> {
        let start = self.starts.get_i64(at);
        let stop = self.stops.get_i64(at);
        if start < 0 || stop < start || stop as usize > self.content.length() {
            return Err(JaggedError::index(
                self.classname(),
                format!("list {} has invalid bounds {}..{}", at, start, stop),
            ));
        }
        Ok((start as usize, stop as usize))
    }

    /// Gathers lists by position, shared with `ListOffsetArray`.
    pub(crate) fn carry_in(&self, classname: &str, carry: &Index64) -> Result<Content> {
        let (starts, stops) = listarray_getitem_carry(&self.starts, &self.stops, carry).ctx(classname)?;
        Ok(ListArray {
            starts,
            stops,
            content: self.content.clone(),
            parameters: self.parameters.clone(),
        }
        .into())
    }

    /// Slices the elements of every list, shared with `ListOffsetArray`.
    pub(crate) fn getitem_next_in(
        &self,
        classname: &str,
        head: &SliceItem,
        tail: &Slice,
        advanced: Option<&Index64>,
    ) -> Result<Content> {
        let advanced = advanced.filter(|a| !a.is_empty());
        let length = self.starts.len();
        match head {
            SliceItem::At(at) => {
                let nextcarry = listarray_getitem_next_at(&self.starts, &self.stops, *at).ctx(classname)?;
                let nextcontent = self.content.carry(&nextcarry)?;
                nextcontent.getitem_next(tail.head(), &tail.tail(), advanced)
            }
            SliceItem::Range { start, stop, step } => {
                let (nextoffsets, nextcarry) =
                    listarray_getitem_next_range(&self.starts, &self.stops, *start, *stop, *step).ctx(classname)?;
                let nextcontent = self.content.carry(&nextcarry)?;
                let nextadvanced =
                    advanced.map(|a| listarray_getitem_next_range_spreadadvanced(a, &nextoffsets));
                let out = nextcontent.getitem_next(tail.head(), &tail.tail(), nextadvanced.as_ref())?;
                Ok(ListOffsetArray::new(nextoffsets, out)?.into())
            }
            SliceItem::Array(array) => match advanced {
                None => {
                    let (nextcarry, nextadvanced) =
                        listarray_getitem_next_array(&self.starts, &self.stops, array.index()).ctx(classname)?;
                    let nextcontent = self.content.carry(&nextcarry)?;
                    let out = nextcontent.getitem_next(tail.head(), &tail.tail(), Some(&nextadvanced))?;
                    getitem_next_array_wrap(out, array.shape(), length)
                }
                Some(advanced) => {
                    let (nextcarry, nextadvanced) = listarray_getitem_next_array_advanced(
                        &self.starts,
                        &self.stops,
                        array.index(),
                        advanced,
                    )
                    .ctx(classname)?;
                    let nextcontent = self.content.carry(&nextcarry)?;
                    nextcontent.getitem_next(tail.head(), &tail.tail(), Some(&nextadvanced))
                }
            },
            SliceItem::Jagged(jagged) => {
                if advanced.is_some() {
                    return Err(JaggedError::index(
                        classname,
                        "cannot mix jagged slice with NumPy-style advanced indexing",
                    ));
                }
                let (multistarts, multistops, nextcarry) =
                    listarray_getitem_jagged_expand(jagged.offsets(), &self.starts, &self.stops).ctx(classname)?;
                let carried = self.content.carry(&nextcarry)?;
                let down = carried.getitem_next_jagged(&multistarts, &multistops, jagged.content(), tail)?;
                Ok(RegularArray::new(down, jagged.length(), length)?.into())
            }
            other => Err(JaggedError::type_error(format!(
                "{} cannot consume slice item {}",
                classname, other
            ))),
        }
    }

    /// Applies one row of a jagged slice to every list, shared with
    /// `ListOffsetArray`.
    pub(crate) fn getitem_next_jagged_in(
        &self,
        classname: &str,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        if slicestops.len() < slicestarts.len() {
            return Err(JaggedError::value(classname, "jagged slice's len(stops) < len(starts)"));
        }
        if slicestarts.len() != self.starts.len() {
            return Err(JaggedError::index(
                classname,
                format!(
                    "cannot fit jagged slice with length {} into {} of size {}",
                    slicestarts.len(),
                    classname,
                    self.starts.len()
                ),
            ));
        }
        match slicecontent {
            SliceItem::Array(array) => {
                let (outoffsets, nextcarry) = listarray_getitem_jagged_apply(
                    slicestarts,
                    slicestops,
                    array.index(),
                    &self.starts,
                    &self.stops,
                    self.content.length(),
                )
                .ctx(classname)?;
                let nextcontent = self.content.carry(&nextcarry)?;
                let out = nextcontent.getitem_next(tail.head(), &tail.tail(), None)?;
                Ok(ListOffsetArray::new(outoffsets, out)?.into())
            }
            SliceItem::Missing(missing) => {
                let SliceItem::Array(positions) = missing.content() else {
                    return Err(JaggedError::not_implemented(
                        "jagged slice with missing values over nested lists",
                    ));
                };
                let (outoffsets, outindex, nextcarry) = listarray_getitem_jagged_missing(
                    slicestarts,
                    slicestops,
                    missing.index(),
                    positions.index(),
                    &self.starts,
                    &self.stops,
                )
                .ctx(classname)?;
                let nextcontent = self.content.carry(&nextcarry)?;
                let out = nextcontent.getitem_next(tail.head(), &tail.tail(), None)?;
                let option = IndexedOptionArray::<i64>::new(outindex, out)?;
                Ok(ListOffsetArray::new(outoffsets, option.into())?.into())
            }
            SliceItem::Jagged(inner) => {
                let (outoffsets, nextcarry, nextstarts, nextstops) = listarray_getitem_jagged_descend(
                    slicestarts,
                    slicestops,
                    inner.offsets(),
                    &self.starts,
                    &self.stops,
                )
                .ctx(classname)?;
                let nextcontent = self.content.carry(&nextcarry)?;
                let out = nextcontent.getitem_next_jagged(&nextstarts, &nextstops, inner.content(), tail)?;
                Ok(ListOffsetArray::new(outoffsets, out)?.into())
            }
            other => Err(JaggedError::type_error(format!(
                "jagged slice cannot contain {}",
                other
            ))),
        }
    }

    pub(crate) fn list_validity_error(&self, classname: &str, path: &str) -> Option<String> {
        if self.stops.len() < self.starts.len() {
            return Some(format!("at {} ({}): len(stops) < len(starts)", path, classname));
        }
        let content_length = self.content.length() as i64;
        for i in 0..self.starts.len() {
            let start = self.starts.get_i64(i);
            let stop = self.stops.get_i64(i);
            if start != stop {
                if start < 0 {
                    return Some(format!("at {} ({}): start[i] < 0 at i={}", path, classname, i));
                }
                if start > stop {
                    return Some(format!("at {} ({}): start[i] > stop[i] at i={}", path, classname, i));
                }
                if stop > content_length {
                    return Some(format!(
                        "at {} ({}): stop[i] > len(content) at i={}",
                        path, classname, i
                    ));
                }
            }
        }
        self.content.validity_error_at(&format!("{}.content", path))
    }
}

impl<T: ListIndex> Layout for ListArray<T> {
    fn classname(&self) -> String {
        format!("ListArray{}", T::SUFFIX)
    }

    fn length(&self) -> usize {
        self.starts.len()
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
        Ok(ListArray {
            starts: self.starts.range(start, stop),
            stops: self.stops.range(start, stop),
            content: self.content.clone(),
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_field(&self, key: &str) -> Result<Content> {
        Ok(ListArray::new(self.starts.clone(), self.stops.clone(), self.content.getitem_field(key)?)?.into())
    }

    fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        Ok(ListArray::new(self.starts.clone(), self.stops.clone(), self.content.getitem_fields(keys)?)?.into())
    }

    fn carry(&self, carry: &Index64) -> Result<Content> {
        self.carry_in(&self.classname(), carry)
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        self.getitem_next_in(&self.classname(), head, tail, advanced)
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        self.getitem_next_jagged_in(&self.classname(), slicestarts, slicestops, slicecontent, tail)
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
        self.list_validity_error(&self.classname(), path)
    }

    fn reduce_next(
        &self,
        reducer: Reducer,
        negaxis: i64,
        starts: &Index64,
        parents: &Index64,
        outlength: usize,
        mask: bool,
        keepdims: bool,
    ) -> Result<Content> {
        if !self.is_contiguous() {
            warn!(
                "reducing a non-contiguous {} of length {} packs its content first",
                self.classname(),
                self.length()
            );
        }
        self.as_list_offset()?
            .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims)
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
                    .map(|i| self.stops.get_i64(i) - self.starts.get_i64(i))
                    .collect();
                Ok(NumpyArray::from_vec(counts).into())
            }
            _ => Ok(ListArray::new(
                self.starts.clone(),
                self.stops.clone(),
                self.content.num_next(axis, depth + 1)?,
            )?
            .into()),
        }
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        self.as_list_offset()?.offsets_and_flattened(axis, depth)
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        self.as_list_offset()?.local_index_next(axis, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::Index32;

    fn scattered() -> ListArray<i32> {
        let flat: Content = NumpyArray::from_vec(vec![0i64, 1, 2, 3, 4, 5, 6]).into();
        ListArray::new(
            Index32::from(vec![4i32, 0, 2]),
            Index32::from(vec![7i32, 2, 2]),
            flat,
        )
        .unwrap()
    }

    #[test]
    fn test_stops_shorter_than_starts() {
        let flat: Content = NumpyArray::from_vec(vec![1i64]).into();
        let err = ListArray::new(Index64::from(vec![0i64, 1]), Index64::from(vec![1i64]), flat).unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Value);
    }

    #[test]
    fn test_values_and_classname() {
        let a: Content = scattered().into();
        assert_eq!(a.classname(), "ListArray32");
        assert_eq!(a.to_value().unwrap().to_json(), "[[4,5,6],[0,1],[]]");
    }

    #[test]
    fn test_to_list_offset_packs() {
        let lo = scattered().to_list_offset_array64(true).unwrap();
        assert_eq!(lo.offsets().as_slice(), &[0, 3, 5, 5]);
        assert_eq!(Content::from(lo).to_value().unwrap().to_json(), "[[4,5,6],[0,1],[]]");
    }

    #[test]
    fn test_slicing_through_starts_stops() {
        let a: Content = scattered().into();
        let lasts = a.getitem(&Slice::new().range(Some(0), Some(2)).at(-1)).unwrap();
        assert_eq!(lasts.to_value().unwrap().to_json(), "[6,1]");
        let err = a.getitem(&Slice::new().range(None, None).at(0)).unwrap_err();
        assert!(err.is_index_error());
        let rev = a.getitem(&Slice::new().range(None, None).range_step(None, None, -1)).unwrap();
        assert_eq!(rev.to_value().unwrap().to_json(), "[[6,5,4],[1,0],[]]");
    }

    #[test]
    fn test_validity() {
        let flat: Content = NumpyArray::from_vec(vec![1i64, 2]).into();
        let bad = ListArray::new(Index64::from(vec![0i64]), Index64::from(vec![3i64]), flat).unwrap();
        let message = Content::from(bad).validity_error().unwrap();
        assert!(message.contains("stop[i] > len(content)"));
    }
}
