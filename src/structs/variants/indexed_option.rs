//! # **IndexedOptionArray** - *Gather with missing values*
//!
//! Element `i` is `content[index[i]]`, or missing when `index[i] < 0`.
//! Every other option kind converts to `IndexedOptionArray64` when an
//! operation needs to drop or re-insert missing values.

use crate::aliases::{Index64, Index8, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::getitem::index_carry;
use crate::kernels::reducers::listoffsetarray_reduce_local_outoffsets;
use crate::kernels::structure::{
    index_filter_valid, indexedarray_flatten_none2empty, indexedarray_getitem_nextcarry_outindex,
    indexedarray_numnull, indexedarray_simplify,
};
use crate::structs::index::Index;
use crate::structs::slice::Slice;
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::numpy::{NumpyArray, NumpyData};
use crate::structs::variants::regular::RegularArray;
use crate::traits::index_type::SignedIndex;
use crate::traits::layout::Layout;

/// # IndexedOptionArray
///
/// ## Example
/// ```rust
/// use jagged::{Content, Index64, IndexedOptionArray, NumpyArray};
///
/// let values: Content = NumpyArray::from_vec(vec![1.5f64, 2.5]).into();
/// let option: Content = IndexedOptionArray::new(Index64::from(vec![1i64, -1, 0]), values)
///     .unwrap()
///     .into();
/// assert_eq!(option.to_value().unwrap().to_json(), "[2.5,null,1.5]");
/// ```
#[derive(Clone, Debug)]
pub struct IndexedOptionArray<T> {
    index: Index<T>,
    content: Content,
    parameters: Parameters,
}

impl<T: SignedIndex> IndexedOptionArray<T> {
    pub fn new(index: Index<T>, content: Content) -> Result<Self> {
        Ok(IndexedOptionArray {
            index,
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
    pub fn index(&self) -> &Index<T> {
        &self.index
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn num_null(&self) -> usize {
        indexedarray_numnull(&self.index)
    }

    /// Carry of the valid entries and the outer index that re-inserts the
    /// missing ones (`-1`, or the rank among valid entries).
    pub fn nextcarry_outindex(&self) -> Result<(Index64, Index64)> {
        indexedarray_getitem_nextcarry_outindex(&self.index, self.content.length()).ctx(&self.classname())
    }

    /// The valid entries only, in order.
    pub fn project(&self) -> Result<Content> {
        let (nextcarry, _) = self.nextcarry_outindex()?;
        self.content.carry(&nextcarry)
    }

    pub fn to_index64(&self) -> IndexedOptionArray<i64> {
        IndexedOptionArray {
            index: self.index.to_index64(),
            content: self.content.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Mask of valid entries, `valid_when = true`. Missing entries point at
    /// an arbitrary content element.
    pub fn to_byte_masked_array(&self) -> Result<ByteMaskedArray> {
        let mask: Index8 = self.index.iter_i64().map(|j| (j >= 0) as i8).collect();
        let carry: Index64 = self.index.iter_i64().map(|j| j.max(0)).collect();
        let content = if carry.is_empty() {
            self.content.getitem_range_nowrap(0, 0)?
        } else {
            self.content.carry(&carry)?
        };
        Ok(ByteMaskedArray::new(mask, content, true)?.replace_parameters(self.parameters.clone()))
    }

    fn rewrap(&self, content: Content) -> Result<Content> {
        Ok(IndexedOptionArray::new(self.index.clone(), content)?
            .replace_parameters(self.parameters.clone())
            .into())
    }
}

/// Wraps `content` with an option index, folding in an option or indexed
/// `content` so that options never nest.
pub(crate) fn simplified(outindex: Index64, content: Content) -> Result<Content> {
    if content.is_option() || content.is_indexed() {
        let inner = content.to_indexed_option_array64()?;
        let index = indexedarray_simplify(&outindex, inner.index()).ctx("IndexedOptionArray64")?;
        let out = IndexedOptionArray::new(index, inner.content().clone())?.replace_parameters(inner.parameters.clone());
        Ok(out.into())
    } else {
        Ok(IndexedOptionArray::new(outindex, content)?.into())
    }
}

/// First carried element of every group, in carried coordinates.
fn carried_starts(nextparents: &Index64, outlength: usize) -> Result<Index64> {
    let mut nextstarts = vec![0i64; outlength];
    let mut seen = vec![false; outlength];
    for (c, parent) in nextparents.iter_i64().enumerate() {
        if parent < 0 || parent as usize >= outlength {
            return Err(JaggedError::value("IndexedOptionArray64", "parent out of range"));
        }
        if !seen[parent as usize] {
            seen[parent as usize] = true;
            nextstarts[parent as usize] = c as i64;
        }
    }
    Ok(nextstarts.into())
}

/// Maps argmin/argmax positions local to the carried entries of each group
/// back to positions that count the missing ones.
fn restore_positions(out: Content, starts: &Index64, nextstarts: &Index64, outindex: &Index64) -> Result<Content> {
    let valid: Vec<i64> = outindex
        .iter_i64()
        .enumerate()
        .filter_map(|(i, j)| (j >= 0).then_some(i as i64))
        .collect();
    let starts = starts.as_slice();
    let nextstarts = nextstarts.as_slice();
    remap_positions(out, &|group, k| {
        if k < 0 {
            return k;
        }
        match (starts.get(group), nextstarts.get(group)) {
            (Some(&start), Some(&first)) => match valid.get((first + k) as usize) {
                Some(&i) => i - start,
                None => k,
            },
            _ => k,
        }
    })
}

fn remap_positions(out: Content, f: &dyn Fn(usize, i64) -> i64) -> Result<Content> {
    match &out {
        Content::Numpy(n) => match n.data() {
            NumpyData::Int64(positions) => {
                let mapped: Vec<i64> = positions.iter().enumerate().map(|(g, &k)| f(g, k)).collect();
                Ok(NumpyArray::from_vec(mapped).into())
            }
            _ => Ok(out),
        },
        Content::ByteMasked(m) => {
            let content = remap_positions(m.content().clone(), f)?;
            Ok(ByteMaskedArray::new(m.mask().clone(), content, m.valid_when())?.into())
        }
        Content::Regular(r) => {
            let content = remap_positions(r.content().clone(), f)?;
            Ok(RegularArray::new(content, r.size(), r.length())?.into())
        }
        _ => Ok(out),
    }
}

impl<T: SignedIndex> Layout for IndexedOptionArray<T> {
    fn classname(&self) -> String {
        format!("IndexedOptionArray{}", T::SUFFIX)
    }

    fn length(&self) -> usize {
        self.index.len()
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
        let j = self.index.get_i64(at);
        if j < 0 {
            return Ok(Element::None);
        }
        if j as usize >= self.content.length() {
            return Err(JaggedError::index(
                self.classname(),
                format!("index[{}] = {} out of range for content of length {}", at, j, self.content.length()),
            ));
        }
        self.content.getitem_at_nowrap(j as usize)
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        let j = self.index.get_i64(at);
        if j < 0 {
            Ok(Value::Null)
        } else {
            self.content.value_at(j as usize)
        }
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        Ok(IndexedOptionArray {
            index: self.index.range(start, stop),
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
        let index = index_carry(&self.index, carry).ctx(&self.classname())?;
        Ok(IndexedOptionArray {
            index,
            content: self.content.clone(),
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        let (nextcarry, outindex) = self.nextcarry_outindex()?;
        let next = self.content.carry(&nextcarry)?;
        let nextadvanced = advanced
            .filter(|a| !a.is_empty())
            .map(|a| index_filter_valid(a, &outindex));
        let out = next.getitem_next(Some(head), tail, nextadvanced.as_ref())?;
        simplified(outindex, out)
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        if slicestarts.len() != self.length() {
            return Err(JaggedError::index(
                self.classname(),
                format!(
                    "cannot fit jagged slice with length {} into {} of size {}",
                    slicestarts.len(),
                    self.classname(),
                    self.length()
                ),
            ));
        }
        let (nextcarry, outindex) = self.nextcarry_outindex()?;
        let reducedstarts = index_filter_valid(slicestarts, &outindex);
        let reducedstops = index_filter_valid(slicestops, &outindex);
        let next = self.content.carry(&nextcarry)?;
        let out = next.getitem_next_jagged(&reducedstarts, &reducedstops, slicecontent, tail)?;
        simplified(outindex, out)
    }

    fn purelist_depth(&self) -> i64 {
        self.content.purelist_depth()
    }

    fn minmax_depth(&self) -> (i64, i64) {
        self.content.minmax_depth()
    }

    fn branch_depth(&self) -> (bool, i64) {
        self.content.branch_depth()
    }

    fn keys(&self) -> Vec<String> {
        self.content.keys()
    }

    fn validity_error(&self, path: &str) -> Option<String> {
        let length = self.content.length() as i64;
        if let Some(i) = self.index.iter_i64().position(|j| j >= length) {
            return Some(format!(
                "at {} ({}): index[i] >= len(content) at i={}",
                path,
                self.classname(),
                i
            ));
        }
        self.content.validity_error_at(&format!("{}.content", path))
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
        let (branch, depth) = self.branch_depth();
        let (nextcarry, outindex) = self.nextcarry_outindex()?;
        let nextparents = index_filter_valid(parents, &outindex);
        let next = self.content.carry(&nextcarry)?;

        if !branch && negaxis == depth {
            let nextstarts = carried_starts(&nextparents, outlength)?;
            let out = next.reduce_next(reducer, negaxis, &nextstarts, &nextparents, outlength, mask, keepdims)?;
            if reducer.needs_position() {
                return restore_positions(out, starts, &nextstarts, &outindex);
            }
            return Ok(out);
        }
        let out = next.reduce_next(reducer, negaxis, starts, &nextparents, outlength, mask, keepdims)?;
        if !out.is_list() {
            return Err(JaggedError::not_implemented(format!(
                "reduction of {} produced {} above the reduced axis",
                self.classname(),
                out.classname()
            )));
        }
        let lists = out.to_list_offset_array64(true)?;
        let inner = IndexedOptionArray::new(outindex, lists.content().clone())?;
        let outoffsets = listoffsetarray_reduce_local_outoffsets(parents, outlength).ctx(&self.classname())?;
        Ok(ListOffsetArray::new(outoffsets, inner.into())?.into())
    }

    fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        self.content.mergeable(other, mergebool)
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        let offset = self.content.length() as i64;
        let index: Index64 = self
            .index
            .iter_i64()
            .map(|j| if j < 0 { -1 } else { j })
            .chain((0..other.length() as i64).map(|j| j + offset))
            .collect();
        let content = self.content.merge(other)?;
        Ok(IndexedOptionArray::new(index, content)?.into())
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        let (nextcarry, outindex) = self.nextcarry_outindex()?;
        let out = self.content.carry(&nextcarry)?.num_next(axis, depth)?;
        simplified(outindex, out)
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        let (nextcarry, outindex) = self.nextcarry_outindex()?;
        let next = self.content.carry(&nextcarry)?;
        match next.offsets_and_flattened(axis, depth)? {
            (None, flattened) => Ok((None, simplified(outindex, flattened)?)),
            (Some(offsets), flattened) => {
                let outoffsets = indexedarray_flatten_none2empty(&outindex, &offsets).ctx(&self.classname())?;
                Ok((Some(outoffsets), flattened))
            }
        }
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        let (nextcarry, outindex) = self.nextcarry_outindex()?;
        let out = self.content.carry(&nextcarry)?.local_index_next(axis, depth)?;
        simplified(outindex, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::Index32;

    fn lists_with_none() -> Content {
        let flat: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4]).into();
        let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 2, 2, 4]), flat)
            .unwrap()
            .into();
        IndexedOptionArray::new(Index32::from(vec![0i32, -1, 2, 1]), lists)
            .unwrap()
            .into()
    }

    #[test]
    fn test_values() {
        let a = lists_with_none();
        assert_eq!(a.classname(), "IndexedOptionArray32");
        assert_eq!(a.to_value().unwrap().to_json(), "[[1,2],null,[3,4],[]]");
        assert!(matches!(a.getitem_at(1).unwrap(), Element::None));
    }

    #[test]
    fn test_slicing_keeps_missing() {
        let a = lists_with_none();
        let firsts = a
            .getitem(&Slice::new().array(vec![0, 1, 2]).at(0))
            .unwrap();
        assert_eq!(firsts.to_value().unwrap().to_json(), "[1,null,3]");
    }

    #[test]
    fn test_reduce_above_target_reinserts_missing() {
        let a = lists_with_none();
        let sums = a.sum(-1, false).unwrap();
        assert_eq!(sums.to_value().unwrap().to_json(), "[3,null,7,0]");
    }

    #[test]
    fn test_argmax_skips_missing() {
        let values: Content = NumpyArray::from_vec(vec![5i64, 9, 1]).into();
        let option: Content = IndexedOptionArray::new(Index64::from(vec![-1i64, 2, -1, 1, 0]), values)
            .unwrap()
            .into();
        assert_eq!(option.argmax(0, false).unwrap().to_value().unwrap().to_json(), "3");
        assert_eq!(option.sum(0, false).unwrap().to_value().unwrap().to_json(), "15");
    }

    #[test]
    fn test_argmin_counts_missing_inside_lists() {
        let a = crate::structs::builder::ArrayBuilder::from_json("[[null,3,1],[],[5,null]]").unwrap();
        let argmins = a.reduce(Reducer::ArgMin, -1, true, false).unwrap();
        assert_eq!(argmins.to_value().unwrap().to_json(), "[2,null,0]");
        let argmaxs = a.reduce(Reducer::ArgMax, -1, false, false).unwrap();
        assert_eq!(argmaxs.to_value().unwrap().to_json(), "[1,-1,0]");
    }

    #[test]
    fn test_simplified_nests_once() {
        let values: Content = NumpyArray::from_vec(vec![1i64, 2]).into();
        let inner: Content = IndexedOptionArray::new(Index64::from(vec![1i64, -1]), values)
            .unwrap()
            .into();
        let out = simplified(Index64::from(vec![1i64, 0, -1]), inner).unwrap();
        let Content::IndexedOption64(node) = &out else {
            panic!("expected IndexedOptionArray64, got {}", out.classname());
        };
        assert_eq!(node.index().as_slice(), &[-1, 1, -1]);
        assert_eq!(out.to_value().unwrap().to_json(), "[null,2,null]");
    }
}
