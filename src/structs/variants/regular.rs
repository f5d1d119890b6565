//! # **RegularArray** - *Fixed-size lists*
//!
//! Groups its content into consecutive lists of `size` elements. The slicing
//! engine also uses it as scaffolding: the root of every `getitem` call and
//! the shape of fancy-index results are expressed as regular dimensions.

use crate::aliases::{Index64, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::getitem::{
    carry_bounds, range_count, regulararray_getitem_carry, regulararray_getitem_next_array,
    regulararray_getitem_next_array_advanced, regulararray_getitem_next_array_regularize,
    regulararray_getitem_next_at, regulararray_getitem_next_range,
    regulararray_getitem_next_range_spreadadvanced, regularize_rangeslice,
};
use crate::structs::operations::{is_string_like, maybe_posaxis};
use crate::structs::slice::Slice;
use crate::structs::variants::list_offset::ListOffsetArray;
use crate::structs::variants::numpy::NumpyArray;
use crate::traits::concatenate::{lists_mergeable, merge_lists};
use crate::traits::layout::Layout;

/// # RegularArray
///
/// `length` lists of exactly `size` elements each. When `size == 0` the
/// length cannot be derived from the content and is stored explicitly.
///
/// ## Example
/// ```rust
/// use jagged::{Content, NumpyArray, RegularArray};
///
/// let flat: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4, 5, 6]).into();
/// let pairs: Content = RegularArray::new(flat, 2, 0).unwrap().into();
/// assert_eq!(pairs.to_value().unwrap().to_json(), "[[1,2],[3,4],[5,6]]");
/// ```
#[derive(Clone, Debug)]
pub struct RegularArray {
    content: Content,
    size: usize,
    length: usize,
    parameters: Parameters,
}

impl RegularArray {
    /// `zeros_length` is the length used when `size == 0`.
    pub fn new(content: Content, size: usize, zeros_length: usize) -> Result<Self> {
        let length = if size > 0 { content.length() / size } else { zeros_length };
        Ok(RegularArray {
            content,
            size,
            length,
            parameters: Parameters::new(),
        })
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// `[0, size, 2 * size, ..., length * size]`
    pub fn compact_offsets64(&self) -> Index64 {
        let size = self.size as i64;
        (0..=self.length as i64).map(|i| i * size).collect()
    }

    pub fn to_list_offset_array64(&self) -> Result<ListOffsetArray<i64>> {
        Ok(ListOffsetArray::new(self.compact_offsets64(), self.content.clone())?
            .replace_parameters(self.parameters.clone()))
    }

    fn as_list_offset(&self) -> Result<Content> {
        Ok(self.to_list_offset_array64()?.into())
    }

    fn rewrap(&self, content: Content) -> Result<Content> {
        Ok(RegularArray::new(content, self.size, self.length)?.into())
    }
}

/// Restores the dimensions of a multi-dimensional integer-array slice
/// around a flat result, innermost first.
pub(crate) fn getitem_next_array_wrap(out: Content, shape: &[usize], outer_length: usize) -> Result<Content> {
    let mut out = out;
    for i in (0..shape.len()).rev() {
        let length = if i > 0 { shape[i - 1] } else { outer_length };
        out = RegularArray::new(out, shape[i], length)?.into();
    }
    Ok(out)
}

impl Layout for RegularArray {
    fn classname(&self) -> String {
        "RegularArray".to_string()
    }

    fn length(&self) -> usize {
        self.length
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Content {
        RegularArray {
            parameters,
            ..self.clone()
        }
        .into()
    }

    fn children(&self) -> Vec<Content> {
        vec![self.content.clone()]
    }

    fn getitem_at_nowrap(&self, at: usize) -> Result<Element> {
        let sub = self
            .content
            .getitem_range_nowrap(at * self.size, (at + 1) * self.size)?;
        Ok(Element::List(sub))
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        self.content
            .getitem_range_nowrap(at * self.size, (at + 1) * self.size)?
            .to_value()
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        let content = self
            .content
            .getitem_range_nowrap(start * self.size, stop * self.size)?;
        Ok(RegularArray {
            content,
            size: self.size,
            length: stop - start,
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
        carry_bounds("regulararray_getitem_carry", carry, self.length).ctx(&self.classname())?;
        let nextcarry = regulararray_getitem_carry(carry, self.size);
        Ok(RegularArray {
            content: self.content.carry(&nextcarry)?,
            size: self.size,
            length: carry.len(),
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        let classname = self.classname();
        match head {
            SliceItem::At(at) => {
                let nextcarry = regulararray_getitem_next_at(*at, self.length, self.size).ctx(&classname)?;
                let nextcontent = self.content.carry(&nextcarry)?;
                nextcontent.getitem_next(tail.head(), &tail.tail(), advanced)
            }
            SliceItem::Range { start, stop, step } => {
                let (regular_start, regular_stop) =
                    regularize_rangeslice(*start, *stop, *step, self.size as i64);
                let nextsize = range_count(regular_start, regular_stop, *step).max(0) as usize;
                let nextcarry =
                    regulararray_getitem_next_range(regular_start, *step, self.length, self.size, nextsize);
                let nextcontent = self.content.carry(&nextcarry)?;
                let nextadvanced = advanced
                    .filter(|a| !a.is_empty())
                    .map(|a| regulararray_getitem_next_range_spreadadvanced(a, self.length, nextsize));
                let out = nextcontent.getitem_next(tail.head(), &tail.tail(), nextadvanced.as_ref())?;
                Ok(RegularArray::new(out, nextsize, self.length)?.into())
            }
            SliceItem::Array(array) => {
                let flathead =
                    regulararray_getitem_next_array_regularize(array.index(), self.size).ctx(&classname)?;
                match advanced.filter(|a| !a.is_empty()) {
                    None => {
                        let (nextcarry, nextadvanced) =
                            regulararray_getitem_next_array(&flathead, self.length, self.size);
                        let nextcontent = self.content.carry(&nextcarry)?;
                        let out = nextcontent.getitem_next(tail.head(), &tail.tail(), Some(&nextadvanced))?;
                        getitem_next_array_wrap(out, array.shape(), self.length)
                    }
                    Some(advanced) => {
                        let (nextcarry, nextadvanced) =
                            regulararray_getitem_next_array_advanced(advanced, &flathead, self.length, self.size)
                                .ctx(&classname)?;
                        let nextcontent = self.content.carry(&nextcarry)?;
                        nextcontent.getitem_next(tail.head(), &tail.tail(), Some(&nextadvanced))
                    }
                }
            }
            SliceItem::Jagged(_) => self.as_list_offset()?.getitem_next(Some(head), tail, advanced),
            other => Err(JaggedError::type_error(format!(
                "RegularArray cannot consume slice item {}",
                other
            ))),
        }
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        self.as_list_offset()?
            .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail)
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
        if self.content.length() < self.length * self.size {
            return Some(format!(
                "at {} (RegularArray): len(content) < length * size",
                path
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
        self.as_list_offset()?
            .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims)
    }

    fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        lists_mergeable(&self.content, other, mergebool)
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        if let Content::Regular(o) = other {
            if o.size == self.size {
                let content = self.content.getitem_range_nowrap(0, self.length * self.size)?;
                let merged = content.merge(&o.content.getitem_range_nowrap(0, o.length * o.size)?)?;
                return Ok(RegularArray::new(merged, self.size, self.length + o.length)?.into());
            }
        }
        merge_lists(&self.clone().into(), other)
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        match maybe_posaxis(self.branch_depth(), axis, depth) {
            Some(posaxis) if posaxis == depth => {
                Ok(NumpyArray::from_vec(vec![self.size as i64; self.length]).into())
            }
            _ => self.rewrap(self.content.num_next(axis, depth + 1)?),
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

    fn grid() -> Content {
        let flat: Content = NumpyArray::from_vec((0..12i64).collect::<Vec<_>>()).into();
        RegularArray::new(flat, 4, 0).unwrap().into()
    }

    #[test]
    fn test_zero_size_length() {
        let flat: Content = NumpyArray::from_vec(Vec::<f64>::new()).into();
        let r = RegularArray::new(flat, 0, 5).unwrap();
        assert_eq!(r.length(), 5);
        assert_eq!(r.compact_offsets64().as_slice(), &[0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_getitem_at_and_range() {
        let g = grid();
        assert_eq!(g.getitem_at(-1).unwrap().to_value().unwrap().to_json(), "[8,9,10,11]");
        let tail = g.getitem_range(Some(1), None).unwrap();
        assert_eq!(tail.length(), 2);
        assert_eq!(tail.classname(), "RegularArray");
    }

    #[test]
    fn test_inner_slicing() {
        let g = grid();
        let cols = g.getitem(&Slice::new().range(None, None).at(1)).unwrap();
        assert_eq!(cols.to_value().unwrap().to_json(), "[1,5,9]");
        let stepped = g
            .getitem(&Slice::new().range(None, None).range_step(None, None, -2))
            .unwrap();
        assert_eq!(stepped.to_value().unwrap().to_json(), "[[3,1],[7,5],[11,9]]");
        let fancy = g.getitem(&Slice::new().array(vec![2, 0]).array(vec![3, 1])).unwrap();
        assert_eq!(fancy.to_value().unwrap().to_json(), "[11,1]");
        assert!(g.getitem(&Slice::new().range(None, None).at(4)).is_err());
    }

    #[test]
    fn test_array_wrap_shape() {
        let g = grid();
        let picked = g
            .getitem(&Slice::new().range(None, None).array_shaped(vec![0, 1, 2, 3], vec![2, 2]).unwrap())
            .unwrap();
        assert_eq!(
            picked.to_value().unwrap().to_json(),
            "[[[0,1],[2,3]],[[4,5],[6,7]],[[8,9],[10,11]]]"
        );
    }
}
