//! # **IndexedArray** - *Lazy gather over a content*
//!
//! Element `i` is `content[index[i]]`. Slicing composes indexes instead of
//! copying the content; reductions and structural operations project first.

use crate::aliases::{Index64, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::getitem::index_carry;
use crate::kernels::structure::indexedarray_getitem_nextcarry;
use crate::structs::index::Index;
use crate::structs::slice::Slice;
use crate::traits::index_type::ListIndex;
use crate::traits::layout::Layout;

#[derive(Clone, Debug)]
pub struct IndexedArray<T> {
    index: Index<T>,
    content: Content,
    parameters: Parameters,
}

impl<T: ListIndex> IndexedArray<T> {
    pub fn new(index: Index<T>, content: Content) -> Result<Self> {
        Ok(IndexedArray {
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

    /// Materialises the gather. Parameters of this node move onto the result.
    pub fn project(&self) -> Result<Content> {
        let nextcarry = indexedarray_getitem_nextcarry(&self.index, self.content.length()).ctx(&self.classname())?;
        let out = self.content.carry(&nextcarry)?;
        if self.parameters.is_empty() {
            Ok(out)
        } else {
            let mut parameters = out.parameters().clone();
            parameters.extend(self.parameters.clone());
            Ok(out.with_parameters(parameters))
        }
    }

    fn element_position(&self, at: usize) -> Result<usize> {
        let j = self.index.get_i64(at);
        if j < 0 || j as usize >= self.content.length() {
            return Err(JaggedError::index(
                self.classname(),
                format!("index[{}] = {} out of range for content of length {}", at, j, self.content.length()),
            ));
        }
        Ok(j as usize)
    }

    fn rewrap(&self, content: Content) -> Result<Content> {
        Ok(IndexedArray::new(self.index.clone(), content)?.into())
    }
}

impl<T: ListIndex> Layout for IndexedArray<T> {
    fn classname(&self) -> String {
        format!("IndexedArray{}", T::SUFFIX)
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
        self.content.getitem_at_nowrap(self.element_position(at)?)
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        self.content.value_at(self.element_position(at)?)
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        Ok(IndexedArray {
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
        Ok(IndexedArray {
            index,
            content: self.content.clone(),
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        let nextcarry = indexedarray_getitem_nextcarry(&self.index, self.content.length()).ctx(&self.classname())?;
        let next = self.content.carry(&nextcarry)?;
        next.getitem_next(Some(head), tail, advanced)
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        self.project()?
            .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail)
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
        for (i, j) in self.index.iter_i64().enumerate() {
            if j < 0 {
                return Some(format!("at {} ({}): index[i] < 0 at i={}", path, self.classname(), i));
            }
            if j >= length {
                return Some(format!(
                    "at {} ({}): index[i] >= len(content) at i={}",
                    path,
                    self.classname(),
                    i
                ));
            }
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
        self.project()?
            .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims)
    }

    fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        self.content.mergeable(other, mergebool)
    }

    /// Keeps the gather lazy: the other side is appended to the content and
    /// addressed by fresh positions.
    fn merge(&self, other: &Content) -> Result<Content> {
        let offset = self.content.length() as i64;
        let index: Index64 = self
            .index
            .iter_i64()
            .chain((0..other.length() as i64).map(|j| j + offset))
            .collect();
        let content = self.content.merge(other)?;
        Ok(IndexedArray::new(index, content)?.into())
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        self.project()?.num_next(axis, depth)
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        self.project()?.offsets_and_flattened(axis, depth)
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        self.project()?.local_index_next(axis, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::IndexU32;
    use crate::structs::variants::numpy::NumpyArray;

    fn gathered() -> Content {
        let values: Content = NumpyArray::from_vec(vec![0.5f64, 1.5, 2.5, 3.5]).into();
        IndexedArray::new(IndexU32::from(vec![3u32, 3, 0, 2]), values).unwrap().into()
    }

    #[test]
    fn test_values_and_classname() {
        let a = gathered();
        assert_eq!(a.classname(), "IndexedArrayU32");
        assert_eq!(a.to_value().unwrap().to_json(), "[3.5,3.5,0.5,2.5]");
        assert!(a.is_indexed());
    }

    #[test]
    fn test_carry_composes() {
        let a = gathered();
        let b = a.carry(&Index64::from(vec![2i64, 0])).unwrap();
        assert_eq!(b.classname(), "IndexedArrayU32");
        assert_eq!(b.to_value().unwrap().to_json(), "[0.5,3.5]");
    }

    #[test]
    fn test_bad_index_reported() {
        let values: Content = NumpyArray::from_vec(vec![1i64]).into();
        let a: Content = IndexedArray::new(Index64::from(vec![0i64, 4]), values).unwrap().into();
        assert!(a.validity_error().unwrap().contains("index[i] >= len(content)"));
        assert!(a.getitem_at(1).unwrap_err().is_index_error());
    }

    #[test]
    fn test_sum_projects() {
        let a = gathered();
        assert_eq!(a.sum(0, false).unwrap().to_value().unwrap(), Value::Float(10.0));
    }
}
