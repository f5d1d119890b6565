//! # **ByteMaskedArray** - *Option type from a byte per element*
//!
//! Element `i` is valid when `(mask[i] != 0) == valid_when`. The content is
//! aligned with the mask, so missing elements still occupy a content slot.

use crate::aliases::{Index64, Index8, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::getitem::index_carry;
use crate::kernels::structure::bytemaskedarray_to_index;
use crate::structs::slice::Slice;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::traits::layout::Layout;

#[derive(Clone, Debug)]
pub struct ByteMaskedArray {
    mask: Index8,
    content: Content,
    valid_when: bool,
    parameters: Parameters,
}

impl ByteMaskedArray {
    pub fn new(mask: Index8, content: Content, valid_when: bool) -> Result<Self> {
        if mask.len() > content.length() {
            return Err(JaggedError::value(
                "ByteMaskedArray",
                format!("len(mask) = {} > len(content) = {}", mask.len(), content.length()),
            ));
        }
        Ok(ByteMaskedArray {
            mask,
            content,
            valid_when,
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
    pub fn mask(&self) -> &Index8 {
        &self.mask
    }

    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[inline]
    pub fn valid_when(&self) -> bool {
        self.valid_when
    }

    #[inline]
    pub fn is_valid(&self, at: usize) -> bool {
        (self.mask.get(at) != 0) == self.valid_when
    }

    pub fn to_indexed_option_array64(&self) -> Result<IndexedOptionArray<i64>> {
        let index = bytemaskedarray_to_index(&self.mask, self.valid_when);
        Ok(IndexedOptionArray::new(index, self.content.clone())?.replace_parameters(self.parameters.clone()))
    }

    fn rewrap(&self, content: Content) -> Result<Content> {
        Ok(ByteMaskedArray::new(self.mask.clone(), content, self.valid_when)?.into())
    }
}

impl Layout for ByteMaskedArray {
    fn classname(&self) -> String {
        "ByteMaskedArray".to_string()
    }

    fn length(&self) -> usize {
        self.mask.len()
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
        if self.is_valid(at) {
            self.content.getitem_at_nowrap(at)
        } else {
            Ok(Element::None)
        }
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        if self.is_valid(at) {
            self.content.value_at(at)
        } else {
            Ok(Value::Null)
        }
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        Ok(ByteMaskedArray {
            mask: self.mask.range(start, stop),
            content: self.content.getitem_range_nowrap(start, stop)?,
            valid_when: self.valid_when,
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
        let mask = index_carry(&self.mask, carry).ctx(&self.classname())?;
        Ok(ByteMaskedArray {
            mask,
            content: self.content.carry(carry)?,
            valid_when: self.valid_when,
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        self.to_indexed_option_array64()?.getitem_next(head, tail, advanced)
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        self.to_indexed_option_array64()?
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
        if self.mask.len() > self.content.length() {
            return Some(format!("at {} ({}): len(mask) > len(content)", path, self.classname()));
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
        self.to_indexed_option_array64()?
            .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims)
    }

    fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        self.content.mergeable(other, mergebool)
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        self.to_indexed_option_array64()?.merge(other)
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        self.to_indexed_option_array64()?.num_next(axis, depth)
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        self.to_indexed_option_array64()?.offsets_and_flattened(axis, depth)
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        self.to_indexed_option_array64()?.local_index_next(axis, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::variants::numpy::NumpyArray;

    fn masked() -> Content {
        let values: Content = NumpyArray::from_vec(vec![1.5f64, 2.5, 3.5, 4.5]).into();
        ByteMaskedArray::new(Index8::from(vec![0i8, 1, 0, 0]), values, false)
            .unwrap()
            .into()
    }

    #[test]
    fn test_mask_longer_than_content() {
        let values: Content = NumpyArray::from_vec(vec![1i64]).into();
        assert!(ByteMaskedArray::new(Index8::from(vec![1i8, 1]), values, true).is_err());
    }

    #[test]
    fn test_values_and_range() {
        let m = masked();
        assert!(m.is_option());
        assert_eq!(m.to_value().unwrap().to_json(), "[1.5,null,3.5,4.5]");
        let tail = m.getitem_range(Some(1), Some(3)).unwrap();
        assert_eq!(tail.to_value().unwrap().to_json(), "[null,3.5]");
    }

    #[test]
    fn test_reductions_skip_missing() {
        let m = masked();
        assert_eq!(m.sum(0, false).unwrap().to_value().unwrap(), Value::Float(9.5));
        assert_eq!(m.count(0, false).unwrap().to_value().unwrap(), Value::Int(3));
    }
}
