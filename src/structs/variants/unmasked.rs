//! # **UnmaskedArray** - *Option type without missing values*

use crate::aliases::{Index64, Index8, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::structs::slice::Slice;
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::traits::layout::Layout;

#[derive(Clone, Debug)]
pub struct UnmaskedArray {
    content: Content,
    parameters: Parameters,
}

impl UnmaskedArray {
    pub fn new(content: Content) -> Self {
        UnmaskedArray {
            content,
            parameters: Parameters::new(),
        }
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
    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn to_indexed_option_array64(&self) -> Result<IndexedOptionArray<i64>> {
        Ok(IndexedOptionArray::new(Index64::arange(self.content.length()), self.content.clone())?
            .replace_parameters(self.parameters.clone()))
    }

    pub fn to_byte_masked_array(&self) -> Result<ByteMaskedArray> {
        let mask = Index8::from(vec![1i8; self.content.length()]);
        Ok(ByteMaskedArray::new(mask, self.content.clone(), true)?.replace_parameters(self.parameters.clone()))
    }

    /// Keeps option results as they are and marks anything else unmasked.
    fn wrap(content: Content) -> Content {
        if content.is_option() {
            content
        } else {
            UnmaskedArray::new(content).into()
        }
    }
}

impl Layout for UnmaskedArray {
    fn classname(&self) -> String {
        "UnmaskedArray".to_string()
    }

    fn length(&self) -> usize {
        self.content.length()
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
        self.content.getitem_at_nowrap(at)
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        self.content.value_at(at)
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        Ok(UnmaskedArray {
            content: self.content.getitem_range_nowrap(start, stop)?,
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_field(&self, key: &str) -> Result<Content> {
        Ok(Self::wrap(self.content.getitem_field(key)?))
    }

    fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        Ok(Self::wrap(self.content.getitem_fields(keys)?))
    }

    fn carry(&self, carry: &Index64) -> Result<Content> {
        Ok(UnmaskedArray {
            content: self.content.carry(carry)?,
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        Ok(Self::wrap(self.content.getitem_next(Some(head), tail, advanced)?))
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        Ok(Self::wrap(
            self.content
                .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail)?,
        ))
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
        self.content
            .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims)
    }

    fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        self.content.mergeable(other, mergebool)
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        self.to_indexed_option_array64()?.merge(other)
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        Ok(Self::wrap(self.content.num_next(axis, depth)?))
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        match self.content.offsets_and_flattened(axis, depth)? {
            (None, flattened) => Ok((None, Self::wrap(flattened))),
            flattened => Ok(flattened),
        }
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        Ok(Self::wrap(self.content.local_index_next(axis, depth)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::variants::numpy::NumpyArray;

    #[test]
    fn test_unmasked_is_option_without_missing() {
        let values: Content = NumpyArray::from_vec(vec![1i64, 2, 3]).into();
        let u: Content = UnmaskedArray::new(values).into();
        assert!(u.is_option());
        assert_eq!(u.to_value().unwrap().to_json(), "[1,2,3]");
        let sliced = u.getitem_range(Some(1), None).unwrap();
        assert_eq!(sliced.classname(), "UnmaskedArray");
        assert_eq!(u.sum(0, false).unwrap().to_value().unwrap(), Value::Int(6));
    }
}
