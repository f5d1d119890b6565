//! # **EmptyArray** - *Zero-length array of unknown type*
//!
//! Produced by builders that saw no data. Merging with anything yields the
//! other side, and reducing it behaves like an empty `float64` leaf.

use crate::aliases::{Index64, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::dtype::DType;
use crate::enums::element::Element;
use crate::enums::error::JaggedError;
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::structs::slice::Slice;
use crate::structs::variants::numpy::NumpyArray;
use crate::traits::layout::Layout;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmptyArray {
    parameters: Parameters,
}

impl EmptyArray {
    pub fn new() -> Self {
        EmptyArray::default()
    }

    /// The equivalent empty leaf.
    pub fn to_numpy(&self, dtype: DType) -> NumpyArray {
        NumpyArray::empty(dtype)
    }

    fn out_of_range(&self, what: &str) -> JaggedError {
        JaggedError::index(self.classname(), format!("{} of an empty array", what))
    }
}

impl Layout for EmptyArray {
    fn classname(&self) -> String {
        "EmptyArray".to_string()
    }

    fn length(&self) -> usize {
        0
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Content {
        EmptyArray { parameters }.into()
    }

    fn children(&self) -> Vec<Content> {
        Vec::new()
    }

    fn getitem_at_nowrap(&self, at: usize) -> Result<Element> {
        Err(self.out_of_range(&format!("index {}", at)))
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        Err(self.out_of_range(&format!("index {}", at)))
    }

    fn getitem_range_nowrap(&self, _start: usize, _stop: usize) -> Result<Content> {
        Ok(self.clone().into())
    }

    fn getitem_field(&self, key: &str) -> Result<Content> {
        Err(JaggedError::field_not_found(key, self.classname()))
    }

    fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        Err(JaggedError::field_not_found(keys.join(", "), self.classname()))
    }

    fn carry(&self, carry: &Index64) -> Result<Content> {
        if carry.is_empty() {
            Ok(self.clone().into())
        } else {
            Err(self.out_of_range("carry"))
        }
    }

    fn getitem_next(&self, head: &SliceItem, _tail: &Slice, _advanced: Option<&Index64>) -> Result<Content> {
        match head {
            SliceItem::At(_) => Err(self.out_of_range("integer index")),
            SliceItem::Range { .. } => Ok(self.clone().into()),
            SliceItem::Array(array) if array.is_empty() => Ok(self.clone().into()),
            SliceItem::Array(_) => Err(self.out_of_range("array index")),
            SliceItem::Jagged(jagged) if jagged.length() == 0 => Ok(self.clone().into()),
            other => Err(JaggedError::index(
                self.classname(),
                format!("cannot apply {} to an empty array", other),
            )),
        }
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        _slicestops: &Index64,
        _slicecontent: &SliceItem,
        _tail: &Slice,
    ) -> Result<Content> {
        if slicestarts.is_empty() {
            Ok(self.clone().into())
        } else {
            Err(self.out_of_range("jagged index"))
        }
    }

    fn purelist_depth(&self) -> i64 {
        1
    }

    fn minmax_depth(&self) -> (i64, i64) {
        (1, 1)
    }

    fn branch_depth(&self) -> (bool, i64) {
        (false, 1)
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn validity_error(&self, _path: &str) -> Option<String> {
        None
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
        self.to_numpy(DType::Float64)
            .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims)
    }

    fn mergeable(&self, _other: &Content, _mergebool: bool) -> bool {
        true
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        Ok(other.clone())
    }

    fn num_next(&self, _axis: i64, _depth: i64) -> Result<Content> {
        Ok(NumpyArray::empty(DType::Int64).into())
    }

    fn offsets_and_flattened(&self, _axis: i64, _depth: i64) -> Result<(Option<Index64>, Content)> {
        Ok((Some(Index64::zeros(1)), self.clone().into()))
    }

    fn local_index_next(&self, _axis: i64, _depth: i64) -> Result<Content> {
        Ok(NumpyArray::empty(DType::Int64).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_basics() {
        let e: Content = EmptyArray::new().into();
        assert_eq!(e.length(), 0);
        assert!(e.getitem_at(0).unwrap_err().is_index_error());
        assert_eq!(e.getitem_range(Some(0), Some(3)).unwrap().length(), 0);
        assert!(e.carry(&Index64::default()).is_ok());
        assert!(e.carry(&Index64::zeros(1)).is_err());
    }

    #[test]
    fn test_empty_reduces_as_float() {
        let e: Content = EmptyArray::new().into();
        let total = e.sum(0, false).unwrap();
        assert_eq!(total.to_value().unwrap(), Value::Float(0.0));
    }
}
