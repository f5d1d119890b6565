//! # **BitMaskedArray** - *Option type from packed validity bits*
//!
//! The Arrow-style option node. Anything beyond element access goes through
//! `ByteMaskedArray`.

use crate::aliases::{Index64, Index8, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::Element;
use crate::enums::error::JaggedError;
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::structs::bitmask::Bitmask;
use crate::structs::slice::Slice;
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::traits::layout::Layout;

/// # BitMaskedArray
///
/// ## Example
/// ```rust
/// use jagged::{BitMaskedArray, Bitmask, Content, NumpyArray};
///
/// let values: Content = NumpyArray::from_vec(vec![1i64, 2, 3]).into();
/// let mask = Bitmask::from_bools(&[true, false, true], true);
/// let option: Content = BitMaskedArray::new(mask, values, true, 3, true).unwrap().into();
/// assert_eq!(option.to_value().unwrap().to_json(), "[1,null,3]");
/// ```
#[derive(Clone, Debug)]
pub struct BitMaskedArray {
    mask: Bitmask,
    content: Content,
    valid_when: bool,
    length: usize,
    lsb_order: bool,
    parameters: Parameters,
}

impl BitMaskedArray {
    pub fn new(mask: Bitmask, content: Content, valid_when: bool, length: usize, lsb_order: bool) -> Result<Self> {
        if mask.byte_len() * 8 < length {
            return Err(JaggedError::value(
                "BitMaskedArray",
                format!("mask of {} bytes cannot hold {} elements", mask.byte_len(), length),
            ));
        }
        if content.length() < length {
            return Err(JaggedError::value(
                "BitMaskedArray",
                format!("len(content) = {} < length = {}", content.length(), length),
            ));
        }
        Ok(BitMaskedArray {
            mask,
            content,
            valid_when,
            length,
            lsb_order,
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
    pub fn mask(&self) -> &Bitmask {
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
    pub fn lsb_order(&self) -> bool {
        self.lsb_order
    }

    #[inline]
    pub fn is_valid(&self, at: usize) -> bool {
        self.mask.get(at, self.lsb_order) == self.valid_when
    }

    /// One byte per element with the same `valid_when`.
    pub fn to_byte_masked_array(&self) -> Result<ByteMaskedArray> {
        let bytes: Index8 = (0..self.length)
            .map(|i| self.mask.get(i, self.lsb_order) as i8)
            .collect();
        let content = self.content.getitem_range_nowrap(0, self.length)?;
        Ok(ByteMaskedArray::new(bytes, content, self.valid_when)?.replace_parameters(self.parameters.clone()))
    }

    pub fn to_indexed_option_array64(&self) -> Result<IndexedOptionArray<i64>> {
        self.to_byte_masked_array()?.to_indexed_option_array64()
    }
}

impl Layout for BitMaskedArray {
    fn classname(&self) -> String {
        "BitMaskedArray".to_string()
    }

    fn length(&self) -> usize {
        self.length
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
        self.to_byte_masked_array()?.getitem_range_nowrap(start, stop)
    }

    fn getitem_field(&self, key: &str) -> Result<Content> {
        Ok(BitMaskedArray {
            content: self.content.getitem_field(key)?,
            parameters: Parameters::new(),
            ..self.clone()
        }
        .into())
    }

    fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        Ok(BitMaskedArray {
            content: self.content.getitem_fields(keys)?,
            parameters: Parameters::new(),
            ..self.clone()
        }
        .into())
    }

    fn carry(&self, carry: &Index64) -> Result<Content> {
        self.to_byte_masked_array()?.carry(carry)
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
        if self.mask.byte_len() * 8 < self.length {
            return Some(format!("at {} ({}): len(mask) * 8 < length", path, self.classname()));
        }
        if self.content.length() < self.length {
            return Some(format!("at {} ({}): len(content) < length", path, self.classname()));
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

    #[test]
    fn test_msb_order() {
        let values: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4, 5, 6, 7, 8, 9]).into();
        let mask = Bitmask::new(vec![0b1000_0001u8, 0b1000_0000], 9);
        let option: Content = BitMaskedArray::new(mask, values, true, 9, false).unwrap().into();
        assert_eq!(
            option.to_value().unwrap().to_json(),
            "[1,null,null,null,null,null,null,8,9]"
        );
        let picked = option.carry(&Index64::from(vec![8i64, 1])).unwrap();
        assert_eq!(picked.to_value().unwrap().to_json(), "[9,null]");
    }

    #[test]
    fn test_short_mask_rejected() {
        let values: Content = NumpyArray::from_vec(vec![0i64; 9]).into();
        let err = BitMaskedArray::new(Bitmask::new(vec![0u8], 9), values, true, 9, true).unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Value);
    }

    #[test]
    fn test_max_skips_missing() {
        let values: Content = NumpyArray::from_vec(vec![4i64, 50, 6]).into();
        let mask = Bitmask::from_bools(&[true, false, true], true);
        let option: Content = BitMaskedArray::new(mask, values, true, 3, true).unwrap().into();
        assert_eq!(option.max(0, false).unwrap().to_value().unwrap(), Value::Int(6));
    }
}
