//! # **RecordArray** - *Struct of equal-length fields*
//!
//! Named fields, or positional fields when `fields` is `None` (a tuple).
//! Tuple fields are addressed by their position as a string: `"0"`, `"1"`, ...
//!
//! Field contents may be longer than the record; only the first `length`
//! elements of each take part.

use std::sync::Arc;

use crate::aliases::{Index64, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::element::{Element, Record};
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::getitem::carry_bounds;
use crate::structs::slice::Slice;
use crate::traits::layout::Layout;

/// # RecordArray
///
/// ## Example
/// ```rust
/// use jagged::{Content, NumpyArray, RecordArray};
///
/// let x: Content = NumpyArray::from_vec(vec![1i64, 2]).into();
/// let y: Content = NumpyArray::from_vec(vec![0.5f64, 1.5]).into();
/// let points: Content = RecordArray::from_fields(vec![("x", x), ("y", y)]).unwrap().into();
/// assert_eq!(points.to_value().unwrap().to_json(), r#"[{"x":1,"y":0.5},{"x":2,"y":1.5}]"#);
/// assert_eq!(points.getitem_field("y").unwrap().to_value().unwrap().to_json(), "[0.5,1.5]");
/// ```
#[derive(Clone, Debug)]
pub struct RecordArray {
    contents: Vec<Content>,
    fields: Option<Vec<String>>,
    length: usize,
    parameters: Parameters,
}

impl RecordArray {
    /// Builds a record from its field contents. `length` defaults to the
    /// shortest field and is required when there are no fields.
    pub fn new(contents: Vec<Content>, fields: Option<Vec<String>>, length: Option<usize>) -> Result<Self> {
        if let Some(names) = &fields {
            if names.len() != contents.len() {
                return Err(JaggedError::value(
                    "RecordArray",
                    format!("{} field names for {} contents", names.len(), contents.len()),
                ));
            }
        }
        let shortest = contents.iter().map(|c| c.length()).min();
        let length = match (length, shortest) {
            (Some(length), Some(shortest)) if length > shortest => {
                return Err(JaggedError::value(
                    "RecordArray",
                    format!("length {} exceeds the shortest field ({})", length, shortest),
                ));
            }
            (Some(length), _) => length,
            (None, Some(shortest)) => shortest,
            (None, None) => {
                return Err(JaggedError::value(
                    "RecordArray",
                    "a record with no fields needs an explicit length",
                ));
            }
        };
        Ok(RecordArray {
            contents,
            fields,
            length,
            parameters: Parameters::new(),
        })
    }

    pub fn from_fields<K: Into<String>>(fields: Vec<(K, Content)>) -> Result<Self> {
        let (names, contents): (Vec<String>, Vec<Content>) = fields.into_iter().map(|(k, c)| (k.into(), c)).unzip();
        RecordArray::new(contents, Some(names), None)
    }

    pub fn tuple(contents: Vec<Content>) -> Result<Self> {
        RecordArray::new(contents, None, None)
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
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    /// Field names, or `None` for a tuple.
    #[inline]
    pub fn recordlookup(&self) -> Option<&Vec<String>> {
        self.fields.as_ref()
    }

    #[inline]
    pub fn num_fields(&self) -> usize {
        self.contents.len()
    }

    #[inline]
    pub fn is_tuple(&self) -> bool {
        self.fields.is_none()
    }

    pub fn field_names(&self) -> Vec<String> {
        match &self.fields {
            Some(names) => names.clone(),
            None => (0..self.contents.len()).map(|i| i.to_string()).collect(),
        }
    }

    pub fn field_index(&self, key: &str) -> Result<usize> {
        let found = match &self.fields {
            Some(names) => names.iter().position(|n| n == key),
            None => key.parse::<usize>().ok().filter(|&i| i < self.contents.len()),
        };
        found.ok_or_else(|| JaggedError::field_not_found(key, self.classname()))
    }

    /// Field `key` trimmed to the record's length.
    pub fn field(&self, key: &str) -> Result<Content> {
        let index = self.field_index(key)?;
        self.contents[index].getitem_range_nowrap(0, self.length)
    }

    fn with_contents(&self, contents: Vec<Content>, length: usize) -> Result<RecordArray> {
        Ok(RecordArray::new(contents, self.fields.clone(), Some(length))?.replace_parameters(self.parameters.clone()))
    }

    fn trimmed_contents(&self) -> Result<Vec<Content>> {
        self.contents
            .iter()
            .map(|c| c.getitem_range_nowrap(0, self.length))
            .collect()
    }

    fn fan_out(&self, f: impl Fn(&Content) -> Result<Content>, length: Option<usize>) -> Result<Content> {
        let contents = self.trimmed_contents()?.iter().map(f).collect::<Result<Vec<_>>>()?;
        let length = match length {
            Some(length) => length,
            None => contents.iter().map(|c| c.length()).min().unwrap_or(self.length),
        };
        Ok(self.with_contents(contents, length)?.into())
    }

    /// Position of the first field projection in `tail`, if any.
    fn first_field_item(tail: &Slice) -> Option<usize> {
        tail.items()
            .iter()
            .position(|item| matches!(item, SliceItem::Field(_) | SliceItem::Fields(_)))
    }
}

impl Layout for RecordArray {
    fn classname(&self) -> String {
        "RecordArray".to_string()
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
        self.contents.clone()
    }

    fn getitem_at_nowrap(&self, at: usize) -> Result<Element> {
        Ok(Element::Record(Record::new(Arc::new(self.clone()), at)))
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        let values = self
            .contents
            .iter()
            .map(|c| c.value_at(at))
            .collect::<Result<Vec<_>>>()?;
        match &self.fields {
            Some(names) => Ok(Value::Record(names.iter().cloned().zip(values).collect())),
            None => Ok(Value::Tuple(values)),
        }
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        let contents = self
            .contents
            .iter()
            .map(|c| c.getitem_range_nowrap(start, stop))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_contents(contents, stop - start)?.into())
    }

    fn getitem_field(&self, key: &str) -> Result<Content> {
        self.field(key)
    }

    fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        let mut contents = Vec::with_capacity(keys.len());
        for key in keys {
            contents.push(self.field(key)?);
        }
        let fields = if self.is_tuple() { None } else { Some(keys.to_vec()) };
        Ok(RecordArray::new(contents, fields, Some(self.length))?.into())
    }

    fn carry(&self, carry: &Index64) -> Result<Content> {
        carry_bounds("recordarray_carry", carry, self.length).ctx(&self.classname())?;
        self.fan_out(|c| c.carry(carry), Some(carry.len()))
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        if let Some(k) = Self::first_field_item(tail) {
            let projected: Content = match &tail.items()[k] {
                SliceItem::Field(key) => self.field(key)?,
                SliceItem::Fields(keys) => self.getitem_fields(keys)?,
                _ => self.clone().into(),
            };
            let rest: Slice = tail
                .items()
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != k)
                .map(|(_, item)| item.clone())
                .collect();
            return projected.getitem_next(Some(head), &rest, advanced);
        }
        self.fan_out(|c| c.getitem_next(Some(head), tail, advanced), None)
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        let contents = self.trimmed_contents()?;
        let out = contents
            .iter()
            .map(|c| c.getitem_next_jagged(slicestarts, slicestops, slicecontent, tail))
            .collect::<Result<Vec<_>>>()?;
        let length = out.first().map(|c| c.length()).unwrap_or(slicestarts.len());
        Ok(self.with_contents(out, length)?.into())
    }

    fn purelist_depth(&self) -> i64 {
        1
    }

    fn minmax_depth(&self) -> (i64, i64) {
        if self.contents.is_empty() {
            return (1, 1);
        }
        let mins = self.contents.iter().map(|c| c.minmax_depth());
        mins.fold((i64::MAX, i64::MIN), |(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
    }

    fn branch_depth(&self) -> (bool, i64) {
        let mut depths = self.contents.iter().map(|c| c.branch_depth());
        let Some((mut branch, mut depth)) = depths.next() else {
            return (false, 1);
        };
        for (b, d) in depths {
            if b || d != depth {
                branch = true;
            }
            depth = depth.min(d);
        }
        (branch, depth)
    }

    fn keys(&self) -> Vec<String> {
        self.field_names()
    }

    fn validity_error(&self, path: &str) -> Option<String> {
        let names = self.field_names();
        for (name, content) in names.iter().zip(&self.contents) {
            if content.length() < self.length {
                return Some(format!(
                    "at {} ({}): len(field {:?}) < len(record)",
                    path,
                    self.classname(),
                    name
                ));
            }
        }
        names
            .iter()
            .zip(&self.contents)
            .find_map(|(name, content)| content.validity_error_at(&format!("{}.field({:?})", path, name)))
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
        let contents = self.trimmed_contents()?;
        let out = contents
            .iter()
            .map(|c| c.reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims))
            .collect::<Result<Vec<_>>>()?;
        Ok(RecordArray::new(out, self.fields.clone(), Some(outlength))?.into())
    }

    fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        let Content::Record(other) = other else {
            return false;
        };
        match (&self.fields, &other.fields) {
            (None, None) => {
                self.contents.len() == other.contents.len()
                    && self
                        .contents
                        .iter()
                        .zip(&other.contents)
                        .all(|(a, b)| a.mergeable(b, mergebool))
            }
            (Some(mine), Some(theirs)) => {
                mine.len() == theirs.len()
                    && mine.iter().zip(&self.contents).all(|(name, a)| {
                        other
                            .field_index(name)
                            .is_ok_and(|j| a.mergeable(&other.contents[j], mergebool))
                    })
            }
            _ => false,
        }
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        let Content::Record(other) = other else {
            return Err(JaggedError::value(
                self.classname(),
                format!("cannot merge a record with {}", other.classname()),
            ));
        };
        let mut contents = Vec::with_capacity(self.contents.len());
        for (i, name) in self.field_names().iter().enumerate() {
            let mine = self.contents[i].getitem_range_nowrap(0, self.length)?;
            let theirs = other.field(name)?;
            contents.push(mine.merge(&theirs)?);
        }
        Ok(RecordArray::new(contents, self.fields.clone(), Some(self.length + other.length))?.into())
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        let contents = self.trimmed_contents()?;
        let out = contents
            .iter()
            .map(|c| c.num_next(axis, depth))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_contents(out, self.length)?.into())
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        let contents = self.trimmed_contents()?;
        let mut out = Vec::with_capacity(contents.len());
        for content in &contents {
            match content.offsets_and_flattened(axis, depth)? {
                (None, flattened) => out.push(flattened),
                (Some(_), _) => {
                    return Err(JaggedError::value(
                        self.classname(),
                        "arrays of records cannot be flattened (but their contents can be; try a different axis)",
                    ));
                }
            }
        }
        Ok((None, self.with_contents(out, self.length)?.into()))
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        let contents = self.trimmed_contents()?;
        let out = contents
            .iter()
            .map(|c| c.local_index_next(axis, depth))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.with_contents(out, self.length)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::variants::list_offset::ListOffsetArray;
    use crate::structs::variants::numpy::NumpyArray;

    fn points() -> Content {
        let x: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 99]).into();
        let y: Content = ListOffsetArray::new(
            Index64::from(vec![0i64, 1, 3, 3]),
            NumpyArray::from_vec(vec![1.5f64, 2.5, 3.5]).into(),
        )
        .unwrap()
        .into();
        RecordArray::from_fields(vec![("x", x), ("y", y)]).unwrap().into()
    }

    #[test]
    fn test_length_is_shortest_field() {
        let p = points();
        assert_eq!(p.length(), 3);
        assert_eq!(p.keys(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(p.getitem_field("x").unwrap().to_value().unwrap().to_json(), "[1,2,3]");
        assert!(matches!(
            p.getitem_field("z").unwrap_err(),
            JaggedError::FieldNotFound { .. }
        ));
    }

    #[test]
    fn test_zero_fields_need_length() {
        assert!(RecordArray::new(Vec::new(), None, None).is_err());
        let empty = RecordArray::new(Vec::new(), None, Some(4)).unwrap();
        assert_eq!(Content::from(empty).length(), 4);
    }

    #[test]
    fn test_tuple_values() {
        let a: Content = NumpyArray::from_vec(vec![1i64, 2]).into();
        let b: Content = NumpyArray::from_vec(vec![true, false]).into();
        let t: Content = RecordArray::tuple(vec![a, b]).unwrap().into();
        assert!(t.is_tuple());
        assert_eq!(t.value_at(1).unwrap(), Value::Tuple(vec![Value::Int(2), Value::Bool(false)]));
        assert_eq!(t.getitem_field("1").unwrap().to_value().unwrap().to_json(), "[true,false]");
    }

    #[test]
    fn test_field_in_tail_applies_here() {
        let p = points();
        let picked = p
            .getitem(&Slice::new().range(Some(0), Some(2)).at(0).field("y"))
            .unwrap();
        assert_eq!(picked.to_value().unwrap().to_json(), "[1.5,2.5]");
    }

    #[test]
    fn test_branching_depth() {
        let p = points();
        assert_eq!(p.branch_depth(), (true, 1));
        assert_eq!(p.minmax_depth(), (1, 2));
        let s = p.sum(-1, false).unwrap();
        assert_eq!(
            s.to_value().unwrap().to_json(),
            r#"{"x":6,"y":[1.5,6.0,0.0]}"#
        );
    }
}
