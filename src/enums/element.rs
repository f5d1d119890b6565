//! # **Element** - *What a single-position lookup returns*
//!
//! Indexing one position of a [`Content`] removes a dimension. Depending on
//! the node kind the result is a primitive, a nested array, a record view or
//! a missing value.

use std::sync::Arc;

use crate::aliases::Result;
use crate::enums::content::Content;
use crate::enums::error::JaggedError;
use crate::enums::scalar::Scalar;
use crate::enums::value::Value;
use crate::structs::variants::record::RecordArray;
use crate::traits::layout::Layout;

/// One element of a layout.
#[derive(Clone, Debug)]
pub enum Element {
    /// A leaf value of a one-dimensional `NumpyArray`.
    Scalar(Scalar),
    /// A nested array, e.g. one list of a list layout.
    List(Content),
    /// One row of a `RecordArray`.
    Record(Record),
    /// A missing value of an option layout.
    None,
}

impl Element {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Element::None)
    }

    #[inline]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Element::Scalar(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_content(&self) -> Option<&Content> {
        match self {
            Element::List(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Element::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Unwraps a nested array, failing for any other kind of element.
    pub fn into_content(self) -> Result<Content> {
        match self {
            Element::List(c) => Ok(c),
            other => Err(JaggedError::type_error(format!(
                "expected an array element, found {}",
                other.kind_name()
            ))),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Element::Scalar(_) => "a scalar",
            Element::List(_) => "an array",
            Element::Record(_) => "a record",
            Element::None => "None",
        }
    }

    /// Converts to a plain nested value. Strings collapse to `Value::Str`.
    pub fn to_value(&self) -> Result<Value> {
        match self {
            Element::Scalar(s) => Ok(s.to_value()),
            Element::List(c) => c.to_value(),
            Element::Record(r) => r.to_value(),
            Element::None => Ok(Value::Null),
        }
    }
}

impl From<Scalar> for Element {
    fn from(s: Scalar) -> Self {
        Element::Scalar(s)
    }
}

impl From<Content> for Element {
    fn from(c: Content) -> Self {
        Element::List(c)
    }
}

/// A view of row `at` of a [`RecordArray`].
#[derive(Clone, Debug)]
pub struct Record {
    array: Arc<RecordArray>,
    at: usize,
}

impl Record {
    /// Callers guarantee `at < array.length()`.
    pub(crate) fn new(array: Arc<RecordArray>, at: usize) -> Self {
        Record { array, at }
    }

    #[inline]
    pub fn array(&self) -> &Arc<RecordArray> {
        &self.array
    }

    #[inline]
    pub fn at(&self) -> usize {
        self.at
    }

    pub fn is_tuple(&self) -> bool {
        self.array.is_tuple()
    }

    pub fn keys(&self) -> Vec<String> {
        self.array.field_names()
    }

    /// The value of one field at this row.
    pub fn field(&self, key: &str) -> Result<Element> {
        let index = self.array.field_index(key)?;
        self.array.contents()[index].getitem_at_nowrap(self.at)
    }

    pub fn to_value(&self) -> Result<Value> {
        self.array.value_at(self.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NumpyArray, RecordArray};

    #[test]
    fn test_record_view() {
        let x: Content = NumpyArray::from_vec(vec![1i64, 2, 3]).into();
        let y: Content = NumpyArray::from_vec(vec![1.5f64, 2.5, 3.5]).into();
        let rec = RecordArray::from_fields(vec![("x", x), ("y", y)]).unwrap();
        let content: Content = rec.into();
        let row = content.getitem_at(1).unwrap();
        let record = row.as_record().unwrap();
        assert_eq!(record.keys(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(record.field("y").unwrap().to_value().unwrap(), Value::Float(2.5));
        assert_eq!(row.to_value().unwrap().to_json(), r#"{"x":2,"y":2.5}"#);
        assert!(record.field("z").is_err());
    }

    #[test]
    fn test_into_content() {
        assert!(Element::None.into_content().is_err());
        assert!(Element::None.is_none());
        assert_eq!(Element::None.to_value().unwrap(), Value::Null);
    }
}
