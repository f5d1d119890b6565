//! # **Index** - *Typed integer buffers for offsets, carries, tags and masks*
//!
//! Every structural buffer of a layout node is an [`Index<T>`]. Intermediate
//! results of the slicing and reduction engines (carries, parents, advanced
//! positions) are always [`Index64`](crate::Index64).

use std::fmt::{self, Display, Formatter};

use crate::aliases::Index64;
use crate::structs::buffer::Buffer;
use crate::traits::index_type::IndexType;
use crate::traits::print::MAX_PREVIEW;

/// Immutable index buffer, cheap to clone and to range-slice.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Index<T> {
    data: Buffer<T>,
}

impl<T: IndexType> Index<T> {
    #[inline]
    pub fn new(data: Buffer<T>) -> Self {
        Index { data }
    }

    #[inline]
    pub fn from_slice(values: &[T]) -> Self {
        Index::new(Buffer::from_slice(values))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer<T> {
        &self.data
    }

    /// Value at `i`. Callers guarantee `i < len()`.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.data[i]
    }

    /// Value at `i`, widened to `i64`.
    #[inline]
    pub fn get_i64(&self, i: usize) -> i64 {
        self.data[i].as_index()
    }

    #[inline]
    pub fn iter_i64(&self) -> impl Iterator<Item = i64> + '_ {
        self.data.iter().map(|v| v.as_index())
    }

    /// Zero-copy sub-range `[start, stop)`.
    #[inline]
    pub fn range(&self, start: usize, stop: usize) -> Index<T> {
        Index::new(self.data.slice(start, stop))
    }

    /// Widened copy, or a clone when `T` is already `i64`.
    pub fn to_index64(&self) -> Index64 {
        self.iter_i64().collect()
    }

    /// Largest value widened to `i64`, if any.
    pub fn max_i64(&self) -> Option<i64> {
        self.iter_i64().max()
    }
}

impl Index64 {
    pub fn zeros(length: usize) -> Self {
        Index64::full(length, 0)
    }

    pub fn full(length: usize, value: i64) -> Self {
        std::iter::repeat_n(value, length).collect()
    }

    /// `[0, 1, ..., length - 1]`
    pub fn arange(length: usize) -> Self {
        (0..length as i64).collect()
    }

    /// Starts view `[0, len - 1)` of an offsets index.
    pub fn starts_of(offsets: &Index64) -> Index64 {
        if offsets.is_empty() {
            return Index64::default();
        }
        offsets.range(0, offsets.len() - 1)
    }

    /// Stops view `[1, len)` of an offsets index.
    pub fn stops_of(offsets: &Index64) -> Index64 {
        if offsets.is_empty() {
            return Index64::default();
        }
        offsets.range(1, offsets.len())
    }
}

impl<T> From<Vec<T>> for Index<T> {
    #[inline]
    fn from(v: Vec<T>) -> Self {
        Index { data: Buffer::from(v) }
    }
}

impl<T> From<Buffer<T>> for Index<T> {
    #[inline]
    fn from(data: Buffer<T>) -> Self {
        Index { data }
    }
}

impl<T> FromIterator<T> for Index<T> {
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Index {
            data: iter.into_iter().collect(),
        }
    }
}

impl<T: IndexType> Display for Index<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.iter_i64().take(MAX_PREVIEW).enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", v)?;
        }
        if self.len() > MAX_PREVIEW {
            write!(f, " ...")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::Index32;

    #[test]
    fn test_constructors() {
        assert_eq!(Index64::arange(4).as_slice(), &[0, 1, 2, 3]);
        assert_eq!(Index64::zeros(2).as_slice(), &[0, 0]);
        assert_eq!(Index64::full(3, -1).as_slice(), &[-1, -1, -1]);
    }

    #[test]
    fn test_range_and_widen() {
        let i = Index32::from(vec![5i32, 6, 7, 8]);
        let r = i.range(1, 3);
        assert_eq!(r.as_slice(), &[6, 7]);
        assert_eq!(r.to_index64().as_slice(), &[6i64, 7]);
        assert_eq!(i.max_i64(), Some(8));
    }

    #[test]
    fn test_starts_stops_of_offsets() {
        let offsets = Index64::from(vec![0i64, 2, 2, 5]);
        assert_eq!(Index64::starts_of(&offsets).as_slice(), &[0, 2, 2]);
        assert_eq!(Index64::stops_of(&offsets).as_slice(), &[2, 2, 5]);
        assert!(Index64::starts_of(&Index64::default()).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Index64::from(vec![1i64, -1, 3]).to_string(), "[1 -1 3]");
    }
}
