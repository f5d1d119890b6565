//! # **Buffer** - *Shared immutable data storage*
//!
//! Buffer backs every index, mask and leaf array in *jagged*.
//!
//! # Design
//! `Buffer<T>` is a window (`offset`, `len`) over an [`Arc`]-shared
//! [`Vec64<T>`], the 64-byte aligned vector from the `vec64` crate.
//! - Nodes are immutable once built, so buffers never need copy-on-write.
//! - Range slicing of a layout node only narrows the window, which is what
//!   lets a sliced tree share the untouched buffers of its source.
//! - Cloning is a reference-count bump.
//!
//! ## Typical use
//! ```rust
//! use jagged::Buffer;
//!
//! let b = Buffer::from(vec![1u32, 2, 3, 4]);
//! let w = b.slice(1, 3);
//! assert_eq!(w.as_slice(), &[2, 3]);
//! assert_eq!(b.len(), 4);
//! ```

use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Deref;
use std::sync::Arc;

use vec64::Vec64;

use crate::traits::print::MAX_PREVIEW;

/// # Buffer
///
/// Read-only, shareable view over 64-byte aligned storage.
///
/// ### Behaviour:
/// - **Semantically equivalent to `&[T]`** through `Deref`.
/// - `slice` is zero-copy and clamps nothing: callers pass valid bounds.
/// - Building new data always goes through `Vec64<T>` or `Vec<T>` and `From`.
pub struct Buffer<T> {
    data: Arc<Vec64<T>>,
    offset: usize,
    len: usize,
}

impl<T> Buffer<T> {
    /// Construct from an owned Vec64<T>.
    #[inline]
    pub fn from_vec64(v: Vec64<T>) -> Self {
        let len = v.len();
        Self {
            data: Arc::new(v),
            offset: 0,
            len,
        }
    }

    /// Returns the buffer as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data.as_slice()[self.offset..self.offset + self.len]
    }

    /// Returns the number of elements in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Zero-copy window `[start, stop)` relative to this buffer.
    ///
    /// # Panics
    /// If `start > stop` or `stop > len`. Node code checks bounds first.
    #[inline]
    pub fn slice(&self, start: usize, stop: usize) -> Self {
        assert!(start <= stop && stop <= self.len, "Buffer::slice out of bounds");
        Self {
            data: Arc::clone(&self.data),
            offset: self.offset + start,
            len: stop - start,
        }
    }

    /// True when both buffers view the same allocation.
    #[inline]
    pub fn shares_storage(&self, other: &Buffer<T>) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl<T: Clone> Buffer<T> {
    /// Construct an owned buffer from a slice, copying the data into an aligned Vec64.
    #[inline]
    pub fn from_slice(slice: &[T]) -> Self {
        slice.iter().cloned().collect()
    }

    /// Copies the window out into a plain vector.
    #[inline]
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

impl<T> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            offset: self.offset,
            len: self.len,
        }
    }
}

impl<T: PartialEq> PartialEq for Buffer<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Debug> Debug for Buffer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Buffer").field(&self.as_slice()).finish()
    }
}

impl<T> Default for Buffer<T> {
    #[inline]
    fn default() -> Self {
        Buffer::from_vec64(Vec64::with_capacity(0))
    }
}

impl<T> Deref for Buffer<T> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsRef<[T]> for Buffer<T> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> From<Vec64<T>> for Buffer<T> {
    #[inline]
    fn from(v: Vec64<T>) -> Self {
        Buffer::from_vec64(v)
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    #[inline]
    fn from(v: Vec<T>) -> Self {
        v.into_iter().collect()
    }
}

impl<T> FromIterator<T> for Buffer<T> {
    #[inline]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut v = Vec64::with_capacity(iter.size_hint().0);
        for x in iter {
            v.push(x);
        }
        Buffer::from_vec64(v)
    }
}

impl<'a, T> IntoIterator for &'a Buffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T: Display> Display for Buffer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let len = self.len();
        write!(f, "[")?;
        for (i, val) in self.iter().take(MAX_PREVIEW).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{val}")?;
        }
        if len > MAX_PREVIEW {
            write!(f, ", … ({} total)", len)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_and_slice() {
        let b = Buffer::from(vec![10i64, 20, 30, 40, 50]);
        assert_eq!(b.len(), 5);
        let w = b.slice(1, 4);
        assert_eq!(w.as_slice(), &[20, 30, 40]);
        let ww = w.slice(1, 2);
        assert_eq!(ww.as_slice(), &[30]);
        assert!(ww.shares_storage(&b));
    }

    #[test]
    fn test_empty_window() {
        let b = Buffer::from(vec![1u8, 2, 3]);
        let w = b.slice(3, 3);
        assert!(w.is_empty());
        assert_eq!(w.as_slice(), &[] as &[u8]);
    }

    #[test]
    #[should_panic]
    fn test_slice_out_of_bounds_panics() {
        let b = Buffer::from(vec![1u8, 2, 3]);
        let _ = b.slice(2, 4);
    }

    #[test]
    fn test_equality_ignores_window_origin() {
        let a = Buffer::from(vec![1, 2, 3, 2, 3]);
        assert_eq!(a.slice(1, 3), a.slice(3, 5));
        assert_eq!(Buffer::<i32>::default().len(), 0);
    }

    #[test]
    fn test_display_preview() {
        let b: Buffer<i32> = (0..3).collect();
        assert_eq!(b.to_string(), "[0, 1, 2]");
        let big: Buffer<i32> = (0..100).collect();
        assert!(big.to_string().ends_with("… (100 total)]"));
    }
}
