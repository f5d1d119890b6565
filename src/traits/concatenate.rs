//! # Concatenate Trait Module
//!
//! Merging of layout trees, end to end.
//!
//! ## Overview
//! - [`Content::mergeable`] decides from types alone whether two trees can
//!   share one layout. It is symmetric.
//! - [`Content::merge`] appends `other` after `self`. Empty arrays vanish,
//!   options and indexed nodes on either side are kept lazy, NumPy leaves
//!   promote their dtype, lists of any kind merge into a `ListArray64`,
//!   records merge field by field.
//! - Everything else becomes a `UnionArray`, which is then simplified.
//!
//! ## Consuming Semantics
//! [`Concatenate::concat`] takes both inputs by value. Trees share their
//! buffers, so cloning before a `concat` is cheap.
//!
//! ## Example
//! ```rust
//! use jagged::{Concatenate, Content, NumpyArray};
//!
//! let a: Content = NumpyArray::from_vec(vec![1i64, 2]).into();
//! let b: Content = NumpyArray::from_vec(vec![0.5f64]).into();
//! let merged = a.concat(b).unwrap();
//! assert_eq!(merged.to_value().unwrap().to_json(), "[1.0,2.0,0.5]");
//! ```

use log::trace;

use crate::aliases::{Index64, Index8, Result};
use crate::enums::content::Content;
use crate::match_content;
use crate::structs::index::Index;
use crate::structs::variants::empty::EmptyArray;
use crate::structs::variants::indexed_option::IndexedOptionArray;
use crate::structs::variants::list::ListArray;
use crate::structs::variants::union::UnionArray;
use crate::traits::index_type::IndexType;
use crate::traits::layout::Layout;

/// Combines two instances of the same type, consuming both.
pub trait Concatenate {
    /// `self` followed by `other`.
    fn concat(self, other: Self) -> Result<Self>
    where
        Self: Sized;
}

impl Concatenate for Content {
    fn concat(self, other: Self) -> Result<Self> {
        self.merge(&other)
    }
}

impl<T: IndexType> Concatenate for Index<T> {
    fn concat(self, other: Self) -> Result<Self> {
        Ok(self.as_slice().iter().chain(other.as_slice()).copied().collect())
    }
}

/// Strips option and indexed wrappers.
fn unwrapped(content: &Content) -> Content {
    let mut current = content.clone();
    while current.is_option() || current.is_indexed() {
        match current.children().into_iter().next() {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

/// Mergeability of a list node whose content is `content` with `other`.
pub(crate) fn lists_mergeable(content: &Content, other: &Content, mergebool: bool) -> bool {
    let other = unwrapped(other);
    match &other {
        Content::Empty(_) => true,
        _ if other.is_union() => true,
        Content::Numpy(n) if n.ndim() > 1 => n
            .to_regular_array()
            .is_ok_and(|regular| lists_mergeable(content, &regular, mergebool)),
        _ if other.is_list() => other
            .children()
            .first()
            .is_some_and(|inner| content.mergeable(inner, mergebool)),
        _ => false,
    }
}

/// Starts, stops and content of any list-like node.
fn list_parts(content: &Content) -> Result<(Index64, Index64, Content)> {
    match content {
        Content::List32(l) => Ok((l.starts().to_index64(), l.stops().to_index64(), l.content().clone())),
        Content::ListU32(l) => Ok((l.starts().to_index64(), l.stops().to_index64(), l.content().clone())),
        Content::List64(l) => Ok((l.starts().clone(), l.stops().clone(), l.content().clone())),
        Content::Numpy(n) if n.ndim() > 1 => list_parts(&n.to_regular_array()?),
        other => {
            let lists = other.to_list_offset_array64(false)?;
            let offsets = lists.offsets();
            Ok((Index64::starts_of(offsets), Index64::stops_of(offsets), lists.content().clone()))
        }
    }
}

/// Two list-like nodes as one `ListArray64`: the contents are merged and
/// the second node's ranges shifted past the first content.
pub(crate) fn merge_lists(this: &Content, other: &Content) -> Result<Content> {
    let (starts, stops, content) = list_parts(this)?;
    let (otherstarts, otherstops, othercontent) = list_parts(other)?;
    let shift = content.length() as i64;
    let shifted = |index: Index64| -> Index64 { index.iter_i64().map(|j| j + shift).collect() };
    let starts = starts.concat(shifted(otherstarts))?;
    let stops = stops.concat(shifted(otherstops))?;
    let merged = content.merge(&othercontent)?;
    let out = ListArray::new(starts, stops, merged)?;
    if this.parameters() == other.parameters() {
        Ok(out.replace_parameters(this.parameters().clone()).into())
    } else {
        Ok(out.into())
    }
}

/// `this` followed by `other` as a two-content union, simplified.
pub(crate) fn merge_as_union(this: &Content, other: &Content) -> Result<Content> {
    let (a, b) = (this.length(), other.length());
    let tags: Index8 = std::iter::repeat_n(0i8, a).chain(std::iter::repeat_n(1i8, b)).collect();
    let index: Index64 = (0..a as i64).chain(0..b as i64).collect();
    UnionArray::new(tags, index, vec![this.clone(), other.clone()])?.simplify()
}

/// Left fold of [`Content::merge`]; no inputs give an `EmptyArray`.
pub fn merge_many(contents: &[Content]) -> Result<Content> {
    let mut iter = contents.iter();
    let Some(first) = iter.next() else {
        return Ok(EmptyArray::new().into());
    };
    iter.try_fold(first.clone(), |acc, next| acc.merge(next))
}

impl Content {
    /// Whether `self` and `other` can share a layout without a union.
    ///
    /// Option and indexed wrappers are looked through. `__array__`
    /// parameters must agree, so strings never merge with plain lists.
    pub fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        let (a, b) = (unwrapped(self), unwrapped(other));
        if matches!(a, Content::Empty(_)) || matches!(b, Content::Empty(_)) {
            return true;
        }
        if a.is_union() || b.is_union() {
            return true;
        }
        if a.array_parameter() != b.array_parameter() {
            return false;
        }
        match_content!(&a, node => node.mergeable(&b, mergebool))
    }

    /// `self` followed by `other`.
    pub fn merge(&self, other: &Content) -> Result<Content> {
        trace!("merge {} ({}) with {} ({})", self.classname(), self.length(), other.classname(), other.length());
        self.merge_next(other)?.checked()
    }

    fn merge_next(&self, other: &Content) -> Result<Content> {
        if matches!(other, Content::Empty(_)) {
            return Ok(self.clone());
        }
        if matches!(self, Content::Empty(_)) {
            return Ok(other.clone());
        }
        if self.is_union() || other.is_union() || !self.mergeable(other, true) {
            return merge_as_union(self, other);
        }
        if self.is_option() || self.is_indexed() {
            return match_content!(self, node => node.merge(other))?.simplify();
        }
        if other.is_indexed() {
            return self.merge_next(&other.project()?);
        }
        if other.is_option() {
            let option = other.simplify()?.to_indexed_option_array64()?;
            let offset = self.length() as i64;
            let index: Index64 = (0..offset)
                .chain(option.index().iter_i64().map(|j| if j < 0 { -1 } else { j + offset }))
                .collect();
            let content = self.merge_next(option.content())?;
            return Ok(IndexedOptionArray::new(index, content)?.into());
        }
        match_content!(self, node => node.merge(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::Index64;
    use crate::structs::variants::list_offset::ListOffsetArray;
    use crate::structs::variants::numpy::NumpyArray;
    use crate::structs::variants::record::RecordArray;
    use crate::structs::variants::regular::RegularArray;

    fn lists(offsets: Vec<i64>, values: Vec<i64>) -> Content {
        let flat: Content = NumpyArray::from_vec(values).into();
        ListOffsetArray::new(Index64::from(offsets), flat).unwrap().into()
    }

    #[test]
    fn test_index_concat() {
        let a = Index64::from(vec![1i64, 2]);
        let b = Index64::from(vec![3i64]);
        assert_eq!(a.concat(b).unwrap().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_empty_is_identity_on_both_sides() {
        let a = lists(vec![0, 2, 3], vec![1, 2, 3]);
        let empty: Content = EmptyArray::new().into();
        assert_eq!(a.merge(&empty).unwrap().to_value().unwrap(), a.to_value().unwrap());
        assert_eq!(empty.merge(&a).unwrap().to_value().unwrap(), a.to_value().unwrap());
    }

    #[test]
    fn test_lists_merge_into_list_array() {
        let a = lists(vec![0, 2, 3], vec![1, 2, 3]);
        let b = lists(vec![1, 1, 3], vec![9, 4, 5]);
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.classname(), "ListArray64");
        assert_eq!(merged.to_value().unwrap().to_json(), "[[1,2],[3],[],[4,5]]");
    }

    #[test]
    fn test_regular_same_size_stays_regular() {
        let flat: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4, 5, 6]).into();
        let a: Content = RegularArray::new(flat.clone(), 2, 0).unwrap().into();
        let b: Content = RegularArray::new(flat.getitem_range_nowrap(0, 2).unwrap(), 2, 0).unwrap().into();
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.classname(), "RegularArray");
        assert_eq!(merged.length(), 4);
    }

    #[test]
    fn test_option_on_the_right() {
        let a: Content = NumpyArray::from_vec(vec![1i64, 2]).into();
        let values: Content = NumpyArray::from_vec(vec![3i64]).into();
        let b: Content = IndexedOptionArray::new(Index64::from(vec![-1i64, 0]), values).unwrap().into();
        let merged = a.merge(&b).unwrap();
        assert!(merged.is_option());
        assert_eq!(merged.to_value().unwrap().to_json(), "[1,2,null,3]");
    }

    #[test]
    fn test_incompatible_becomes_union() {
        let a: Content = NumpyArray::from_vec(vec![1i64]).into();
        let b = lists(vec![0, 1], vec![2]);
        assert!(!a.mergeable(&b, true));
        let merged = a.merge(&b).unwrap();
        assert!(merged.is_union());
        assert_eq!(merged.to_value().unwrap().to_json(), "[1,[2]]");
    }

    #[test]
    fn test_records_merge_by_name() {
        let x1: Content = NumpyArray::from_vec(vec![1i64]).into();
        let y1: Content = NumpyArray::from_vec(vec![0.5f64]).into();
        let x2: Content = NumpyArray::from_vec(vec![2i64]).into();
        let y2: Content = NumpyArray::from_vec(vec![1.5f64]).into();
        let a: Content = RecordArray::from_fields(vec![("x", x1), ("y", y1)]).unwrap().into();
        let b: Content = RecordArray::from_fields(vec![("y", y2), ("x", x2)]).unwrap().into();
        let merged = a.merge(&b).unwrap();
        assert_eq!(
            merged.to_value().unwrap().to_json(),
            r#"[{"x":1,"y":0.5},{"x":2,"y":1.5}]"#
        );
    }

    #[test]
    fn test_merge_many_is_associative() {
        let a = lists(vec![0, 1], vec![1]);
        let b: Content = NumpyArray::from_vec(vec![2i64]).into();
        let c = lists(vec![0, 2], vec![3, 4]);
        let left = a.merge(&b).unwrap().merge(&c).unwrap();
        let right = a.merge(&b.merge(&c).unwrap()).unwrap();
        assert_eq!(left.to_value().unwrap(), right.to_value().unwrap());
        let folded = merge_many(&[a, b, c]).unwrap();
        assert_eq!(folded.to_value().unwrap().to_json(), "[[1],2,[3,4]]");
        assert_eq!(merge_many(&[]).unwrap().length(), 0);
    }
}
