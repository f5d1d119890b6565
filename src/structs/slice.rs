//! # **Slice** - *NumPy-style slice tuples*
//!
//! Builder for the argument of [`Content::getitem`](crate::Content::getitem),
//! plus the normalisation pass that runs before slicing:
//! - boolean masks become one integer array per masked dimension
//! - a zero range step is rejected
//! - two or more integer arrays are broadcast to a common shape

use crate::aliases::{Index64, Result};
use crate::enums::content::Content;
use crate::enums::error::JaggedError;
use crate::enums::slice_item::{SliceArray, SliceItem};

/// # Slice
///
/// An ordered tuple of [`SliceItem`]s.
///
/// ## Example
/// ```rust
/// use jagged::{Slice, SliceItem};
///
/// let s = Slice::new().range(Some(1), None).at(-1).field("x");
/// assert_eq!(s.len(), 3);
/// assert_eq!(s.head(), Some(&SliceItem::Range { start: Some(1), stop: None, step: 1 }));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Slice {
    items: Vec<SliceItem>,
}

impl Slice {
    #[inline]
    pub fn new() -> Self {
        Slice::default()
    }

    pub fn at(self, at: i64) -> Self {
        self.item(SliceItem::At(at))
    }

    pub fn range(self, start: Option<i64>, stop: Option<i64>) -> Self {
        self.range_step(start, stop, 1)
    }

    pub fn range_step(self, start: Option<i64>, stop: Option<i64>, step: i64) -> Self {
        self.item(SliceItem::Range { start, stop, step })
    }

    pub fn ellipsis(self) -> Self {
        self.item(SliceItem::Ellipsis)
    }

    pub fn newaxis(self) -> Self {
        self.item(SliceItem::NewAxis)
    }

    pub fn field(self, key: impl Into<String>) -> Self {
        self.item(SliceItem::Field(key.into()))
    }

    pub fn fields<K: Into<String>>(self, keys: impl IntoIterator<Item = K>) -> Self {
        self.item(SliceItem::Fields(keys.into_iter().map(Into::into).collect()))
    }

    /// One-dimensional integer array.
    pub fn array(self, positions: Vec<i64>) -> Self {
        self.item(SliceItem::Array(SliceArray::flat(positions.into())))
    }

    /// Integer array with a NumPy shape, positions in C order.
    pub fn array_shaped(self, positions: Vec<i64>, shape: Vec<usize>) -> Result<Self> {
        Ok(self.item(SliceItem::Array(SliceArray::new(positions.into(), shape)?)))
    }

    /// One-dimensional boolean mask.
    pub fn bools(self, mask: Vec<bool>) -> Self {
        let shape = vec![mask.len()];
        self.item(SliceItem::Bools { mask, shape })
    }

    /// An array used as an index, see [`SliceItem::from_content`].
    pub fn content(self, index: &Content) -> Result<Self> {
        Ok(self.item(SliceItem::from_content(index)?))
    }

    pub fn item(mut self, item: SliceItem) -> Self {
        self.items.push(item);
        self
    }

    #[inline]
    pub fn items(&self) -> &[SliceItem] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn head(&self) -> Option<&SliceItem> {
        self.items.first()
    }

    /// Everything after the head.
    pub fn tail(&self) -> Slice {
        Slice {
            items: self.items.iter().skip(1).cloned().collect(),
        }
    }

    /// Number of items that consume a dimension.
    pub fn dimlength(&self) -> usize {
        self.items
            .iter()
            .filter(|item| {
                matches!(
                    item,
                    SliceItem::At(_) | SliceItem::Range { .. } | SliceItem::Array(_) | SliceItem::Bools { .. }
                )
            })
            .count()
    }

    /// Normalised copy of this slice, ready for the slicing engine.
    pub fn prepare(&self) -> Result<Slice> {
        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match item {
                SliceItem::Range { step: 0, .. } => {
                    return Err(JaggedError::value("Slice", "slice step cannot be zero"));
                }
                SliceItem::Bools { mask, shape } => items.extend(nonzero(mask, shape)?),
                SliceItem::Array(a) if a.shape().iter().product::<usize>() != a.len() => {
                    return Err(JaggedError::index(
                        "Slice",
                        format!("index array shape {:?} does not match its length {}", a.shape(), a.len()),
                    ));
                }
                other => items.push(other.clone()),
            }
        }
        let arrays = items.iter().filter(|i| matches!(i, SliceItem::Array(_))).count();
        if arrays >= 2 {
            let shapes: Vec<&[usize]> = items
                .iter()
                .filter_map(|i| match i {
                    SliceItem::Array(a) => Some(a.shape()),
                    _ => None,
                })
                .collect();
            let shape = broadcast_shapes(&shapes)?;
            items = items
                .into_iter()
                .map(|item| match item {
                    SliceItem::Array(a) => broadcast_to(&a, &shape).map(SliceItem::Array),
                    other => Ok(other),
                })
                .collect::<Result<Vec<_>>>()?;
        }
        Ok(Slice { items })
    }
}

impl From<Vec<SliceItem>> for Slice {
    fn from(items: Vec<SliceItem>) -> Self {
        Slice { items }
    }
}

impl FromIterator<SliceItem> for Slice {
    fn from_iter<I: IntoIterator<Item = SliceItem>>(iter: I) -> Self {
        Slice {
            items: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.items.iter().map(|i| i.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Coordinates of the `true` entries, one integer array per dimension.
fn nonzero(mask: &[bool], shape: &[usize]) -> Result<Vec<SliceItem>> {
    if shape.iter().product::<usize>() != mask.len() {
        return Err(JaggedError::index(
            "Slice",
            format!("boolean mask shape {:?} does not match its length {}", shape, mask.len()),
        ));
    }
    let ndim = shape.len().max(1);
    let mut coords: Vec<Vec<i64>> = vec![Vec::new(); ndim];
    for (flat, _) in mask.iter().enumerate().filter(|(_, keep)| **keep) {
        let mut rest = flat;
        for d in (0..ndim).rev() {
            let extent = shape.get(d).copied().unwrap_or(mask.len()).max(1);
            coords[d].push((rest % extent) as i64);
            rest /= extent;
        }
    }
    Ok(coords
        .into_iter()
        .map(|c| SliceItem::Array(SliceArray::flat(c.into())))
        .collect())
}

/// NumPy broadcasting of several shapes, aligned at the trailing dimension.
pub(crate) fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    let ndim = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = vec![1usize; ndim];
    for shape in shapes {
        let pad = ndim - shape.len();
        for (d, &extent) in shape.iter().enumerate() {
            let slot = &mut out[pad + d];
            if *slot == 1 {
                *slot = extent;
            } else if extent != 1 && extent != *slot {
                return Err(JaggedError::value(
                    "Slice",
                    format!("cannot broadcast index arrays of shapes {:?} together", shapes),
                ));
            }
        }
    }
    Ok(out)
}

fn broadcast_to(array: &SliceArray, shape: &[usize]) -> Result<SliceArray> {
    if array.shape() == shape {
        return Ok(array.clone());
    }
    let pad = shape.len() - array.shape().len();
    let mut src_strides = vec![0usize; shape.len()];
    let mut stride = 1usize;
    for d in (0..array.shape().len()).rev() {
        if array.shape()[d] != 1 {
            src_strides[pad + d] = stride;
        }
        stride *= array.shape()[d];
    }
    let total: usize = shape.iter().product();
    let mut out = Vec::with_capacity(total);
    for flat in 0..total {
        let mut rest = flat;
        let mut src = 0usize;
        for d in (0..shape.len()).rev() {
            src += (rest % shape[d]) * src_strides[d];
            rest /= shape[d];
        }
        out.push(array.index().get(src));
    }
    SliceArray::new(Index64::from(out), shape.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_and_dimlength() {
        let s = Slice::new().at(0).newaxis().range(None, None).field("x");
        assert_eq!(s.dimlength(), 2);
        assert_eq!(s.tail().len(), 3);
        assert_eq!(s.tail().head(), Some(&SliceItem::NewAxis));
    }

    #[test]
    fn test_zero_step_rejected() {
        let s = Slice::new().range_step(None, None, 0);
        assert!(s.prepare().is_err());
    }

    #[test]
    fn test_bools_become_positions() {
        let s = Slice::new().bools(vec![true, false, true]).prepare().unwrap();
        assert_eq!(
            s.head(),
            Some(&SliceItem::Array(SliceArray::flat(Index64::from(vec![0i64, 2]))))
        );
    }

    #[test]
    fn test_two_dimensional_bools() {
        let s = Slice::new()
            .item(SliceItem::Bools {
                mask: vec![false, true, true, false],
                shape: vec![2, 2],
            })
            .prepare()
            .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.items()[0], SliceItem::Array(SliceArray::flat(Index64::from(vec![0i64, 1]))));
        assert_eq!(s.items()[1], SliceItem::Array(SliceArray::flat(Index64::from(vec![1i64, 0]))));
    }

    #[test]
    fn test_broadcast_arrays() {
        let s = Slice::new()
            .array_shaped(vec![0, 1], vec![2, 1])
            .unwrap()
            .array(vec![2, 0, 1])
            .prepare()
            .unwrap();
        match (&s.items()[0], &s.items()[1]) {
            (SliceItem::Array(a), SliceItem::Array(b)) => {
                assert_eq!(a.shape(), &[2, 3]);
                assert_eq!(a.index().as_slice(), &[0, 0, 0, 1, 1, 1]);
                assert_eq!(b.shape(), &[2, 3]);
                assert_eq!(b.index().as_slice(), &[2, 0, 1, 2, 0, 1]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_incompatible_broadcast() {
        let s = Slice::new().array(vec![0, 1]).array(vec![0, 1, 2]);
        assert!(s.prepare().is_err());
    }
}
