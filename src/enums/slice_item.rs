//! # **Slice Items** - *One entry of a NumPy-style slice tuple*
//!
//! A [`Slice`](crate::Slice) is a sequence of [`SliceItem`]s. Integer and
//! boolean arrays are carried flattened with their shape; option-typed and
//! variable-length index arrays become [`SliceMissing`] and [`SliceJagged`]
//! trees, usually built from an index [`Content`] with
//! [`SliceItem::from_content`].

use std::fmt::{self, Display, Formatter};

use crate::aliases::{Index64, Result};
use crate::enums::content::Content;
use crate::enums::dtype::DType;
use crate::enums::error::JaggedError;
use crate::match_numpy;
use crate::structs::variants::numpy::NumpyArray;
use crate::traits::layout::Layout;
use crate::traits::primitive::NumpyPrimitive;

#[derive(Clone, Debug, PartialEq)]
pub enum SliceItem {
    /// A single position; removes the dimension.
    At(i64),
    /// Python `start:stop:step`; `step` is never zero after preparation.
    Range {
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    },
    /// `...`: as many full ranges as needed to reach the remaining items.
    Ellipsis,
    /// `np.newaxis`: inserts a length-1 regular dimension.
    NewAxis,
    Field(String),
    Fields(Vec<String>),
    /// Integer positions with a NumPy shape.
    Array(SliceArray),
    /// Boolean mask with a NumPy shape; rewritten to `Array` items by
    /// [`Slice::prepare`](crate::Slice::prepare).
    Bools { mask: Vec<bool>, shape: Vec<usize> },
    Missing(SliceMissing),
    Jagged(SliceJagged),
}

impl SliceItem {
    /// `:`
    #[inline]
    pub fn full_range() -> SliceItem {
        SliceItem::Range {
            start: None,
            stop: None,
            step: 1,
        }
    }

    /// True for items that can only appear inside an advanced index.
    pub fn is_advanced(&self) -> bool {
        matches!(
            self,
            SliceItem::Array(_) | SliceItem::Bools { .. } | SliceItem::Missing(_) | SliceItem::Jagged(_)
        )
    }

    /// Converts an array used as an index into a slice item.
    ///
    /// - integer leaves become `Array`, boolean leaves become `Bools`
    /// - regular dimensions of integers become a multi-dimensional `Array`
    /// - variable-length lists become `Jagged`, with boolean sublists turned
    ///   into local positions
    /// - option types become `Missing`, where a missing boolean keeps its
    ///   place as a missing position
    pub fn from_content(content: &Content) -> Result<SliceItem> {
        if let Some(array) = regular_int_array(content)? {
            return Ok(SliceItem::Array(array));
        }
        match content {
            Content::Empty(_) => Ok(SliceItem::Array(SliceArray::flat(Index64::default()))),
            Content::Numpy(n) => numpy_item(n),
            Content::Indexed32(_) | Content::IndexedU32(_) | Content::Indexed64(_) => {
                SliceItem::from_content(&content.project()?)
            }
            Content::Unmasked(u) => SliceItem::from_content(u.content()),
            Content::IndexedOption32(_)
            | Content::IndexedOption64(_)
            | Content::ByteMasked(_)
            | Content::BitMasked(_) => {
                let option = content.to_indexed_option_array64()?;
                let projected = option.project()?;
                if projected_is_bool(&projected) {
                    let valid = bool_values(&projected)?;
                    let (positions, index) = option_bool_positions(option.index(), &valid);
                    return Ok(SliceItem::Missing(SliceMissing::new(
                        index,
                        SliceItem::Array(SliceArray::flat(positions)),
                    )));
                }
                let inner = SliceItem::from_content(&projected)?;
                let outindex = option_ranks(option.index());
                Ok(SliceItem::Missing(SliceMissing::new(outindex, inner)))
            }
            Content::Regular(_)
            | Content::List32(_)
            | Content::ListU32(_)
            | Content::List64(_)
            | Content::ListOffset32(_)
            | Content::ListOffsetU32(_)
            | Content::ListOffset64(_) => {
                let lists = content.to_list_offset_array64(true)?;
                let offsets = lists.offsets().clone();
                let inner = lists.content().getitem_range_nowrap(0, lists.content_stop())?;
                jagged_item(offsets, &inner)
            }
            other => Err(JaggedError::type_error(format!(
                "{} cannot be used as an index; only integers, slices, ellipsis, newaxis, \
                 field names, and integer or boolean arrays (possibly jagged) are valid indices",
                other.classname()
            ))),
        }
    }
}

/// A regular (rectangular) nest of integer leaves, flattened with its shape.
fn regular_int_array(content: &Content) -> Result<Option<SliceArray>> {
    let Content::Regular(_) = content else {
        return Ok(None);
    };
    let mut shape = vec![content.length()];
    let mut node = content.clone();
    while let Content::Regular(r) = &node {
        shape.push(r.size());
        let trimmed = r.content().getitem_range_nowrap(0, r.length() * r.size())?;
        node = trimmed;
    }
    Ok(match &node {
        Content::Numpy(n) if n.dtype().is_integer() && n.shape().len() == 1 => {
            Some(SliceArray::new(n.to_index64(), shape)?)
        }
        _ => None,
    })
}

fn numpy_item(n: &NumpyArray) -> Result<SliceItem> {
    match n.dtype() {
        DType::Bool => Ok(SliceItem::Bools {
            mask: bool_values(&n.clone().into())?,
            shape: n.shape().to_vec(),
        }),
        d if d.is_integer() => Ok(SliceItem::Array(SliceArray::new(n.to_index64(), n.shape().to_vec())?)),
        d => Err(JaggedError::type_error(format!(
            "arrays used as an index must be integer or boolean, not {}",
            d
        ))),
    }
}

fn projected_is_bool(content: &Content) -> bool {
    matches!(content, Content::Numpy(n) if n.dtype() == DType::Bool)
}

fn bool_values(content: &Content) -> Result<Vec<bool>> {
    match content {
        Content::Numpy(n) => Ok(match_numpy!(n.data(), buf => buf.iter().map(|v| v.is_nonzero()).collect())),
        other => Err(JaggedError::type_error(format!(
            "expected a boolean array, found {}",
            other.classname()
        ))),
    }
}

/// For an option of booleans inside one list: positions of `true` entries and
/// a missing-index that marks `None` entries as `-1`.
fn option_bool_positions(index: &Index64, valid: &[bool]) -> (Index64, Index64) {
    let mut positions = Vec::new();
    let mut outindex = Vec::new();
    let mut rank = 0usize;
    for (local, raw) in index.iter_i64().enumerate() {
        if raw < 0 {
            outindex.push(-1);
        } else {
            if valid[rank] {
                outindex.push(positions.len() as i64);
                positions.push(local as i64);
            }
            rank += 1;
        }
    }
    (positions.into(), outindex.into())
}

/// `-1` for missing entries, the running count of valid entries otherwise.
fn option_ranks(index: &Index64) -> Index64 {
    let mut rank = 0i64;
    index
        .iter_i64()
        .map(|raw| {
            if raw < 0 {
                -1
            } else {
                rank += 1;
                rank - 1
            }
        })
        .collect()
}

fn jagged_item(offsets: Index64, inner: &Content) -> Result<SliceItem> {
    if inner.is_option() {
        let option = inner.to_indexed_option_array64()?;
        let projected = option.project()?;
        if projected_is_bool(&projected) {
            return jagged_option_bools(&offsets, option.index(), &bool_values(&projected)?);
        }
    }
    match SliceItem::from_content(inner)? {
        SliceItem::Bools { mask, .. } => {
            let mut outoffsets = Vec::with_capacity(offsets.len());
            let mut positions = Vec::new();
            outoffsets.push(0i64);
            for i in 0..offsets.len().saturating_sub(1) {
                let start = offsets.get(i) as usize;
                let stop = offsets.get(i + 1) as usize;
                for (local, keep) in mask[start..stop].iter().enumerate() {
                    if *keep {
                        positions.push(local as i64);
                    }
                }
                outoffsets.push(positions.len() as i64);
            }
            Ok(SliceItem::Jagged(SliceJagged::new(
                outoffsets.into(),
                SliceItem::Array(SliceArray::flat(positions.into())),
            )?))
        }
        SliceItem::Array(ref a) if a.shape().len() > 1 => Err(JaggedError::type_error(
            "a jagged index cannot contain multi-dimensional integer arrays",
        )),
        other => Ok(SliceItem::Jagged(SliceJagged::new(offsets, other)?)),
    }
}

/// Booleans with missing values inside lists: `true` keeps its local
/// position, `None` stays a missing position, `false` is dropped.
fn jagged_option_bools(offsets: &Index64, index: &Index64, valid: &[bool]) -> Result<SliceItem> {
    let mut outoffsets = vec![0i64];
    let mut outindex = Vec::new();
    let mut positions = Vec::new();
    let mut rank = 0usize;
    for i in 0..offsets.len().saturating_sub(1) {
        let start = offsets.get(i) as usize;
        let stop = offsets.get(i + 1) as usize;
        for local in 0..(stop - start) {
            if index.get(start + local) < 0 {
                outindex.push(-1);
            } else {
                if valid[rank] {
                    outindex.push(positions.len() as i64);
                    positions.push(local as i64);
                }
                rank += 1;
            }
        }
        outoffsets.push(outindex.len() as i64);
    }
    Ok(SliceItem::Jagged(SliceJagged::new(
        outoffsets.into(),
        SliceItem::Missing(SliceMissing::new(
            outindex.into(),
            SliceItem::Array(SliceArray::flat(positions.into())),
        )),
    )?))
}

impl Display for SliceItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SliceItem::At(at) => write!(f, "{}", at),
            SliceItem::Range { start, stop, step } => {
                if let Some(s) = start {
                    write!(f, "{}", s)?;
                }
                f.write_str(":")?;
                if let Some(s) = stop {
                    write!(f, "{}", s)?;
                }
                if *step != 1 {
                    write!(f, ":{}", step)?;
                }
                Ok(())
            }
            SliceItem::Ellipsis => f.write_str("..."),
            SliceItem::NewAxis => f.write_str("newaxis"),
            SliceItem::Field(k) => write!(f, "{:?}", k),
            SliceItem::Fields(ks) => write!(f, "{:?}", ks),
            SliceItem::Array(a) => write!(f, "array({})", a.index()),
            SliceItem::Bools { mask, .. } => write!(f, "bools(len={})", mask.len()),
            SliceItem::Missing(m) => write!(f, "missing({}, {})", m.index(), m.content()),
            SliceItem::Jagged(j) => write!(f, "jagged({}, {})", j.offsets(), j.content()),
        }
    }
}

/// Integer positions in C order plus their NumPy shape.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceArray {
    index: Index64,
    shape: Vec<usize>,
}

impl SliceArray {
    pub fn new(index: Index64, shape: Vec<usize>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if shape.is_empty() || expected != index.len() {
            return Err(JaggedError::index(
                "SliceArray",
                format!(
                    "index array of length {} does not fit shape {:?}",
                    index.len(),
                    shape
                ),
            ));
        }
        Ok(SliceArray { index, shape })
    }

    /// One-dimensional array.
    pub fn flat(index: Index64) -> Self {
        let shape = vec![index.len()];
        SliceArray { index, shape }
    }

    #[inline]
    pub fn index(&self) -> &Index64 {
        &self.index
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// An option-typed index: `index[i] < 0` marks a missing position, other
/// entries point into the positions selected by `content`.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceMissing {
    index: Index64,
    content: Box<SliceItem>,
}

impl SliceMissing {
    pub fn new(index: Index64, content: SliceItem) -> Self {
        SliceMissing {
            index,
            content: Box::new(content),
        }
    }

    #[inline]
    pub fn index(&self) -> &Index64 {
        &self.index
    }

    #[inline]
    pub fn content(&self) -> &SliceItem {
        &self.content
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// A variable-length index: row `i` is `content[offsets[i]..offsets[i + 1]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceJagged {
    offsets: Index64,
    content: Box<SliceItem>,
}

impl SliceJagged {
    pub fn new(offsets: Index64, content: SliceItem) -> Result<Self> {
        if offsets.is_empty() {
            return Err(JaggedError::value("SliceJagged", "offsets must not be empty"));
        }
        if !matches!(
            content,
            SliceItem::Array(_) | SliceItem::Missing(_) | SliceItem::Jagged(_)
        ) {
            return Err(JaggedError::type_error(
                "a jagged index must contain integer arrays, option arrays or jagged arrays",
            ));
        }
        Ok(SliceJagged {
            offsets,
            content: Box::new(content),
        })
    }

    /// Builds from nested rows of integer positions.
    pub fn from_rows(rows: &[Vec<i64>]) -> Result<Self> {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        offsets.push(0i64);
        let mut flat = Vec::new();
        for row in rows {
            flat.extend_from_slice(row);
            offsets.push(flat.len() as i64);
        }
        SliceJagged::new(offsets.into(), SliceItem::Array(SliceArray::flat(flat.into())))
    }

    #[inline]
    pub fn offsets(&self) -> &Index64 {
        &self.offsets
    }

    #[inline]
    pub fn content(&self) -> &SliceItem {
        &self.content
    }

    /// Number of rows.
    #[inline]
    pub fn length(&self) -> usize {
        self.offsets.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndexedOptionArray, ListOffsetArray};

    #[test]
    fn test_from_integer_content() {
        let idx: Content = NumpyArray::from_vec(vec![2i64, 0]).into();
        match SliceItem::from_content(&idx).unwrap() {
            SliceItem::Array(a) => assert_eq!(a.index().as_slice(), &[2, 0]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_float_content_is_type_error() {
        let idx: Content = NumpyArray::from_vec(vec![1.0f64]).into();
        assert!(SliceItem::from_content(&idx).is_err());
    }

    #[test]
    fn test_from_jagged_bool_content() {
        let flat: Content = NumpyArray::from_vec(vec![true, false, true, false, true]).into();
        let jagged: Content = ListOffsetArray::new(Index64::from(vec![0i64, 3, 3, 5]), flat)
            .unwrap()
            .into();
        match SliceItem::from_content(&jagged).unwrap() {
            SliceItem::Jagged(j) => {
                assert_eq!(j.offsets().as_slice(), &[0, 2, 2, 3]);
                match j.content() {
                    SliceItem::Array(a) => assert_eq!(a.index().as_slice(), &[0, 2, 1]),
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_option_content() {
        let values: Content = NumpyArray::from_vec(vec![3i64, 1]).into();
        let option: Content =
            IndexedOptionArray::new(Index64::from(vec![0i64, -1, 1]), values).unwrap().into();
        match SliceItem::from_content(&option).unwrap() {
            SliceItem::Missing(m) => {
                assert_eq!(m.index().as_slice(), &[0, -1, 1]);
                assert_eq!(m.content(), &SliceItem::Array(SliceArray::flat(Index64::from(vec![3i64, 1]))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_shape_must_match() {
        assert!(SliceArray::new(Index64::from(vec![1i64, 2, 3]), vec![2, 2]).is_err());
        assert!(SliceJagged::new(Index64::default(), SliceItem::At(0)).is_err());
    }
}
