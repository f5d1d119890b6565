//! # **Structure Kernels** - *Option, union and offset bookkeeping*
//!
//! Loops shared by the option, indexed and union nodes: projecting out
//! missing values, re-inserting them, composing nested indexes, and the
//! tag/index rewriting used when unions are simplified or flattened.

use crate::aliases::{Index64, Index8};
use crate::enums::error::KernelError;
use crate::kernels::getitem::KernelResult;
use crate::structs::index::Index;
use crate::traits::index_type::IndexType;

/// Splits an option index into the carry of valid entries and an outer
/// index that is `-1` for missing entries and the valid rank otherwise.
pub fn indexedarray_getitem_nextcarry_outindex<T: IndexType>(
    index: &Index<T>,
    lencontent: usize,
) -> KernelResult<(Index64, Index64)> {
    let mut nextcarry = Vec::with_capacity(index.len());
    let mut outindex = Vec::with_capacity(index.len());
    for (i, j) in index.iter_i64().enumerate() {
        if j >= lencontent as i64 {
            return Err(KernelError::index(
                "indexedarray_getitem_nextcarry_outindex",
                "index out of range",
                i as i64,
                j,
            ));
        }
        if j < 0 {
            outindex.push(-1);
        } else {
            outindex.push(nextcarry.len() as i64);
            nextcarry.push(j);
        }
    }
    Ok((nextcarry.into(), outindex.into()))
}

/// Carry of a non-option index, rejecting negative entries.
pub fn indexedarray_getitem_nextcarry<T: IndexType>(index: &Index<T>, lencontent: usize) -> KernelResult<Index64> {
    let mut out = Vec::with_capacity(index.len());
    for (i, j) in index.iter_i64().enumerate() {
        if j < 0 || j >= lencontent as i64 {
            return Err(KernelError::index("indexedarray_getitem_nextcarry", "index out of range", i as i64, j));
        }
        out.push(j);
    }
    Ok(out.into())
}

pub fn indexedarray_numnull<T: IndexType>(index: &Index<T>) -> usize {
    index.iter_i64().filter(|&j| j < 0).count()
}

/// `outer[i] < 0 ? -1 : inner[outer[i]]`
pub fn indexedarray_simplify<T: IndexType, U: IndexType>(outer: &Index<T>, inner: &Index<U>) -> KernelResult<Index64> {
    let mut out = Vec::with_capacity(outer.len());
    for (i, j) in outer.iter_i64().enumerate() {
        if j < 0 {
            out.push(-1);
        } else if j as usize >= inner.len() {
            return Err(KernelError::index("indexedarray_simplify", "index out of range", i as i64, j));
        } else {
            out.push(inner.get_i64(j as usize));
        }
    }
    Ok(out.into())
}

/// Keeps the entries of `values` at positions where `outindex >= 0`.
pub fn index_filter_valid(values: &Index64, outindex: &Index64) -> Index64 {
    values
        .iter_i64()
        .zip(outindex.iter_i64())
        .filter_map(|(v, o)| (o >= 0).then_some(v))
        .collect()
}

/// Option index of a byte mask: position where valid, `-1` otherwise.
pub fn bytemaskedarray_to_index(mask: &Index8, valid_when: bool) -> Index64 {
    mask.iter_i64()
        .enumerate()
        .map(|(i, m)| if (m != 0) == valid_when { i as i64 } else { -1 })
        .collect()
}

/// Repeats a missing-value slice over every row of a regular result.
///
/// Entry `j` of row `i` is `index[j] + i * size`, or `-1` where the slice
/// itself is missing.
pub fn missing_repeat(index: &Index64, repetitions: usize, size: usize) -> Index64 {
    let mut out = Vec::with_capacity(index.len() * repetitions);
    for i in 0..repetitions as i64 {
        out.extend(index.iter_i64().map(|j| if j >= 0 { j + i * size as i64 } else { -1 }));
    }
    out.into()
}

/// Rank of every element among the elements sharing its tag.
pub fn unionarray_regular_index(tags: &Index8) -> KernelResult<Index64> {
    let mut counts: Vec<i64> = Vec::new();
    let mut out = Vec::with_capacity(tags.len());
    for (i, tag) in tags.iter_i64().enumerate() {
        if tag < 0 {
            return Err(KernelError::index("unionarray_regular_index", "negative tag", i as i64, tag));
        }
        let tag = tag as usize;
        if counts.len() <= tag {
            counts.resize(tag + 1, 0);
        }
        out.push(counts[tag]);
        counts[tag] += 1;
    }
    Ok(out.into())
}

/// Index entries of the elements tagged `which`, in order.
pub fn unionarray_project<T: IndexType>(tags: &Index8, index: &Index<T>, which: i8) -> KernelResult<Index64> {
    let mut out = Vec::new();
    for i in 0..tags.len() {
        if tags.get(i) == which {
            if i >= index.len() {
                return Err(KernelError::value("unionarray_project", "len(index) < len(tags)", Some(i as i64)));
            }
            out.push(index.get_i64(i));
        }
    }
    Ok(out.into())
}

/// Positions of the elements tagged `which`.
pub fn unionarray_positions(tags: &Index8, which: i8) -> Index64 {
    tags.iter_i64()
        .enumerate()
        .filter_map(|(i, t)| (t == which as i64).then_some(i as i64))
        .collect()
}

/// Rewrites elements of a flat union content `fromwhich` to tag `towhich`,
/// shifting their index by `offset`.
pub fn unionarray_simplify_one<T: IndexType>(
    totags: &mut [i8],
    toindex: &mut [i64],
    fromtags: &Index8,
    fromindex: &Index<T>,
    fromwhich: i8,
    towhich: i8,
    offset: i64,
) {
    for i in 0..fromtags.len() {
        if fromtags.get(i) == fromwhich {
            totags[i] = towhich;
            toindex[i] = fromindex.get_i64(i) + offset;
        }
    }
}

/// Rewrites elements that reach inner content `innerwhich` of the nested
/// union at outer content `outerwhich` to tag `towhich`.
#[allow(clippy::too_many_arguments)]
pub fn unionarray_simplify<T: IndexType, U: IndexType>(
    totags: &mut [i8],
    toindex: &mut [i64],
    outertags: &Index8,
    outerindex: &Index<T>,
    innertags: &Index8,
    innerindex: &Index<U>,
    towhich: i8,
    innerwhich: i8,
    outerwhich: i8,
    offset: i64,
) -> KernelResult<()> {
    for i in 0..outertags.len() {
        if outertags.get(i) == outerwhich {
            let j = outerindex.get_i64(i);
            if j < 0 || j as usize >= innertags.len() {
                return Err(KernelError::index("unionarray_simplify", "index out of range", i as i64, j));
            }
            if innertags.get(j as usize) == innerwhich {
                totags[i] = towhich;
                toindex[i] = innerindex.get_i64(j as usize) + offset;
            }
        }
    }
    Ok(())
}

/// Offsets after removing missing lists, given the offsets of the valid
/// lists and the option's `outindex`.
pub fn indexedarray_flatten_none2empty(outindex: &Index64, offsets: &Index64) -> KernelResult<Index64> {
    let mut out = Vec::with_capacity(outindex.len() + 1);
    let mut current = if offsets.is_empty() { 0 } else { offsets.get(0) };
    out.push(current);
    for (i, idx) in outindex.iter_i64().enumerate() {
        if idx >= 0 {
            if idx as usize + 1 >= offsets.len() {
                return Err(KernelError::index(
                    "indexedarray_flatten_none2empty",
                    "flattening offset out of range",
                    i as i64,
                    idx,
                ));
            }
            current += offsets.get(idx as usize + 1) - offsets.get(idx as usize);
        }
        out.push(current);
    }
    Ok(out.into())
}

/// `offsets[i] -> inneroffsets[offsets[i]]`
pub fn listoffsetarray_flatten_offsets(offsets: &Index64, inneroffsets: &Index64) -> KernelResult<Index64> {
    let mut out = Vec::with_capacity(offsets.len());
    for (i, o) in offsets.iter_i64().enumerate() {
        if o < 0 || o as usize >= inneroffsets.len() {
            return Err(KernelError::index(
                "listoffsetarray_flatten_offsets",
                "offset out of range",
                i as i64,
                o,
            ));
        }
        out.push(inneroffsets.get(o as usize));
    }
    Ok(out.into())
}

/// Flattens a union whose contents were each flattened one level.
///
/// Returns `(totags, toindex, tooffsets)`.
pub fn unionarray_flatten_combine<T: IndexType>(
    fromtags: &Index8,
    fromindex: &Index<T>,
    offsetsraws: &[Index64],
) -> KernelResult<(Index8, Index64, Index64)> {
    let mut totags = Vec::new();
    let mut toindex = Vec::new();
    let mut tooffsets = Vec::with_capacity(fromtags.len() + 1);
    tooffsets.push(0i64);
    for i in 0..fromtags.len() {
        let tag = fromtags.get(i);
        let idx = fromindex.get_i64(i);
        let Some(offsets) = offsetsraws.get(tag as usize) else {
            return Err(KernelError::index("unionarray_flatten_combine", "tag out of range", i as i64, tag as i64));
        };
        if idx < 0 || idx as usize + 1 >= offsets.len() {
            return Err(KernelError::index("unionarray_flatten_combine", "index out of range", i as i64, idx));
        }
        let start = offsets.get(idx as usize);
        let stop = offsets.get(idx as usize + 1);
        for j in start..stop {
            totags.push(tag);
            toindex.push(j);
        }
        tooffsets.push(totags.len() as i64);
    }
    Ok((totags.into(), toindex.into(), tooffsets.into()))
}

/// Positions of each element within its list, for compact offsets.
pub fn listarray_localindex(offsets: &Index64) -> Index64 {
    let mut out = Vec::with_capacity(offsets.get_i64(offsets.len().saturating_sub(1)).max(0) as usize);
    for i in 0..offsets.len().saturating_sub(1) {
        out.extend(0..(offsets.get(i + 1) - offsets.get(i)));
    }
    out.into()
}

/// Number of missing entries before each offset, subtracted from it.
pub fn listoffsetarray_drop_none_indexes(outindex: &Index64, offsets: &Index64) -> KernelResult<Index64> {
    let mut nones_before = Vec::with_capacity(outindex.len() + 1);
    nones_before.push(0i64);
    let mut count = 0i64;
    for j in outindex.iter_i64() {
        if j < 0 {
            count += 1;
        }
        nones_before.push(count);
    }
    let mut out = Vec::with_capacity(offsets.len());
    for (i, o) in offsets.iter_i64().enumerate() {
        if o < 0 || o as usize >= nones_before.len() {
            return Err(KernelError::index(
                "listoffsetarray_drop_none_indexes",
                "offset out of range",
                i as i64,
                o,
            ));
        }
        out.push(o - nones_before[o as usize]);
    }
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nextcarry_outindex() {
        let index = Index64::from(vec![2i64, -1, 0, -3]);
        let (carry, outindex) = indexedarray_getitem_nextcarry_outindex(&index, 3).unwrap();
        assert_eq!(carry.as_slice(), &[2, 0]);
        assert_eq!(outindex.as_slice(), &[0, -1, 1, -1]);
        assert!(indexedarray_getitem_nextcarry_outindex(&index, 2).is_err());
        assert_eq!(indexedarray_numnull(&index), 2);
    }

    #[test]
    fn test_missing_repeat() {
        let index = Index64::from(vec![1i64, -1]);
        assert_eq!(missing_repeat(&index, 3, 2).as_slice(), &[1, -1, 3, -1, 5, -1]);
    }

    #[test]
    fn test_regular_index() {
        let tags = Index8::from(vec![0i8, 1, 0, 0, 1]);
        assert_eq!(unionarray_regular_index(&tags).unwrap().as_slice(), &[0, 0, 1, 2, 1]);
    }

    #[test]
    fn test_none2empty() {
        let outindex = Index64::from(vec![0i64, -1, 1]);
        let offsets = Index64::from(vec![0i64, 2, 5]);
        assert_eq!(indexedarray_flatten_none2empty(&outindex, &offsets).unwrap().as_slice(), &[0, 2, 2, 5]);
    }

    #[test]
    fn test_drop_none_indexes() {
        let outindex = Index64::from(vec![0i64, -1, 1, -1]);
        let offsets = Index64::from(vec![0i64, 2, 4]);
        assert_eq!(listoffsetarray_drop_none_indexes(&outindex, &offsets).unwrap().as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_localindex() {
        assert_eq!(listarray_localindex(&Index64::from(vec![0i64, 2, 2, 5])).as_slice(), &[0, 1, 0, 1, 2]);
    }
}
