//! # **Getitem Kernels** - *Carry and offset computations for slicing*
//!
//! Primitive loops called by the slicing engine. Each kernel reads index
//! buffers, validates what it touches and returns freshly allocated
//! [`Index64`] outputs. Failures are [`KernelError`]s carrying the loop
//! position and the attempted value; nodes attach their class name.
//!
//! Naming follows `{node}_{operation}`, e.g. `listarray_getitem_next_at`
//! computes the carry for an integer head applied to every list.

use crate::aliases::Index64;
use crate::enums::error::KernelError;
use crate::structs::index::Index;
use crate::traits::index_type::IndexType;

pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Wraps a negative position once; `None` if it is still out of range.
#[inline]
pub fn regularize_at(at: i64, length: i64) -> Option<i64> {
    let regular = if at < 0 { at + length } else { at };
    (0..length).contains(&regular).then_some(regular)
}

/// Python slice clamping for a list of `length` elements.
///
/// Returns the regularised `(start, stop)`; for a negative `step` the bounds
/// may be `-1`, meaning "before the first element".
pub fn regularize_rangeslice(start: Option<i64>, stop: Option<i64>, step: i64, length: i64) -> (i64, i64) {
    if step > 0 {
        let clamp = |v: i64| v.clamp(0, length);
        let start = clamp(start.map(|s| if s < 0 { s + length } else { s }).unwrap_or(0));
        let stop = clamp(stop.map(|s| if s < 0 { s + length } else { s }).unwrap_or(length));
        (start, stop.max(start))
    } else {
        let clamp = |v: i64| v.clamp(-1, length - 1);
        let start = clamp(start.map(|s| if s < 0 { s + length } else { s }).unwrap_or(length - 1));
        let stop = clamp(stop.map(|s| if s < 0 { s + length } else { s }).unwrap_or(-1));
        (start, stop.min(start))
    }
}

/// Number of elements selected by a regularised range.
#[inline]
pub fn range_count(start: i64, stop: i64, step: i64) -> i64 {
    if step > 0 {
        (stop - start + step - 1) / step
    } else {
        (start - stop - step - 1) / (-step)
    }
}

/// Gathers `index[carry[i]]`.
pub fn index_carry<T: IndexType>(index: &Index<T>, carry: &Index64) -> KernelResult<Index<T>> {
    let len = index.len() as i64;
    let mut out = Vec::with_capacity(carry.len());
    for (i, c) in carry.iter_i64().enumerate() {
        if c < 0 || c >= len {
            return Err(KernelError::index("index_carry", "index out of range", i as i64, c));
        }
        out.push(index.get(c as usize));
    }
    Ok(out.into())
}

/// Checks that every carry position is within `length`.
pub fn carry_bounds(kernel: &'static str, carry: &Index64, length: usize) -> KernelResult<()> {
    let length = length as i64;
    for (i, c) in carry.iter_i64().enumerate() {
        if c < 0 || c >= length {
            return Err(KernelError::index(kernel, "index out of range", i as i64, c));
        }
    }
    Ok(())
}

/// Gathers starts and stops of the carried lists.
pub fn listarray_getitem_carry<T: IndexType>(
    starts: &Index<T>,
    stops: &Index<T>,
    carry: &Index64,
) -> KernelResult<(Index<T>, Index<T>)> {
    let len = starts.len() as i64;
    let mut nextstarts = Vec::with_capacity(carry.len());
    let mut nextstops = Vec::with_capacity(carry.len());
    for (i, c) in carry.iter_i64().enumerate() {
        if c < 0 || c >= len || c as usize >= stops.len() {
            return Err(KernelError::index(
                "listarray_getitem_carry",
                "index out of range",
                i as i64,
                c,
            ));
        }
        nextstarts.push(starts.get(c as usize));
        nextstops.push(stops.get(c as usize));
    }
    Ok((nextstarts.into(), nextstops.into()))
}

/// Content positions of the carried rows of a regular array.
pub fn regulararray_getitem_carry(carry: &Index64, size: usize) -> Index64 {
    let size = size as i64;
    let mut out = Vec::with_capacity(carry.len() * size as usize);
    for c in carry.iter_i64() {
        out.extend((0..size).map(|j| c * size + j));
    }
    out.into()
}

pub fn regulararray_getitem_next_at(at: i64, length: usize, size: usize) -> KernelResult<Index64> {
    let Some(regular_at) = regularize_at(at, size as i64) else {
        return Err(KernelError::index(
            "regulararray_getitem_next_at",
            "index out of range",
            0,
            at,
        ));
    };
    Ok((0..length as i64).map(|i| i * size as i64 + regular_at).collect())
}

pub fn regulararray_getitem_next_range(
    regular_start: i64,
    step: i64,
    length: usize,
    size: usize,
    nextsize: usize,
) -> Index64 {
    let mut out = Vec::with_capacity(length * nextsize);
    for i in 0..length as i64 {
        out.extend((0..nextsize as i64).map(|j| i * size as i64 + regular_start + j * step));
    }
    out.into()
}

/// Repeats each advanced position for every element of its new sublist.
pub fn regulararray_getitem_next_range_spreadadvanced(advanced: &Index64, length: usize, nextsize: usize) -> Index64 {
    let mut out = Vec::with_capacity(length * nextsize);
    for i in 0..length {
        let a = advanced.get(i);
        out.extend(std::iter::repeat_n(a, nextsize));
    }
    out.into()
}

/// Wraps negative positions of a flat index array against `size`.
pub fn regulararray_getitem_next_array_regularize(flathead: &Index64, size: usize) -> KernelResult<Index64> {
    let mut out = Vec::with_capacity(flathead.len());
    for (j, at) in flathead.iter_i64().enumerate() {
        match regularize_at(at, size as i64) {
            Some(v) => out.push(v),
            None => {
                return Err(KernelError::index(
                    "regulararray_getitem_next_array_regularize",
                    "index out of range",
                    j as i64,
                    at,
                ));
            }
        }
    }
    Ok(out.into())
}

/// `(nextcarry, nextadvanced)` for a fresh advanced index.
pub fn regulararray_getitem_next_array(regular_flathead: &Index64, length: usize, size: usize) -> (Index64, Index64) {
    let lenflat = regular_flathead.len();
    let mut nextcarry = Vec::with_capacity(length * lenflat);
    let mut nextadvanced = Vec::with_capacity(length * lenflat);
    for i in 0..length as i64 {
        for (j, at) in regular_flathead.iter_i64().enumerate() {
            nextcarry.push(i * size as i64 + at);
            nextadvanced.push(j as i64);
        }
    }
    (nextcarry.into(), nextadvanced.into())
}

/// `(nextcarry, nextadvanced)` when an advanced index is already running.
pub fn regulararray_getitem_next_array_advanced(
    advanced: &Index64,
    regular_flathead: &Index64,
    length: usize,
    size: usize,
) -> KernelResult<(Index64, Index64)> {
    let mut nextcarry = Vec::with_capacity(length);
    for i in 0..length {
        let a = advanced.get(i);
        if a < 0 || a as usize >= regular_flathead.len() {
            return Err(KernelError::index(
                "regulararray_getitem_next_array_advanced",
                "advanced index out of range",
                i as i64,
                a,
            ));
        }
        nextcarry.push(i as i64 * size as i64 + regular_flathead.get(a as usize));
    }
    Ok((nextcarry.into(), Index64::arange(length)))
}

fn check_list<T: IndexType>(kernel: &'static str, starts: &Index<T>, stops: &Index<T>, i: usize) -> KernelResult<(i64, i64)> {
    let start = starts.get_i64(i);
    let stop = stops.get_i64(i);
    if stop < start {
        return Err(KernelError::value(kernel, "stops[i] < starts[i]", Some(i as i64)));
    }
    Ok((start, stop))
}

pub fn listarray_getitem_next_at<T: IndexType>(starts: &Index<T>, stops: &Index<T>, at: i64) -> KernelResult<Index64> {
    const KERNEL: &str = "listarray_getitem_next_at";
    let mut out = Vec::with_capacity(starts.len());
    for i in 0..starts.len() {
        let (start, stop) = check_list(KERNEL, starts, stops, i)?;
        match regularize_at(at, stop - start) {
            Some(r) => out.push(start + r),
            None => return Err(KernelError::index(KERNEL, "index out of range", i as i64, at)),
        }
    }
    Ok(out.into())
}

/// `(nextoffsets, nextcarry)` for a range applied to every list.
pub fn listarray_getitem_next_range<T: IndexType>(
    starts: &Index<T>,
    stops: &Index<T>,
    start: Option<i64>,
    stop: Option<i64>,
    step: i64,
) -> KernelResult<(Index64, Index64)> {
    const KERNEL: &str = "listarray_getitem_next_range";
    let mut offsets = Vec::with_capacity(starts.len() + 1);
    let mut carry = Vec::new();
    offsets.push(0i64);
    for i in 0..starts.len() {
        let (list_start, list_stop) = check_list(KERNEL, starts, stops, i)?;
        let (s, e) = regularize_rangeslice(start, stop, step, list_stop - list_start);
        let count = range_count(s, e, step);
        carry.extend((0..count).map(|j| list_start + s + j * step));
        offsets.push(carry.len() as i64);
    }
    Ok((offsets.into(), carry.into()))
}

/// Repeats each advanced position over its list in `offsets`.
pub fn listarray_getitem_next_range_spreadadvanced(advanced: &Index64, offsets: &Index64) -> Index64 {
    let mut out = Vec::with_capacity(offsets.get_i64(offsets.len() - 1) as usize);
    for i in 0..offsets.len() - 1 {
        let count = (offsets.get(i + 1) - offsets.get(i)) as usize;
        out.extend(std::iter::repeat_n(advanced.get(i), count));
    }
    out.into()
}

/// `(nextcarry, nextadvanced)` for a fresh advanced index.
pub fn listarray_getitem_next_array<T: IndexType>(
    starts: &Index<T>,
    stops: &Index<T>,
    flathead: &Index64,
) -> KernelResult<(Index64, Index64)> {
    const KERNEL: &str = "listarray_getitem_next_array";
    let lenflat = flathead.len();
    let mut nextcarry = Vec::with_capacity(starts.len() * lenflat);
    let mut nextadvanced = Vec::with_capacity(starts.len() * lenflat);
    for i in 0..starts.len() {
        let (start, stop) = check_list(KERNEL, starts, stops, i)?;
        for (j, at) in flathead.iter_i64().enumerate() {
            match regularize_at(at, stop - start) {
                Some(r) => nextcarry.push(start + r),
                None => return Err(KernelError::index(KERNEL, "index out of range", i as i64, at)),
            }
            nextadvanced.push(j as i64);
        }
    }
    Ok((nextcarry.into(), nextadvanced.into()))
}

/// `(nextcarry, nextadvanced)` when an advanced index is already running.
pub fn listarray_getitem_next_array_advanced<T: IndexType>(
    starts: &Index<T>,
    stops: &Index<T>,
    flathead: &Index64,
    advanced: &Index64,
) -> KernelResult<(Index64, Index64)> {
    const KERNEL: &str = "listarray_getitem_next_array_advanced";
    let mut nextcarry = Vec::with_capacity(starts.len());
    for i in 0..starts.len() {
        let (start, stop) = check_list(KERNEL, starts, stops, i)?;
        let a = advanced.get(i);
        if a < 0 || a as usize >= flathead.len() {
            return Err(KernelError::index(KERNEL, "advanced index out of range", i as i64, a));
        }
        let at = flathead.get(a as usize);
        match regularize_at(at, stop - start) {
            Some(r) => nextcarry.push(start + r),
            None => return Err(KernelError::index(KERNEL, "index out of range", i as i64, at)),
        }
    }
    Ok((nextcarry.into(), Index64::arange(starts.len())))
}

/// Lines a jagged slice up with lists whose length equals its row count.
///
/// Returns `(multistarts, multistops, nextcarry)`.
pub fn listarray_getitem_jagged_expand<T: IndexType>(
    singleoffsets: &Index64,
    starts: &Index<T>,
    stops: &Index<T>,
) -> KernelResult<(Index64, Index64, Index64)> {
    const KERNEL: &str = "listarray_getitem_jagged_expand";
    let jaggedsize = singleoffsets.len() - 1;
    let mut multistarts = Vec::with_capacity(starts.len() * jaggedsize);
    let mut multistops = Vec::with_capacity(starts.len() * jaggedsize);
    let mut nextcarry = Vec::with_capacity(starts.len() * jaggedsize);
    for i in 0..starts.len() {
        let (start, stop) = check_list(KERNEL, starts, stops, i)?;
        if (stop - start) as usize != jaggedsize {
            return Err(KernelError::value(
                KERNEL,
                "cannot fit jagged slice into nested list",
                Some(i as i64),
            ));
        }
        for j in 0..jaggedsize {
            multistarts.push(singleoffsets.get(j));
            multistops.push(singleoffsets.get(j + 1));
            nextcarry.push(start + j as i64);
        }
    }
    Ok((multistarts.into(), multistops.into(), nextcarry.into()))
}

/// Applies row `i` of integer positions to list `i`.
///
/// Returns `(outoffsets, nextcarry)`.
pub fn listarray_getitem_jagged_apply<T: IndexType>(
    slicestarts: &Index64,
    slicestops: &Index64,
    sliceindex: &Index64,
    starts: &Index<T>,
    stops: &Index<T>,
    contentlen: usize,
) -> KernelResult<(Index64, Index64)> {
    const KERNEL: &str = "listarray_getitem_jagged_apply";
    let mut outoffsets = Vec::with_capacity(slicestarts.len() + 1);
    let mut nextcarry = Vec::new();
    outoffsets.push(0i64);
    for i in 0..slicestarts.len() {
        let slicestart = slicestarts.get(i);
        let slicestop = slicestops.get(i);
        if slicestart != slicestop {
            if slicestop < slicestart {
                return Err(KernelError::value(KERNEL, "jagged slice's stops[i] < starts[i]", Some(i as i64)));
            }
            if slicestop as usize > sliceindex.len() {
                return Err(KernelError::value(
                    KERNEL,
                    "jagged slice's offsets extend beyond its content",
                    Some(i as i64),
                ));
            }
            let (start, stop) = check_list(KERNEL, starts, stops, i)?;
            if start != stop && stop as usize > contentlen {
                return Err(KernelError::value(KERNEL, "stops[i] > len(content)", Some(i as i64)));
            }
            let count = stop - start;
            for j in slicestart..slicestop {
                let at = sliceindex.get(j as usize);
                match regularize_at(at, count) {
                    Some(r) => nextcarry.push(start + r),
                    None => return Err(KernelError::index(KERNEL, "index out of range", i as i64, at)),
                }
            }
        }
        outoffsets.push(nextcarry.len() as i64);
    }
    Ok((outoffsets.into(), nextcarry.into()))
}

/// Applies row `i` of option-typed positions to list `i`.
///
/// Returns `(outoffsets, outindex, nextcarry)`, where `outindex` is `-1`
/// for missing positions and points into `nextcarry` otherwise.
pub fn listarray_getitem_jagged_missing<T: IndexType>(
    slicestarts: &Index64,
    slicestops: &Index64,
    missingindex: &Index64,
    positions: &Index64,
    starts: &Index<T>,
    stops: &Index<T>,
) -> KernelResult<(Index64, Index64, Index64)> {
    const KERNEL: &str = "listarray_getitem_jagged_missing";
    let mut outoffsets = Vec::with_capacity(slicestarts.len() + 1);
    let mut outindex = Vec::new();
    let mut nextcarry = Vec::new();
    outoffsets.push(0i64);
    for i in 0..slicestarts.len() {
        let slicestart = slicestarts.get(i);
        let slicestop = slicestops.get(i);
        if slicestop < slicestart || slicestop as usize > missingindex.len() {
            return Err(KernelError::value(
                KERNEL,
                "jagged slice's offsets extend beyond its content",
                Some(i as i64),
            ));
        }
        let (start, stop) = check_list(KERNEL, starts, stops, i)?;
        for j in slicestart..slicestop {
            let m = missingindex.get(j as usize);
            if m < 0 {
                outindex.push(-1);
                continue;
            }
            if m as usize >= positions.len() {
                return Err(KernelError::index(KERNEL, "missing index out of range", i as i64, m));
            }
            let at = positions.get(m as usize);
            match regularize_at(at, stop - start) {
                Some(r) => {
                    outindex.push(nextcarry.len() as i64);
                    nextcarry.push(start + r);
                }
                None => return Err(KernelError::index(KERNEL, "index out of range", i as i64, at)),
            }
        }
        outoffsets.push(outindex.len() as i64);
    }
    Ok((outoffsets.into(), outindex.into(), nextcarry.into()))
}

/// Descends one level of a doubly-jagged slice.
///
/// Every list must have as many elements as its slice row has sublists.
/// Returns `(outoffsets, nextcarry, nextslicestarts, nextslicestops)`.
pub fn listarray_getitem_jagged_descend<T: IndexType>(
    slicestarts: &Index64,
    slicestops: &Index64,
    sliceoffsets: &Index64,
    starts: &Index<T>,
    stops: &Index<T>,
) -> KernelResult<(Index64, Index64, Index64, Index64)> {
    const KERNEL: &str = "listarray_getitem_jagged_descend";
    let mut outoffsets = Vec::with_capacity(slicestarts.len() + 1);
    let mut nextcarry = Vec::new();
    let mut nextstarts = Vec::new();
    let mut nextstops = Vec::new();
    outoffsets.push(0i64);
    for i in 0..slicestarts.len() {
        let slicestart = slicestarts.get(i);
        let slicestop = slicestops.get(i);
        let (start, stop) = check_list(KERNEL, starts, stops, i)?;
        if slicestop - slicestart != stop - start {
            return Err(KernelError::value(
                KERNEL,
                "jagged slice inner length differs from array inner length",
                Some(i as i64),
            ));
        }
        if slicestop as usize >= sliceoffsets.len() && slicestop != slicestart {
            return Err(KernelError::value(
                KERNEL,
                "jagged slice's offsets extend beyond its content",
                Some(i as i64),
            ));
        }
        for j in 0..(stop - start) {
            nextcarry.push(start + j);
            let pos = (slicestart + j) as usize;
            nextstarts.push(sliceoffsets.get(pos));
            nextstops.push(sliceoffsets.get(pos + 1));
        }
        outoffsets.push(nextcarry.len() as i64);
    }
    Ok((outoffsets.into(), nextcarry.into(), nextstarts.into(), nextstops.into()))
}

/// Offsets starting at zero that describe the same lists.
pub fn listarray_compact_offsets<T: IndexType>(starts: &Index<T>, stops: &Index<T>) -> KernelResult<Index64> {
    const KERNEL: &str = "listarray_compact_offsets";
    if stops.len() < starts.len() {
        return Err(KernelError::value(KERNEL, "len(stops) < len(starts)", None));
    }
    let mut out = Vec::with_capacity(starts.len() + 1);
    out.push(0i64);
    let mut total = 0i64;
    for i in 0..starts.len() {
        let (start, stop) = check_list(KERNEL, starts, stops, i)?;
        total += stop - start;
        out.push(total);
    }
    Ok(out.into())
}

/// Content positions of every list element, in list order.
pub fn listarray_flatten_carry<T: IndexType>(starts: &Index<T>, stops: &Index<T>) -> KernelResult<Index64> {
    const KERNEL: &str = "listarray_flatten_carry";
    let mut out = Vec::new();
    for i in 0..starts.len() {
        let (start, stop) = check_list(KERNEL, starts, stops, i)?;
        out.extend(start..stop);
    }
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regularize_rangeslice() {
        assert_eq!(regularize_rangeslice(None, None, 1, 5), (0, 5));
        assert_eq!(regularize_rangeslice(Some(-2), None, 1, 5), (3, 5));
        assert_eq!(regularize_rangeslice(None, None, -1, 5), (4, -1));
        assert_eq!(regularize_rangeslice(Some(10), Some(-10), -2, 5), (4, -1));
        assert_eq!(range_count(4, -1, -2), 3);
        assert_eq!(range_count(0, 5, 2), 3);
        assert_eq!(range_count(3, 3, 1), 0);
    }

    #[test]
    fn test_next_at_reports_position() {
        let starts = Index64::from(vec![0i64, 3, 3]);
        let stops = Index64::from(vec![3i64, 3, 5]);
        assert_eq!(listarray_getitem_next_at(&starts, &stops, 0).unwrap_err().id, Some(1));
        let carry = listarray_getitem_next_at(&starts, &Index64::from(vec![3i64, 4, 5]), -1).unwrap();
        assert_eq!(carry.as_slice(), &[2, 3, 4]);
    }

    #[test]
    fn test_next_range_with_step() {
        let starts = Index64::from(vec![0i64, 4]);
        let stops = Index64::from(vec![4i64, 6]);
        let (offsets, carry) = listarray_getitem_next_range(&starts, &stops, None, None, -2).unwrap();
        assert_eq!(offsets.as_slice(), &[0, 2, 3]);
        assert_eq!(carry.as_slice(), &[3, 1, 5]);
    }

    #[test]
    fn test_next_array_and_advanced() {
        let starts = Index64::from(vec![0i64, 2]);
        let stops = Index64::from(vec![2i64, 5]);
        let flat = Index64::from(vec![1i64, -1]);
        let (carry, adv) = listarray_getitem_next_array(&starts, &stops, &flat).unwrap();
        assert_eq!(carry.as_slice(), &[1, 1, 3, 4]);
        assert_eq!(adv.as_slice(), &[0, 1, 0, 1]);
        let (carry, _) =
            listarray_getitem_next_array_advanced(&starts, &stops, &flat, &Index64::from(vec![1i64, 0])).unwrap();
        assert_eq!(carry.as_slice(), &[1, 3]);
    }

    #[test]
    fn test_jagged_apply() {
        let starts = Index64::from(vec![0i64, 3, 3]);
        let stops = Index64::from(vec![3i64, 3, 5]);
        let slicestarts = Index64::from(vec![0i64, 2, 2]);
        let slicestops = Index64::from(vec![2i64, 2, 3]);
        let sliceindex = Index64::from(vec![2i64, 0, -1]);
        let (offsets, carry) =
            listarray_getitem_jagged_apply(&slicestarts, &slicestops, &sliceindex, &starts, &stops, 5).unwrap();
        assert_eq!(offsets.as_slice(), &[0, 2, 2, 3]);
        assert_eq!(carry.as_slice(), &[2, 0, 4]);
    }

    #[test]
    fn test_compact_offsets() {
        let starts = Index64::from(vec![4i64, 0]);
        let stops = Index64::from(vec![6i64, 3]);
        assert_eq!(listarray_compact_offsets(&starts, &stops).unwrap().as_slice(), &[0, 2, 5]);
        assert!(listarray_compact_offsets(&starts, &Index64::from(vec![6i64])).is_err());
    }
}
