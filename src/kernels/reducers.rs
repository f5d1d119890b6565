//! # **Reducer Kernels** - *Grouped reductions and list regrouping*
//!
//! Leaf reductions combine the values of a flat buffer into `outlength`
//! groups given by `parents[i]`, the group of element `i`. The list helpers
//! compute the carries and parents that move a reduction one level down the
//! tree.
//!
//! ## Dtypes
//! `sum`/`prod` accumulate in `i64` (bool and signed), `u64` (unsigned) or
//! the float width itself; integer accumulation wraps like NumPy's.

use crate::aliases::Index64;
use crate::enums::dtype::DType;
use crate::enums::error::KernelError;
use crate::enums::reducer::Reducer;
use crate::kernels::getitem::KernelResult;
use crate::match_numpy;
use crate::structs::buffer::Buffer;
use crate::structs::variants::numpy::NumpyData;
use crate::traits::primitive::NumpyPrimitive;

/// Accumulator types of `sum` and `prod`.
trait Accumulator: NumpyPrimitive {
    const ZERO: Self;
    const ONE: Self;
    fn from_value<T: NumpyPrimitive>(v: T) -> Self;
    fn add(self, other: Self) -> Self;
    fn mul(self, other: Self) -> Self;
}

macro_rules! impl_accumulator_int {
    ($($t:ty => $conv:ident),*) => {
        $(
            impl Accumulator for $t {
                const ZERO: Self = 0;
                const ONE: Self = 1;
                #[inline]
                fn from_value<T: NumpyPrimitive>(v: T) -> Self { v.$conv() }
                #[inline]
                fn add(self, other: Self) -> Self { self.wrapping_add(other) }
                #[inline]
                fn mul(self, other: Self) -> Self { self.wrapping_mul(other) }
            }
        )*
    };
}

macro_rules! impl_accumulator_float {
    ($($t:ty),*) => {
        $(
            impl Accumulator for $t {
                const ZERO: Self = 0.0;
                const ONE: Self = 1.0;
                #[inline]
                fn from_value<T: NumpyPrimitive>(v: T) -> Self { v.as_f64() as $t }
                #[inline]
                fn add(self, other: Self) -> Self { self + other }
                #[inline]
                fn mul(self, other: Self) -> Self { self * other }
            }
        )*
    };
}

impl_accumulator_int!(i64 => as_i64, u64 => as_u64);
impl_accumulator_float!(f32, f64);

fn check_parents(kernel: &'static str, len: usize, parents: &Index64, outlength: usize) -> KernelResult<()> {
    if parents.len() != len {
        return Err(KernelError::value(kernel, "len(parents) != len(data)", None));
    }
    for (i, p) in parents.iter_i64().enumerate() {
        if p < 0 || p as usize >= outlength {
            return Err(KernelError::index(kernel, "parent out of range", i as i64, p));
        }
    }
    Ok(())
}

fn accumulate<T: NumpyPrimitive, A: Accumulator>(
    data: &[T],
    parents: &Index64,
    outlength: usize,
    identity: A,
    op: fn(A, A) -> A,
) -> Vec<A> {
    let mut out = vec![identity; outlength];
    for (x, p) in data.iter().zip(parents.as_slice()) {
        let slot = &mut out[*p as usize];
        *slot = op(*slot, A::from_value(*x));
    }
    out
}

fn sum_or_prod<T: NumpyPrimitive, A: Accumulator>(sum: bool, data: &[T], parents: &Index64, outlength: usize) -> Vec<A> {
    if sum {
        accumulate(data, parents, outlength, A::ZERO, A::add)
    } else {
        accumulate(data, parents, outlength, A::ONE, A::mul)
    }
}

/// Number of elements per group.
pub fn reduce_count(parents: &Index64, outlength: usize) -> KernelResult<Vec<i64>> {
    check_parents("reduce_count", parents.len(), parents, outlength)?;
    let mut out = vec![0i64; outlength];
    for p in parents.iter_i64() {
        out[p as usize] += 1;
    }
    Ok(out)
}

fn reduce_typed<T: NumpyPrimitive>(
    reducer: Reducer,
    data: &[T],
    parents: &Index64,
    outlength: usize,
) -> KernelResult<NumpyData> {
    check_parents("reduce_numpy", data.len(), parents, outlength)?;
    let groups = || data.iter().copied().zip(parents.iter_i64().map(|p| p as usize));
    Ok(match reducer {
        Reducer::Count => NumpyData::Int64(reduce_count(parents, outlength)?.into()),
        Reducer::CountNonzero => {
            let mut out = vec![0i64; outlength];
            for (x, p) in groups() {
                if x.is_nonzero() {
                    out[p] += 1;
                }
            }
            NumpyData::Int64(out.into())
        }
        Reducer::Sum | Reducer::Prod => {
            let sum = reducer == Reducer::Sum;
            match T::DTYPE.accumulator() {
                DType::UInt64 => NumpyData::UInt64(sum_or_prod::<T, u64>(sum, data, parents, outlength).into()),
                DType::Float32 => NumpyData::Float32(sum_or_prod::<T, f32>(sum, data, parents, outlength).into()),
                DType::Float64 => NumpyData::Float64(sum_or_prod::<T, f64>(sum, data, parents, outlength).into()),
                _ => NumpyData::Int64(sum_or_prod::<T, i64>(sum, data, parents, outlength).into()),
            }
        }
        Reducer::Any => {
            let mut out = vec![false; outlength];
            for (x, p) in groups() {
                out[p] |= x.is_nonzero();
            }
            NumpyData::Bool(out.into())
        }
        Reducer::All => {
            let mut out = vec![true; outlength];
            for (x, p) in groups() {
                out[p] &= x.is_nonzero();
            }
            NumpyData::Bool(out.into())
        }
        Reducer::Min => {
            let mut out = vec![T::MIN_IDENTITY; outlength];
            for (x, p) in groups() {
                if x < out[p] {
                    out[p] = x;
                }
            }
            T::wrap(Buffer::from(out))
        }
        Reducer::Max => {
            let mut out = vec![T::MAX_IDENTITY; outlength];
            for (x, p) in groups() {
                if x > out[p] {
                    out[p] = x;
                }
            }
            T::wrap(Buffer::from(out))
        }
        Reducer::ArgMin | Reducer::ArgMax => {
            let min = reducer == Reducer::ArgMin;
            let mut out = vec![-1i64; outlength];
            for (k, (x, p)) in groups().enumerate() {
                let best = out[p];
                let better = best < 0 || {
                    let current = data[best as usize];
                    if min { x < current } else { x > current }
                };
                if better {
                    out[p] = k as i64;
                }
            }
            NumpyData::Int64(out.into())
        }
    })
}

/// Reduces a flat leaf buffer into `outlength` groups.
///
/// Positional reducers return global positions, `-1` for empty groups.
pub fn reduce_numpy(reducer: Reducer, data: &NumpyData, parents: &Index64, outlength: usize) -> KernelResult<NumpyData> {
    match_numpy!(data, buf => reduce_typed(reducer, buf.as_slice(), parents, outlength))
}

/// Turns global positions found by an arg-reducer into positions local to
/// each group: `out[k] -= starts[parents[out[k]]]`.
pub fn reduce_adjust_starts(out: &mut [i64], parents: &Index64, starts: &Index64) -> KernelResult<()> {
    for (k, slot) in out.iter_mut().enumerate() {
        let i = *slot;
        if i >= 0 {
            let parent = parents.get(i as usize);
            if parent < 0 || parent as usize >= starts.len() {
                return Err(KernelError::index("reduce_adjust_starts", "parent out of range", k as i64, parent));
            }
            *slot -= starts.get(parent as usize);
        }
    }
    Ok(())
}

/// Regrouping of a list level that is itself being reduced.
pub struct NonlocalNext {
    /// Content positions, ordered by parent, then list position, then list.
    pub nextcarry: Index64,
    /// `parent * maxcount + position_in_list` for every carried element.
    pub nextparents: Index64,
    /// First carried position of every group.
    pub nextstarts: Index64,
    /// Longest list length.
    pub maxcount: usize,
    /// Longest list length per parent.
    pub maxlens: Vec<i64>,
}

/// Prepares a reduction across the lists of a list level.
///
/// Element `j` of every list with parent `p` lands in group
/// `p * maxcount + j`. Groups are contiguous in the carry, which keeps the
/// child parents sorted. `parents` must be sorted.
pub fn listoffsetarray_reduce_nonlocal_preparenext(
    offsets: &Index64,
    parents: &Index64,
    outlength: usize,
) -> KernelResult<NonlocalNext> {
    const KERNEL: &str = "listoffsetarray_reduce_nonlocal_preparenext";
    let length = offsets.len() - 1;
    check_parents(KERNEL, length, parents, outlength)?;
    let mut maxcount = 0i64;
    for i in 0..length {
        let count = offsets.get(i + 1) - offsets.get(i);
        if count < 0 {
            return Err(KernelError::value(KERNEL, "offsets must be monotonically increasing", Some(i as i64)));
        }
        if i > 0 && parents.get(i) < parents.get(i - 1) {
            return Err(KernelError::value(KERNEL, "parents must be sorted", Some(i as i64)));
        }
        maxcount = maxcount.max(count);
    }
    let mut nextcarry = Vec::with_capacity((offsets.get(length) - offsets.get(0)) as usize);
    let mut nextparents = Vec::with_capacity(nextcarry.capacity());
    let mut nextstarts = vec![0i64; outlength * maxcount as usize];
    let mut maxlens = vec![0i64; outlength];
    let mut run_start = 0usize;
    while run_start < length {
        let parent = parents.get(run_start);
        let mut run_stop = run_start;
        let mut maxlen = 0i64;
        while run_stop < length && parents.get(run_stop) == parent {
            maxlen = maxlen.max(offsets.get(run_stop + 1) - offsets.get(run_stop));
            run_stop += 1;
        }
        maxlens[parent as usize] = maxlen;
        for j in 0..maxlen {
            let group = parent * maxcount + j;
            nextstarts[group as usize] = nextcarry.len() as i64;
            for i in run_start..run_stop {
                if offsets.get(i + 1) - offsets.get(i) > j {
                    nextcarry.push(offsets.get(i) + j);
                    nextparents.push(group);
                }
            }
        }
        run_start = run_stop;
    }
    Ok(NonlocalNext {
        nextcarry: nextcarry.into(),
        nextparents: nextparents.into(),
        nextstarts: nextstarts.into(),
        maxcount: maxcount as usize,
        maxlens,
    })
}

/// `(outstarts, outstops)` of the reduced lists: parent `p` owns groups
/// `p * maxcount .. p * maxcount + maxlens[p]`.
pub fn listoffsetarray_reduce_nonlocal_outstartsstops(maxlens: &[i64], maxcount: usize) -> (Index64, Index64) {
    let starts: Index64 = (0..maxlens.len() as i64).map(|p| p * maxcount as i64).collect();
    let stops: Index64 = maxlens
        .iter()
        .enumerate()
        .map(|(p, len)| p as i64 * maxcount as i64 + len)
        .collect();
    (starts, stops)
}

/// Parents of the trimmed content: element `k` of list `i` gets `i`.
pub fn listoffsetarray_reduce_local_nextparents(offsets: &Index64) -> Index64 {
    let mut out = Vec::with_capacity((offsets.get(offsets.len() - 1) - offsets.get(0)).max(0) as usize);
    for i in 0..offsets.len() - 1 {
        let count = (offsets.get(i + 1) - offsets.get(i)).max(0) as usize;
        out.extend(std::iter::repeat_n(i as i64, count));
    }
    out.into()
}

/// Offsets grouping `parents` (sorted) into `outlength` lists.
pub fn listoffsetarray_reduce_local_outoffsets(parents: &Index64, outlength: usize) -> KernelResult<Index64> {
    let counts = reduce_count(parents, outlength)?;
    let mut out = Vec::with_capacity(outlength + 1);
    out.push(0i64);
    let mut total = 0i64;
    for c in counts {
        total += c;
        out.push(total);
    }
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_prod_dtypes() {
        let data = NumpyData::Int32(vec![1i32, 2, 3, 4].into());
        let parents = Index64::from(vec![0i64, 0, 2, 2]);
        match reduce_numpy(Reducer::Sum, &data, &parents, 3).unwrap() {
            NumpyData::Int64(b) => assert_eq!(b.as_slice(), &[3, 0, 7]),
            other => panic!("unexpected {:?}", other),
        }
        match reduce_numpy(Reducer::Prod, &data, &parents, 3).unwrap() {
            NumpyData::Int64(b) => assert_eq!(b.as_slice(), &[2, 1, 12]),
            other => panic!("unexpected {:?}", other),
        }
        let unsigned = NumpyData::UInt8(vec![200u8, 100].into());
        match reduce_numpy(Reducer::Sum, &unsigned, &Index64::zeros(2), 1).unwrap() {
            NumpyData::UInt64(b) => assert_eq!(b.as_slice(), &[300]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_min_identity_and_argmax() {
        let data = NumpyData::Float64(vec![1.5f64, -2.0, 7.0].into());
        let parents = Index64::from(vec![0i64, 0, 2]);
        match reduce_numpy(Reducer::Min, &data, &parents, 3).unwrap() {
            NumpyData::Float64(b) => assert_eq!(b.as_slice(), &[-2.0, f64::INFINITY, 7.0]),
            other => panic!("unexpected {:?}", other),
        }
        match reduce_numpy(Reducer::ArgMax, &data, &parents, 3).unwrap() {
            NumpyData::Int64(b) => assert_eq!(b.as_slice(), &[0, -1, 2]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parent_out_of_range() {
        let data = NumpyData::Bool(vec![true].into());
        assert!(reduce_numpy(Reducer::Any, &data, &Index64::from(vec![3i64]), 2).is_err());
    }

    #[test]
    fn test_nonlocal_preparenext() {
        // [[1, 2, 3], [], [4, 5]] under one parent
        let offsets = Index64::from(vec![0i64, 3, 3, 5]);
        let parents = Index64::zeros(3);
        let next = listoffsetarray_reduce_nonlocal_preparenext(&offsets, &parents, 1).unwrap();
        assert_eq!(next.maxcount, 3);
        assert_eq!(next.nextcarry.as_slice(), &[0, 3, 1, 4, 2]);
        assert_eq!(next.nextparents.as_slice(), &[0, 0, 1, 1, 2]);
        assert_eq!(next.nextstarts.as_slice(), &[0, 2, 4]);
        let (starts, stops) = listoffsetarray_reduce_nonlocal_outstartsstops(&next.maxlens, next.maxcount);
        assert_eq!(starts.as_slice(), &[0]);
        assert_eq!(stops.as_slice(), &[3]);
    }

    #[test]
    fn test_local_helpers() {
        let offsets = Index64::from(vec![2i64, 4, 4, 5]);
        assert_eq!(listoffsetarray_reduce_local_nextparents(&offsets).as_slice(), &[0, 0, 2]);
        let parents = Index64::from(vec![0i64, 0, 2]);
        assert_eq!(listoffsetarray_reduce_local_outoffsets(&parents, 3).unwrap().as_slice(), &[0, 2, 2, 3]);
    }
}
