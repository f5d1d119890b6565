//! # **Reducer** - *Axis reductions over nested layouts*
//!
//! [`Reducer`] names the reduction; [`Content::reduce`] resolves the axis and
//! starts the recursive `reduce_next` walk with a single output group.
//!
//! ## Axis convention
//! `axis = 0` is the outermost dimension and negative axes count from the
//! leaves. Internally the walk uses `negaxis`, the depth counted from the
//! leaves, so that every node can compare it against its own depth.

use log::debug;

use crate::aliases::{Index64, Result};
use crate::enums::content::Content;
use crate::enums::dtype::DType;
use crate::enums::element::Element;
use crate::enums::error::JaggedError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reducer {
    Count,
    CountNonzero,
    Sum,
    Prod,
    Any,
    All,
    Min,
    Max,
    ArgMin,
    ArgMax,
}

impl Reducer {
    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Count => "count",
            Reducer::CountNonzero => "count_nonzero",
            Reducer::Sum => "sum",
            Reducer::Prod => "prod",
            Reducer::Any => "any",
            Reducer::All => "all",
            Reducer::Min => "min",
            Reducer::Max => "max",
            Reducer::ArgMin => "argmin",
            Reducer::ArgMax => "argmax",
        }
    }

    /// Output dtype for an input of `dtype`.
    pub fn return_dtype(&self, dtype: DType) -> DType {
        match self {
            Reducer::Count | Reducer::CountNonzero | Reducer::ArgMin | Reducer::ArgMax => DType::Int64,
            Reducer::Sum | Reducer::Prod => dtype.accumulator(),
            Reducer::Any | Reducer::All => DType::Bool,
            Reducer::Min | Reducer::Max => dtype,
        }
    }

    /// Positional reducers report local positions within each group.
    #[inline]
    pub fn needs_position(&self) -> bool {
        matches!(self, Reducer::ArgMin | Reducer::ArgMax)
    }
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Content {
    /// Converts a user `axis` into the depth counted from the leaves.
    pub(crate) fn resolve_negaxis(&self, axis: i64) -> Result<i64> {
        let (branch, depth) = self.branch_depth();
        let mut negaxis = -axis;
        if !branch {
            if negaxis <= 0 {
                negaxis += depth;
            }
            if !(0 < negaxis && negaxis <= depth) {
                return Err(JaggedError::value(
                    self.classname(),
                    format!(
                        "axis={} exceeds the depth of the nested list structure (which is {})",
                        axis, depth
                    ),
                ));
            }
        } else {
            if negaxis <= 0 {
                return Err(JaggedError::value(
                    self.classname(),
                    "cannot use non-negative axis on a nested list structure of variable depth \
                     (negative axis counts from the leaves of the tree; non-negative from the root)",
                ));
            }
            if negaxis > depth {
                return Err(JaggedError::value(
                    self.classname(),
                    format!(
                        "cannot use axis={} on a nested list structure that splits into different \
                         depths, the minimum of which is depth={} from the leaves",
                        axis, depth
                    ),
                ));
            }
        }
        Ok(negaxis)
    }

    /// Reduces along `axis`.
    ///
    /// With `mask_identity`, groups with no elements are missing instead of
    /// holding the reducer's identity. With `keepdims`, the reduced
    /// dimension is kept with length 1.
    ///
    /// # Example
    /// ```rust
    /// use jagged::{Content, Index64, ListOffsetArray, NumpyArray, Reducer};
    ///
    /// let flat: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4]).into();
    /// let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 3, 3, 4]), flat)
    ///     .unwrap()
    ///     .into();
    /// let sums = lists.reduce(Reducer::Sum, -1, false, false).unwrap();
    /// assert_eq!(sums.to_value().unwrap().to_json(), "[6,0,4]");
    /// ```
    pub fn reduce(&self, reducer: Reducer, axis: i64, mask_identity: bool, keepdims: bool) -> Result<Element> {
        let negaxis = self.resolve_negaxis(axis)?;
        debug!(
            "reduce {} over {} (length {}) at axis={} (negaxis={})",
            reducer,
            self.classname(),
            self.length(),
            axis,
            negaxis
        );
        let starts = Index64::zeros(1);
        let parents = Index64::zeros(self.length());
        let next = self
            .reduce_next(reducer, negaxis, &starts, &parents, 1, mask_identity, keepdims)?
            .checked()?;
        next.getitem_at_nowrap(0)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn reduce_next(
        &self,
        reducer: Reducer,
        negaxis: i64,
        starts: &Index64,
        parents: &Index64,
        outlength: usize,
        mask: bool,
        keepdims: bool,
    ) -> Result<Content> {
        crate::match_content!(self, node => crate::traits::layout::Layout::reduce_next(
            node.as_ref(), reducer, negaxis, starts, parents, outlength, mask, keepdims
        ))
    }

    pub fn count(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::Count, axis, false, keepdims)
    }

    pub fn count_nonzero(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::CountNonzero, axis, false, keepdims)
    }

    pub fn sum(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::Sum, axis, false, keepdims)
    }

    pub fn prod(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::Prod, axis, false, keepdims)
    }

    pub fn any(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::Any, axis, false, keepdims)
    }

    pub fn all(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::All, axis, false, keepdims)
    }

    /// Minimum; empty groups are missing.
    pub fn min(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::Min, axis, true, keepdims)
    }

    /// Maximum; empty groups are missing.
    pub fn max(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::Max, axis, true, keepdims)
    }

    pub fn argmin(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::ArgMin, axis, true, keepdims)
    }

    pub fn argmax(&self, axis: i64, keepdims: bool) -> Result<Element> {
        self.reduce(Reducer::ArgMax, axis, true, keepdims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ListOffsetArray, NumpyArray, Value};

    fn lists() -> Content {
        let flat: Content = NumpyArray::from_vec(vec![1.0f64, 2.0, 3.0, 4.0, 5.0]).into();
        ListOffsetArray::new(Index64::from(vec![0i64, 3, 3, 5]), flat)
            .unwrap()
            .into()
    }

    #[test]
    fn test_return_dtypes() {
        assert_eq!(Reducer::Sum.return_dtype(DType::Bool), DType::Int64);
        assert_eq!(Reducer::Prod.return_dtype(DType::UInt8), DType::UInt64);
        assert_eq!(Reducer::Max.return_dtype(DType::Float32), DType::Float32);
        assert_eq!(Reducer::Any.return_dtype(DType::Int32), DType::Bool);
        assert_eq!(Reducer::ArgMin.return_dtype(DType::Float64), DType::Int64);
    }

    #[test]
    fn test_axis_resolution() {
        let a = lists();
        assert_eq!(a.resolve_negaxis(-1).unwrap(), 1);
        assert_eq!(a.resolve_negaxis(0).unwrap(), 2);
        assert_eq!(a.resolve_negaxis(1).unwrap(), 1);
        assert!(a.resolve_negaxis(2).is_err());
        assert!(a.resolve_negaxis(-3).is_err());
    }

    #[test]
    fn test_wrappers() {
        let a = lists();
        assert_eq!(a.count(-1, false).unwrap().to_value().unwrap().to_json(), "[3,0,2]");
        assert_eq!(
            a.max(-1, false).unwrap().to_value().unwrap(),
            Value::from(vec![Some(3.0), None, Some(5.0)])
        );
        assert_eq!(a.argmax(1, false).unwrap().to_value().unwrap().to_json(), "[2,null,1]");
        assert_eq!(a.sum(0, false).unwrap().to_value().unwrap().to_json(), "[5.0,7.0,3.0]");
    }
}
