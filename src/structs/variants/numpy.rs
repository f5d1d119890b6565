//! # **NumpyArray** - *Typed rectangular leaf blocks*
//!
//! The leaf of every layout tree: one primitive buffer plus a C-contiguous
//! shape. A multi-dimensional block behaves like nested `RegularArray`s and
//! is converted to that form whenever an operation has to descend into an
//! inner dimension.
//!
//! ## Dtypes
//! `bool`, `i8`..`i64`, `u8`..`u64`, `f32` and `f64`, held in the
//! dtype-erased [`NumpyData`].

use crate::aliases::{Index64, Index8, Parameters, Result};
use crate::enums::content::Content;
use crate::enums::dtype::DType;
use crate::enums::element::Element;
use crate::enums::error::{JaggedError, KernelContext};
use crate::enums::reducer::Reducer;
use crate::enums::scalar::Scalar;
use crate::enums::slice_item::SliceItem;
use crate::enums::value::Value;
use crate::kernels::getitem::{carry_bounds, regulararray_getitem_carry};
use crate::kernels::reducers::{reduce_adjust_starts, reduce_count, reduce_numpy};
use crate::match_numpy;
use crate::structs::buffer::Buffer;
use crate::structs::slice::Slice;
use crate::structs::variants::byte_masked::ByteMaskedArray;
use crate::structs::variants::regular::RegularArray;
use crate::traits::layout::Layout;
use crate::traits::primitive::{LeBytes, NumpyPrimitive, cast};

/// Dtype-erased leaf storage.
#[derive(Clone, Debug, PartialEq)]
pub enum NumpyData {
    Bool(Buffer<bool>),
    Int8(Buffer<i8>),
    Int16(Buffer<i16>),
    Int32(Buffer<i32>),
    Int64(Buffer<i64>),
    UInt8(Buffer<u8>),
    UInt16(Buffer<u16>),
    UInt32(Buffer<u32>),
    UInt64(Buffer<u64>),
    Float32(Buffer<f32>),
    Float64(Buffer<f64>),
}

#[inline]
fn dtype_of<T: NumpyPrimitive>(_: &Buffer<T>) -> DType {
    T::DTYPE
}

fn cast_slice<T: NumpyPrimitive>(data: &[T], dtype: DType) -> NumpyData {
    fn to<T: NumpyPrimitive, U: NumpyPrimitive>(data: &[T]) -> NumpyData {
        U::wrap(data.iter().map(|v| cast::<T, U>(*v)).collect())
    }
    match dtype {
        DType::Bool => to::<T, bool>(data),
        DType::Int8 => to::<T, i8>(data),
        DType::Int16 => to::<T, i16>(data),
        DType::Int32 => to::<T, i32>(data),
        DType::Int64 => to::<T, i64>(data),
        DType::UInt8 => to::<T, u8>(data),
        DType::UInt16 => to::<T, u16>(data),
        DType::UInt32 => to::<T, u32>(data),
        DType::UInt64 => to::<T, u64>(data),
        DType::Float32 => to::<T, f32>(data),
        DType::Float64 => to::<T, f64>(data),
    }
}

fn read_slice<T: NumpyPrimitive>(bytes: &[u8], len: usize) -> NumpyData {
    T::wrap(bytes.chunks_exact(T::WIDTH).take(len).map(T::read_le).collect())
}

impl NumpyData {
    pub fn dtype(&self) -> DType {
        match_numpy!(self, buf => dtype_of(buf))
    }

    pub fn len(&self) -> usize {
        match_numpy!(self, buf => buf.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-copy `[start, stop)`.
    pub fn slice(&self, start: usize, stop: usize) -> NumpyData {
        match_numpy!(self, buf => NumpyPrimitive::wrap(buf.slice(start, stop)))
    }

    /// Gathers by position; callers have checked the bounds.
    pub(crate) fn take(&self, carry: &Index64) -> NumpyData {
        match_numpy!(self, buf => NumpyPrimitive::wrap(carry.iter_i64().map(|i| buf[i as usize]).collect()))
    }

    pub fn scalar_at(&self, at: usize) -> Scalar {
        match_numpy!(self, buf => buf[at].to_scalar())
    }

    /// Converts every value with NumPy `astype` semantics.
    pub fn cast(&self, dtype: DType) -> NumpyData {
        if self.dtype() == dtype {
            return self.clone();
        }
        match_numpy!(self, buf => cast_slice(buf.as_slice(), dtype))
    }

    /// Concatenation after promoting both sides to a common dtype.
    pub fn concat(&self, other: &NumpyData) -> NumpyData {
        let dtype = self.dtype().promote(other.dtype());
        let (left, right) = (self.cast(dtype), other.cast(dtype));
        macro_rules! join {
            ($($variant:ident),*) => {
                match (&left, &right) {
                    $( (NumpyData::$variant(a), NumpyData::$variant(b)) => {
                        NumpyData::$variant(a.iter().chain(b.iter()).copied().collect())
                    } )*
                    _ => left.clone(),
                }
            };
        }
        join!(Bool, Int8, Int16, Int32, Int64, UInt8, UInt16, UInt32, UInt64, Float32, Float64)
    }

    /// Values as `i64`; floats truncate.
    pub fn to_index64(&self) -> Index64 {
        match_numpy!(self, buf => buf.iter().map(|v| v.as_i64()).collect())
    }

    /// Appends the little-endian encoding of every value.
    pub fn write_le(&self, out: &mut Vec<u8>) {
        match_numpy!(self, buf => buf.iter().for_each(|v| v.write_le(out)))
    }

    /// Decodes `len` values of `dtype`.
    pub fn read_le(dtype: DType, bytes: &[u8], len: usize) -> Result<NumpyData> {
        if bytes.len() < len * dtype.itemsize() {
            return Err(JaggedError::value(
                "NumpyArray",
                format!(
                    "buffer of {} bytes is too small for {} values of {}",
                    bytes.len(),
                    len,
                    dtype
                ),
            ));
        }
        Ok(match dtype {
            DType::Bool => read_slice::<bool>(bytes, len),
            DType::Int8 => read_slice::<i8>(bytes, len),
            DType::Int16 => read_slice::<i16>(bytes, len),
            DType::Int32 => read_slice::<i32>(bytes, len),
            DType::Int64 => read_slice::<i64>(bytes, len),
            DType::UInt8 => read_slice::<u8>(bytes, len),
            DType::UInt16 => read_slice::<u16>(bytes, len),
            DType::UInt32 => read_slice::<u32>(bytes, len),
            DType::UInt64 => read_slice::<u64>(bytes, len),
            DType::Float32 => read_slice::<f32>(bytes, len),
            DType::Float64 => read_slice::<f64>(bytes, len),
        })
    }

    /// An empty buffer of `dtype`.
    pub fn empty(dtype: DType) -> NumpyData {
        NumpyData::Float64(Buffer::default()).cast(dtype)
    }
}

/// # NumpyArray
///
/// A primitive buffer with a C-contiguous `shape`; `shape[0]` is the length.
///
/// ## Example
/// ```rust
/// use jagged::{Content, NumpyArray, NumpyData};
///
/// let grid = NumpyArray::new(NumpyData::Int32(vec![1, 2, 3, 4, 5, 6].into()), vec![2, 3]).unwrap();
/// let content: Content = grid.into();
/// assert_eq!(content.length(), 2);
/// assert_eq!(content.to_value().unwrap().to_json(), "[[1,2,3],[4,5,6]]");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct NumpyArray {
    data: NumpyData,
    shape: Vec<usize>,
    parameters: Parameters,
}

impl NumpyArray {
    pub fn new(data: NumpyData, shape: Vec<usize>) -> Result<Self> {
        let out = NumpyArray {
            data,
            shape,
            parameters: Parameters::new(),
        };
        match out.validity_error("NumpyArray") {
            None => Ok(out),
            Some(message) => Err(JaggedError::value("NumpyArray", message)),
        }
    }

    /// One-dimensional array from a vector.
    pub fn from_vec<T: NumpyPrimitive>(values: Vec<T>) -> Self {
        NumpyArray::from_buffer(Buffer::from(values))
    }

    pub fn from_buffer<T: NumpyPrimitive>(buffer: Buffer<T>) -> Self {
        NumpyArray::from_data(T::wrap(buffer))
    }

    /// One-dimensional array over `data`.
    pub fn from_data(data: NumpyData) -> Self {
        let shape = vec![data.len()];
        NumpyArray {
            data,
            shape,
            parameters: Parameters::new(),
        }
    }

    pub fn empty(dtype: DType) -> Self {
        NumpyArray::from_data(NumpyData::empty(dtype))
    }

    /// UTF-8 bytes tagged as string characters.
    pub fn from_str_bytes(text: &str) -> Self {
        NumpyArray::from_vec(text.as_bytes().to_vec()).with_parameter("__array__", "char")
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    #[inline]
    pub fn data(&self) -> &NumpyData {
        &self.data
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn inner_shape(&self) -> &[usize] {
        &self.shape[1..]
    }

    /// Number of values per outer element.
    #[inline]
    pub fn inner_size(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Integer values widened to `i64`.
    pub fn to_index64(&self) -> Index64 {
        self.data.to_index64()
    }

    /// The bytes as text when tagged `__array__ = "char"` or `"byte"`.
    pub fn as_string(&self) -> Option<String> {
        let tagged = matches!(
            self.parameters.get("__array__").and_then(|v| v.as_str()),
            Some("char") | Some("byte")
        );
        match &self.data {
            NumpyData::UInt8(bytes) if tagged => Some(String::from_utf8_lossy(bytes.as_slice()).into_owned()),
            _ => None,
        }
    }

    /// Nested `RegularArray`s over a flat leaf.
    pub fn to_regular_array(&self) -> Result<Content> {
        if self.ndim() == 1 {
            return Ok(self.clone().into());
        }
        let flat = NumpyArray {
            data: self.data.clone(),
            shape: vec![self.data.len()],
            parameters: self.parameters.clone(),
        };
        let mut out: Content = flat.into();
        for d in (1..self.ndim()).rev() {
            let outer: usize = self.shape[..d].iter().product();
            out = RegularArray::new(out, self.shape[d], outer)?.into();
        }
        Ok(out)
    }

    pub fn cast(&self, dtype: DType) -> NumpyArray {
        NumpyArray {
            data: self.data.cast(dtype),
            shape: self.shape.clone(),
            parameters: self.parameters.clone(),
        }
    }

    fn row(&self, at: usize) -> NumpyArray {
        let inner = self.inner_size();
        NumpyArray {
            data: self.data.slice(at * inner, (at + 1) * inner),
            shape: self.shape[1..].to_vec(),
            parameters: self.parameters.clone(),
        }
    }

    fn axis_error(&self) -> JaggedError {
        JaggedError::value(self.classname(), "axis exceeds the depth of this array")
    }
}

impl Layout for NumpyArray {
    fn classname(&self) -> String {
        "NumpyArray".to_string()
    }

    fn length(&self) -> usize {
        self.shape[0]
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn with_parameters(&self, parameters: Parameters) -> Content {
        NumpyArray {
            parameters,
            ..self.clone()
        }
        .into()
    }

    fn children(&self) -> Vec<Content> {
        Vec::new()
    }

    fn getitem_at_nowrap(&self, at: usize) -> Result<Element> {
        if self.ndim() == 1 {
            Ok(Element::Scalar(self.data.scalar_at(at)))
        } else {
            Ok(Element::List(self.row(at).into()))
        }
    }

    fn value_at(&self, at: usize) -> Result<Value> {
        if self.ndim() == 1 {
            if let Some(text) = self.getitem_range_nowrap(at, at + 1).ok().and_then(|c| match c {
                Content::Numpy(n) => n.as_string(),
                _ => None,
            }) {
                return Ok(Value::Str(text));
            }
            Ok(self.data.scalar_at(at).to_value())
        } else {
            Content::from(self.row(at)).to_value()
        }
    }

    fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Result<Content> {
        let inner = self.inner_size();
        let mut shape = self.shape.clone();
        shape[0] = stop - start;
        Ok(NumpyArray {
            data: self.data.slice(start * inner, stop * inner),
            shape,
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_field(&self, key: &str) -> Result<Content> {
        Err(JaggedError::field_not_found(key, self.classname()))
    }

    fn getitem_fields(&self, keys: &[String]) -> Result<Content> {
        Err(JaggedError::field_not_found(keys.join(", "), self.classname()))
    }

    fn carry(&self, carry: &Index64) -> Result<Content> {
        carry_bounds("numpyarray_getitem_carry", carry, self.length()).ctx(&self.classname())?;
        let inner = self.inner_size();
        let data = if self.ndim() == 1 {
            self.data.take(carry)
        } else {
            self.data.take(&regulararray_getitem_carry(carry, inner))
        };
        let mut shape = self.shape.clone();
        shape[0] = carry.len();
        Ok(NumpyArray {
            data,
            shape,
            parameters: self.parameters.clone(),
        }
        .into())
    }

    fn getitem_next(&self, head: &SliceItem, tail: &Slice, advanced: Option<&Index64>) -> Result<Content> {
        if self.ndim() == 1 {
            return Err(JaggedError::index(self.classname(), "too many dimensions in slice"));
        }
        self.to_regular_array()?.getitem_next(Some(head), tail, advanced)
    }

    fn getitem_next_jagged(
        &self,
        slicestarts: &Index64,
        slicestops: &Index64,
        slicecontent: &SliceItem,
        tail: &Slice,
    ) -> Result<Content> {
        if self.ndim() == 1 {
            return Err(JaggedError::index(
                self.classname(),
                "too many jagged slice dimensions for array",
            ));
        }
        self.to_regular_array()?
            .getitem_next_jagged(slicestarts, slicestops, slicecontent, tail)
    }

    fn purelist_depth(&self) -> i64 {
        self.ndim() as i64
    }

    fn minmax_depth(&self) -> (i64, i64) {
        (self.ndim() as i64, self.ndim() as i64)
    }

    fn branch_depth(&self) -> (bool, i64) {
        (false, self.ndim() as i64)
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn validity_error(&self, path: &str) -> Option<String> {
        if self.shape.is_empty() {
            return Some(format!("at {} (NumpyArray): shape must have at least one dimension", path));
        }
        let expected: usize = self.shape.iter().product();
        if expected != self.data.len() {
            return Some(format!(
                "at {} (NumpyArray): shape {:?} needs {} values, buffer has {}",
                path,
                self.shape,
                expected,
                self.data.len()
            ));
        }
        None
    }

    fn reduce_next(
        &self,
        reducer: Reducer,
        negaxis: i64,
        starts: &Index64,
        parents: &Index64,
        outlength: usize,
        mask: bool,
        keepdims: bool,
    ) -> Result<Content> {
        if self.ndim() > 1 {
            return self
                .to_regular_array()?
                .reduce_next(reducer, negaxis, starts, parents, outlength, mask, keepdims);
        }
        let classname = self.classname();
        let mut data = reduce_numpy(reducer, &self.data, parents, outlength).ctx(&classname)?;
        if reducer.needs_position() {
            if let NumpyData::Int64(positions) = &data {
                let mut adjusted = positions.to_vec();
                reduce_adjust_starts(&mut adjusted, parents, starts).ctx(&classname)?;
                data = NumpyData::Int64(adjusted.into());
            }
        }
        let mut out: Content = NumpyArray::from_data(data).into();
        if mask {
            let counts = reduce_count(parents, outlength).ctx(&classname)?;
            let bytemask: Index8 = counts.iter().map(|&c| (c == 0) as i8).collect();
            out = ByteMaskedArray::new(bytemask, out, false)?.into();
        }
        if keepdims {
            out = RegularArray::new(out, 1, outlength)?.into();
        }
        Ok(out)
    }

    fn mergeable(&self, other: &Content, mergebool: bool) -> bool {
        match other {
            Content::Numpy(o) => {
                if self.inner_shape() != o.inner_shape() {
                    return false;
                }
                mergebool || self.dtype().is_bool() == o.dtype().is_bool()
            }
            _ => false,
        }
    }

    fn merge(&self, other: &Content) -> Result<Content> {
        let Content::Numpy(o) = other else {
            return Err(JaggedError::not_implemented(format!(
                "cannot merge NumpyArray with {}",
                other.classname()
            )));
        };
        let mut shape = self.shape.clone();
        shape[0] += o.length();
        let parameters = if self.parameters == o.parameters {
            self.parameters.clone()
        } else {
            Parameters::new()
        };
        Ok(NumpyArray {
            data: self.data.concat(&o.data),
            shape,
            parameters,
        }
        .into())
    }

    fn num_next(&self, axis: i64, depth: i64) -> Result<Content> {
        if self.ndim() > 1 {
            return self.to_regular_array()?.num_next(axis, depth);
        }
        Err(self.axis_error())
    }

    fn offsets_and_flattened(&self, axis: i64, depth: i64) -> Result<(Option<Index64>, Content)> {
        if self.ndim() > 1 {
            return self.to_regular_array()?.offsets_and_flattened(axis, depth);
        }
        Err(self.axis_error())
    }

    fn local_index_next(&self, axis: i64, depth: i64) -> Result<Content> {
        if self.ndim() > 1 {
            return self.to_regular_array()?.local_index_next(axis, depth);
        }
        Err(self.axis_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_validation() {
        assert!(NumpyArray::new(NumpyData::Int64(vec![1, 2, 3].into()), vec![2, 2]).is_err());
        let ok = NumpyArray::new(NumpyData::Int64(vec![1, 2, 3, 4].into()), vec![2, 2]).unwrap();
        assert_eq!(ok.inner_size(), 2);
        assert_eq!(ok.purelist_depth(), 2);
    }

    #[test]
    fn test_carry_multidim() {
        let grid = NumpyArray::new(NumpyData::Int64(vec![1, 2, 3, 4, 5, 6].into()), vec![3, 2]).unwrap();
        let out = grid.carry(&Index64::from(vec![2i64, 0])).unwrap();
        assert_eq!(out.to_value().unwrap().to_json(), "[[5,6],[1,2]]");
        assert!(grid.carry(&Index64::from(vec![3i64])).is_err());
    }

    #[test]
    fn test_to_regular_array() {
        let cube = NumpyArray::new(NumpyData::Int8((0..12).collect::<Vec<i8>>().into()), vec![2, 3, 2]).unwrap();
        let regular = cube.to_regular_array().unwrap();
        assert_eq!(regular.classname(), "RegularArray");
        assert_eq!(regular.length(), 2);
        assert_eq!(regular.purelist_depth(), 3);
        assert_eq!(
            regular.to_value().unwrap(),
            Content::from(cube).to_value().unwrap()
        );
    }

    #[test]
    fn test_concat_promotes() {
        let a = NumpyData::Int8(vec![1i8, -1].into());
        let b = NumpyData::UInt8(vec![200u8].into());
        let c = a.concat(&b);
        assert_eq!(c.dtype(), DType::Int16);
        assert_eq!(c.to_index64().as_slice(), &[1, -1, 200]);
    }

    #[test]
    fn test_string_leaf() {
        let text = NumpyArray::from_str_bytes("héllo");
        assert_eq!(text.as_string().as_deref(), Some("héllo"));
        assert_eq!(NumpyArray::from_vec(vec![104u8]).as_string(), None);
    }

    #[test]
    fn test_le_round_trip() {
        let data = NumpyData::Float32(vec![1.5f32, -2.0].into());
        let mut bytes = Vec::new();
        data.write_le(&mut bytes);
        assert_eq!(NumpyData::read_le(DType::Float32, &bytes, 2).unwrap(), data);
        assert!(NumpyData::read_le(DType::Float64, &bytes, 2).is_err());
    }
}
