//! # **Macros** - *Dispatch over the closed node and dtype sets*

/// Dispatches an expression over every [`Content`](crate::Content) variant.
///
/// `match_content!(self, node => node.length())` binds `node` to the inner
/// `Arc<...>` of whichever variant is present.
#[macro_export]
macro_rules! match_content {
    ($content:expr, $node:ident => $body:expr) => {
        match $content {
            $crate::Content::Empty($node) => $body,
            $crate::Content::Numpy($node) => $body,
            $crate::Content::Regular($node) => $body,
            $crate::Content::List32($node) => $body,
            $crate::Content::ListU32($node) => $body,
            $crate::Content::List64($node) => $body,
            $crate::Content::ListOffset32($node) => $body,
            $crate::Content::ListOffsetU32($node) => $body,
            $crate::Content::ListOffset64($node) => $body,
            $crate::Content::Indexed32($node) => $body,
            $crate::Content::IndexedU32($node) => $body,
            $crate::Content::Indexed64($node) => $body,
            $crate::Content::IndexedOption32($node) => $body,
            $crate::Content::IndexedOption64($node) => $body,
            $crate::Content::ByteMasked($node) => $body,
            $crate::Content::BitMasked($node) => $body,
            $crate::Content::Unmasked($node) => $body,
            $crate::Content::Record($node) => $body,
            $crate::Content::Union8I32($node) => $body,
            $crate::Content::Union8U32($node) => $body,
            $crate::Content::Union8I64($node) => $body,
        }
    };
}

/// Dispatches an expression over every [`NumpyData`](crate::NumpyData) buffer.
///
/// `match_numpy!(&self.data, buf => buf.len())` binds `buf` to the typed
/// `Buffer<T>`.
#[macro_export]
macro_rules! match_numpy {
    ($data:expr, $buf:ident => $body:expr) => {
        match $data {
            $crate::NumpyData::Bool($buf) => $body,
            $crate::NumpyData::Int8($buf) => $body,
            $crate::NumpyData::Int16($buf) => $body,
            $crate::NumpyData::Int32($buf) => $body,
            $crate::NumpyData::Int64($buf) => $body,
            $crate::NumpyData::UInt8($buf) => $body,
            $crate::NumpyData::UInt16($buf) => $body,
            $crate::NumpyData::UInt32($buf) => $body,
            $crate::NumpyData::UInt64($buf) => $body,
            $crate::NumpyData::Float32($buf) => $body,
            $crate::NumpyData::Float64($buf) => $body,
        }
    };
}

/// Implements [`LeBytes`](crate::traits::primitive::LeBytes) for the
/// fixed-width numeric types.
macro_rules! impl_le_bytes {
    ($($t:ty),*) => {
        $(
            impl $crate::traits::primitive::LeBytes for $t {
                const WIDTH: usize = std::mem::size_of::<$t>();

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..std::mem::size_of::<$t>()]);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

pub(crate) use impl_le_bytes;
