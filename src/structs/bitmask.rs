//! # **Bitmask Module** - *Packed Bit Masks*
//!
//! Packed validity bits backing [`BitMaskedArray`](crate::BitMaskedArray).
//!
//! ## Behaviour
//! - One bit per logical element, eight elements per byte.
//! - Bit order within a byte is chosen per mask: `lsb_order = true` puts the
//!   first element in the least significant bit (Arrow order), `false` in the
//!   most significant bit.
//! - Whether a set bit means "valid" is decided by the owning node's
//!   `valid_when`, not by the mask.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::structs::buffer::Buffer;

/// # Bitmask
///
/// Packed bits plus their logical length.
///
/// # Example
/// ```rust
/// use jagged::Bitmask;
///
/// let m = Bitmask::from_bools(&[true, false, true], true);
/// assert_eq!(m.bytes(), &[0b101]);
/// assert!(m.get(2, true));
/// assert_eq!(m.to_bools(true), vec![true, false, true]);
/// ```
#[derive(Clone, PartialEq, Default)]
pub struct Bitmask {
    pub bits: Buffer<u8>,
    pub len: usize,
}

impl Bitmask {
    /// Wraps packed bytes holding `len` logical bits.
    #[inline]
    pub fn new(bits: impl Into<Buffer<u8>>, len: usize) -> Self {
        Self {
            bits: bits.into(),
            len,
        }
    }

    /// Packs booleans in the given bit order; trailing bits are zero.
    pub fn from_bools(values: &[bool], lsb_order: bool) -> Self {
        let n_bytes = values.len().div_ceil(8);
        let mut bytes = vec![0u8; n_bytes];
        for (i, &v) in values.iter().enumerate() {
            if v {
                let shift = if lsb_order { i & 7 } else { 7 - (i & 7) };
                bytes[i >> 3] |= 1 << shift;
            }
        }
        Self::new(bytes, values.len())
    }

    /// Number of logical bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of packed bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bits.len()
    }

    #[inline(always)]
    pub fn bytes(&self) -> &[u8] {
        self.bits.as_slice()
    }

    /// Bit `idx` in the given order. Callers guarantee `idx < 8 * byte_len()`.
    #[inline]
    pub fn get(&self, idx: usize, lsb_order: bool) -> bool {
        let byte = self.bits[idx >> 3];
        let shift = if lsb_order { idx & 7 } else { 7 - (idx & 7) };
        (byte >> shift) & 1 == 1
    }

    /// Unpacks the first `len` bits.
    pub fn to_bools(&self, lsb_order: bool) -> Vec<bool> {
        (0..self.len).map(|i| self.get(i, lsb_order)).collect()
    }

    /// Number of set bits among the first `len`.
    pub fn count_ones(&self, lsb_order: bool) -> usize {
        (0..self.len).filter(|&i| self.get(i, lsb_order)).count()
    }
}

impl Debug for Bitmask {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Bitmask(len={}, bytes={:?})", self.len, self.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_packing() {
        let values = [true, true, false, false, true, false, false, false, true];
        let m = Bitmask::from_bools(&values, true);
        assert_eq!(m.bytes(), &[0b0001_0011, 0b0000_0001]);
        assert_eq!(m.byte_len(), 2);
        assert_eq!(m.to_bools(true), values.to_vec());
        assert_eq!(m.count_ones(true), 4);
    }

    #[test]
    fn test_msb_packing() {
        let values = [true, false, false, false, false, false, false, true, true];
        let m = Bitmask::from_bools(&values, false);
        assert_eq!(m.bytes(), &[0b1000_0001, 0b1000_0000]);
        assert!(m.get(0, false));
        assert!(!m.get(1, false));
        assert!(m.get(8, false));
        assert_eq!(m.to_bools(false), values.to_vec());
    }

    #[test]
    fn test_empty() {
        let m = Bitmask::from_bools(&[], true);
        assert!(m.is_empty());
        assert_eq!(m.byte_len(), 0);
    }
}
