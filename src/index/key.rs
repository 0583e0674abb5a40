//! Key encodings shared by the index structures.
//!
//! The hashing structures (Bloom filter, cuckoo table) never look at a key
//! directly: they hash its canonical byte sequence. Equal keys must produce
//! equal bytes; distinct keys may share bytes at the cost of a hash collision.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A key that can be reduced to a canonical byte sequence for hashing.
pub trait IndexKey {
    /// Append this key's canonical bytes to `out`.
    fn write_canonical(&self, out: &mut Vec<u8>);

    /// Canonical bytes as an owned buffer.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_canonical(&mut out);
        out
    }
}

impl<T: IndexKey + ?Sized> IndexKey for &T {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        (**self).write_canonical(out);
    }
}

impl IndexKey for str {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl IndexKey for String {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        self.as_str().write_canonical(out);
    }
}

impl IndexKey for [u8] {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl IndexKey for Vec<u8> {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl IndexKey for bool {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }
}

macro_rules! impl_index_key_int {
    ($($t:ty),*) => {
        $(
            impl IndexKey for $t {
                fn write_canonical(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_index_key_int!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

// Pointer-sized integers are widened so the encoding does not depend on the target.
impl IndexKey for usize {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        (*self as u64).write_canonical(out);
    }
}

impl IndexKey for isize {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        (*self as i64).write_canonical(out);
    }
}

/// Signed zeros collapse to `+0.0` and every NaN to the canonical quiet NaN.
impl IndexKey for f64 {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        let bits = if *self == 0.0 {
            0u64
        } else if self.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.to_bits()
        };
        out.extend_from_slice(&bits.to_le_bytes());
    }
}

/// `f64` ordered by IEEE 754 `totalOrder`, usable as a skip list key.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TotalF64(pub f64);

impl TotalF64 {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for TotalF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TotalF64 {}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for TotalF64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl IndexKey for TotalF64 {
    fn write_canonical(&self, out: &mut Vec<u8>) {
        self.0.write_canonical(out);
    }
}

impl From<f64> for TotalF64 {
    fn from(v: f64) -> Self {
        TotalF64(v)
    }
}

impl std::fmt::Display for TotalF64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
