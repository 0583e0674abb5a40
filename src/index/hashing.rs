//! Seeded hash functions over canonical key bytes.
//!
//! The cuckoo table needs two unrelated slot functions, so [`fx_hash`] and
//! [`sip_hash`] use different algorithms. The Bloom filter derives all of its
//! probes from one [`probe_pair`] via double hashing.

use fxhash::FxHasher64;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

/// Seed used when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 0x5eed_c01d_1dec_0001;

/// FxHash of `bytes` keyed by `seed`, with a final avalanche step.
pub fn fx_hash(seed: u64, bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher64::default();
    hasher.write_u64(seed);
    hasher.write(bytes);
    avalanche(hasher.finish())
}

/// SipHash (std's `DefaultHasher` with fixed keys) of `bytes` keyed by `seed`.
pub fn sip_hash(seed: u64, bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write_u64(seed);
    hasher.write(bytes);
    hasher.finish()
}

/// Two hashes for double hashing: `h2` is seeded by `h1`.
pub fn probe_pair(seed: u64, bytes: &[u8]) -> (u64, u64) {
    let h1 = fx_hash(seed, bytes);
    let h2 = fx_hash(h1, bytes);
    (h1, h2)
}

/// Position of probe `i`: `(h1 + i * h2) mod modulus`.
pub fn probe_index(h1: u64, h2: u64, i: u32, modulus: usize) -> usize {
    let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
    (hash % modulus as u64) as usize
}

// murmur3 fmix64; FxHash alone leaves the low bits weakly mixed
fn avalanche(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}
