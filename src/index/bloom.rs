//! Bloom filter for fast membership testing
//!
//! Used to answer "is this value possibly in the column?" without touching the
//! column. A negative answer is certain; a positive answer may be a false
//! positive at roughly the configured rate. Bits are only ever set, so there is
//! no deletion: shrinking or resetting a filter means building a new one.

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

use super::hashing::{probe_index, probe_pair, DEFAULT_SEED};
use super::{IndexError, IndexKey};

/// Bit-array size and probe count of a Bloom filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomParams {
    /// Number of bits (m)
    pub num_bits: usize,
    /// Number of hash probes (k)
    pub num_hashes: u32,
}

impl BloomParams {
    /// Optimal parameters for `expected_items` (N) at `false_positive_rate` (p):
    /// `m = ceil(-N ln p / (ln 2)^2)` and `k = round((m / N) ln 2)`, at least 1.
    pub fn optimal(expected_items: usize, false_positive_rate: f64) -> Result<Self, IndexError> {
        if expected_items == 0 {
            return Err(IndexError::invalid("expected_items", "must be greater than zero"));
        }
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(IndexError::invalid(
                "false_positive_rate",
                format!("{} is not in the open interval (0, 1)", false_positive_rate),
            ));
        }

        let n = expected_items as f64;
        let num_bits = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil() as usize;
        let num_bits = num_bits.max(1);
        let num_hashes = ((num_bits as f64 / n) * LN_2).round() as u32;

        Ok(Self {
            num_bits,
            num_hashes: num_hashes.max(1),
        })
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.num_bits == 0 {
            return Err(IndexError::invalid("num_bits", "must be greater than zero"));
        }
        if self.num_hashes == 0 {
            return Err(IndexError::invalid("num_hashes", "must be at least 1"));
        }
        Ok(())
    }

    /// Theoretical false positive rate after `items` insertions:
    /// `(1 - e^(-k n / m))^k`.
    pub fn expected_false_positive_rate(&self, items: usize) -> f64 {
        let k = self.num_hashes as f64;
        let exponent = -k * items as f64 / self.num_bits as f64;
        (1.0 - exponent.exp()).powf(k)
    }
}

/// A space-efficient probabilistic data structure for membership testing.
/// False positives are possible, but false negatives are not.
#[derive(Clone)]
pub struct BloomFilter {
    /// Bit array
    bits: Vec<u64>,
    /// Number of hash functions
    num_hashes: u32,
    /// Number of bits
    num_bits: usize,
    /// Number of `add` calls
    count: usize,
    /// Seed for the probe hashes
    seed: u64,
}

impl BloomFilter {
    /// Create a bloom filter sized for `expected_items` at `false_positive_rate`.
    ///
    /// # Arguments
    /// * `expected_items` - Expected number of items to insert
    /// * `false_positive_rate` - Desired false positive rate (e.g., 0.01 for 1%)
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Result<Self, IndexError> {
        let params = BloomParams::optimal(expected_items, false_positive_rate)?;
        Self::seeded(params, DEFAULT_SEED)
    }

    /// Create a bloom filter with an explicit bit-array size and probe count
    pub fn with_params(num_bits: usize, num_hashes: u32) -> Result<Self, IndexError> {
        Self::seeded(BloomParams { num_bits, num_hashes }, DEFAULT_SEED)
    }

    /// Create a bloom filter whose probe hashes are keyed by `seed`
    pub fn seeded(params: BloomParams, seed: u64) -> Result<Self, IndexError> {
        params.validate()?;
        let num_words = params.num_bits.div_ceil(64);

        tracing::debug!(
            num_bits = params.num_bits,
            num_hashes = params.num_hashes,
            "creating bloom filter"
        );

        Ok(Self {
            bits: vec![0u64; num_words],
            num_hashes: params.num_hashes,
            num_bits: params.num_bits,
            count: 0,
            seed,
        })
    }

    /// Add an item. Adding the same item twice sets no new bits.
    pub fn add<T: IndexKey + ?Sized>(&mut self, item: &T) {
        let (h1, h2) = self.hash_pair(item);

        for i in 0..self.num_hashes {
            let idx = probe_index(h1, h2, i, self.num_bits);
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }

        self.count += 1;
    }

    /// Check if an item might be in the set.
    /// Returns true if the item might be present, false if definitely not present.
    pub fn check<T: IndexKey + ?Sized>(&self, item: &T) -> bool {
        let (h1, h2) = self.hash_pair(item);

        (0..self.num_hashes).all(|i| {
            let idx = probe_index(h1, h2, i, self.num_bits);
            self.bits[idx / 64] & (1u64 << (idx % 64)) != 0
        })
    }

    pub fn params(&self) -> BloomParams {
        BloomParams {
            num_bits: self.num_bits,
            num_hashes: self.num_hashes,
        }
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Get the number of `add` calls, duplicates included
    pub fn count(&self) -> usize {
        self.count
    }

    /// Check if nothing has been added
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of bits currently set
    pub fn bits_set(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Get the estimated false positive rate based on current fill
    pub fn estimated_false_positive_rate(&self) -> f64 {
        let fill_ratio = self.bits_set() as f64 / self.num_bits as f64;
        fill_ratio.powi(self.num_hashes as i32)
    }

    /// Get memory usage in bytes
    pub fn memory_bytes(&self) -> usize {
        self.bits.len() * 8
    }

    /// Merge another bloom filter into this one (union).
    /// Both filters must share size, probe count and seed.
    pub fn merge(&mut self, other: &BloomFilter) -> Result<(), IndexError> {
        if self.num_bits != other.num_bits
            || self.num_hashes != other.num_hashes
            || self.seed != other.seed
        {
            return Err(IndexError::IncompatibleFilters);
        }

        for (a, b) in self.bits.iter_mut().zip(other.bits.iter()) {
            *a |= *b;
        }
        self.count += other.count;
        Ok(())
    }

    fn hash_pair<T: IndexKey + ?Sized>(&self, item: &T) -> (u64, u64) {
        let mut bytes = Vec::new();
        item.write_canonical(&mut bytes);
        probe_pair(self.seed, &bytes)
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("count", &self.count)
            .field("memory_bytes", &self.memory_bytes())
            .field("estimated_fpr", &self.estimated_false_positive_rate())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_add_check() {
        let mut bf = BloomFilter::new(100, 0.01).unwrap();

        bf.add("hello");
        bf.add("world");

        assert!(bf.check("hello"));
        assert!(bf.check("world"));
        assert!(!bf.check("foo")); // Might have false positive, but unlikely
    }

    #[test]
    fn test_optimal_params() {
        let params = BloomParams::optimal(1000, 0.01).unwrap();
        assert_eq!(params.num_bits, 9586);
        assert_eq!(params.num_hashes, 7);

        let bf = BloomFilter::new(1000, 0.01).unwrap();
        assert_eq!(bf.params(), params);
        assert_eq!(bf.memory_bytes(), 150 * 8);
    }

    #[test]
    fn test_invalid_params() {
        assert!(BloomParams::optimal(0, 0.01).is_err());
        assert!(BloomParams::optimal(10, 0.0).is_err());
        assert!(BloomParams::optimal(10, 1.0).is_err());
        assert!(BloomFilter::with_params(0, 3).is_err());
        assert!(matches!(
            BloomFilter::with_params(64, 0),
            Err(IndexError::InvalidParameter { name: "num_hashes", .. })
        ));
    }

    #[test]
    fn test_i64_values() {
        let mut bf = BloomFilter::new(1000, 0.01).unwrap();

        for i in 0..100i64 {
            bf.add(&(i * 2)); // Add even numbers
        }

        // All even numbers should be found
        for i in 0..100i64 {
            assert!(bf.check(&(i * 2)));
        }

        // Most odd numbers should not be found (some false positives possible)
        let mut false_positives = 0;
        for i in 0..100i64 {
            if bf.check(&(i * 2 + 1)) {
                false_positives += 1;
            }
        }
        assert!(false_positives < 10, "Too many false positives: {}", false_positives);
    }

    #[test]
    fn test_false_positive_rate() {
        let mut bf = BloomFilter::new(1000, 0.01).unwrap();

        for i in 0..1000i64 {
            bf.add(&i);
        }

        // Check items not inserted
        let mut false_positives = 0;
        let test_count = 20000;
        for i in 1000..(1000 + test_count as i64) {
            if bf.check(&i) {
                false_positives += 1;
            }
        }

        let fpr = false_positives as f64 / test_count as f64;
        // Should be close to 1%
        assert!(fpr < 0.025, "False positive rate too high: {:.2}%", fpr * 100.0);
        assert!(fpr > 0.002, "False positive rate suspiciously low: {:.2}%", fpr * 100.0);

        let expected = bf.params().expected_false_positive_rate(1000);
        assert!((expected - 0.01).abs() < 0.002);
    }

    #[test]
    fn test_duplicate_add_sets_no_new_bits() {
        let mut bf = BloomFilter::with_params(512, 4).unwrap();
        bf.add("same");
        let set = bf.bits_set();
        bf.add("same");
        assert_eq!(bf.bits_set(), set);
        assert_eq!(bf.count(), 2);
    }

    #[test]
    fn test_seed_changes_positions() {
        let params = BloomParams { num_bits: 4096, num_hashes: 3 };
        let mut a = BloomFilter::seeded(params, 1).unwrap();
        let mut b = BloomFilter::seeded(params, 2).unwrap();
        a.add("value");
        b.add("value");

        assert!(a.check("value"));
        assert!(b.check("value"));
        assert_ne!(a.bits, b.bits);
    }

    #[test]
    fn test_merge() {
        let mut bf1 = BloomFilter::new(100, 0.01).unwrap();
        let mut bf2 = BloomFilter::new(100, 0.01).unwrap();

        bf1.add("hello");
        bf2.add("world");

        bf1.merge(&bf2).unwrap();

        assert!(bf1.check("hello"));
        assert!(bf1.check("world"));
        assert_eq!(bf1.count(), 2);
    }

    #[test]
    fn test_merge_incompatible() {
        let mut bf1 = BloomFilter::new(100, 0.01).unwrap();
        let bf2 = BloomFilter::new(1000, 0.01).unwrap();
        assert_eq!(bf1.merge(&bf2), Err(IndexError::IncompatibleFilters));
    }

    #[test]
    fn test_memory_size() {
        let bf = BloomFilter::new(10000, 0.01).unwrap();
        // ~12KB for 10000 items at 1% FPR
        assert!(bf.memory_bytes() < 20000);
        assert!(bf.memory_bytes() > 5000);
    }
}
