//! Two-table cuckoo hash table.
//!
//! Every key has exactly one candidate slot per table: `h1(key)` in `table1`
//! and `h2(key)` in `table2`, where `h1` is FxHash and `h2` is SipHash over the
//! key's canonical bytes. Lookups and removals probe those two slots and
//! nothing else.
//!
//! Inserting into an occupied slot evicts ("kicks") the occupant into its slot
//! in the other table, which may evict another, alternating between the tables
//! for at most `max_kicks` rounds. If the chain has not settled by then the
//! insert fails and the entry left without a slot is handed back to the caller.
//! The table never resizes itself; growing it is the caller's decision.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::hash::Hash;

use fxhash::FxHashSet;

use super::hashing::{fx_hash, sip_hash, DEFAULT_SEED};
use super::{IndexError, IndexKey};

/// Construction parameters for a [`CuckooHashTable`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuckooConfig {
    /// Slots per table
    pub table_size: usize,
    /// Displacement rounds before an insert gives up
    pub max_kicks: usize,
    /// Seed for both slot hashes
    pub seed: u64,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        Self {
            table_size: 101,
            max_kicks: 20,
            seed: DEFAULT_SEED,
        }
    }
}

impl CuckooConfig {
    pub fn new(table_size: usize) -> Self {
        Self {
            table_size,
            ..Default::default()
        }
    }

    /// Size each table at twice the expected key count.
    pub fn for_keys(expected_keys: usize) -> Self {
        Self::new((2 * expected_keys).max(1))
    }

    pub fn with_max_kicks(mut self, max_kicks: usize) -> Self {
        self.max_kicks = max_kicks;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.table_size == 0 {
            return Err(IndexError::invalid("table_size", "must be greater than zero"));
        }
        if self.max_kicks == 0 {
            return Err(IndexError::invalid("max_kicks", "must be at least 1"));
        }
        Ok(())
    }
}

/// Insert gave up after `max_kicks` displacement rounds.
///
/// `key`/`value` is the entry left without a slot. It is the last entry
/// evicted, which may be the one the caller passed in or one that was stored
/// before. Every other entry is still in the table.
#[derive(Debug, thiserror::Error)]
#[error("Cuckoo insert gave up after {max_kicks} displacement rounds")]
pub struct CuckooInsertError<K, V> {
    pub max_kicks: usize,
    pub key: K,
    pub value: V,
}

impl<K, V> CuckooInsertError<K, V> {
    pub fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }
}

/// Exact key to value store with two probes per lookup.
#[derive(Debug, Clone)]
pub struct CuckooHashTable<K, V> {
    table1: Vec<Option<(K, V)>>,
    table2: Vec<Option<(K, V)>>,
    max_kicks: usize,
    seed: u64,
    /// Number of inserts that hit the displacement limit
    insert_failures: usize,
    len: usize,
}

impl<K, V> CuckooHashTable<K, V>
where
    K: IndexKey + Eq,
{
    pub fn new(table_size: usize, max_kicks: usize) -> Result<Self, IndexError> {
        Self::with_config(CuckooConfig::new(table_size).with_max_kicks(max_kicks))
    }

    pub fn with_config(config: CuckooConfig) -> Result<Self, IndexError> {
        config.validate()?;
        tracing::debug!(
            table_size = config.table_size,
            max_kicks = config.max_kicks,
            "creating cuckoo hash table"
        );

        Ok(Self {
            table1: (0..config.table_size).map(|_| None).collect(),
            table2: (0..config.table_size).map(|_| None).collect(),
            max_kicks: config.max_kicks,
            seed: config.seed,
            insert_failures: 0,
            len: 0,
        })
    }

    /// Insert or overwrite `key`.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), CuckooInsertError<K, V>> {
        let pos1 = self.slot1(&key);
        if let Some((k, v)) = &mut self.table1[pos1] {
            if *k == key {
                *v = value;
                return Ok(());
            }
        }
        let pos2 = self.slot2(&key);
        if let Some((k, v)) = &mut self.table2[pos2] {
            if *k == key {
                *v = value;
                return Ok(());
            }
        }

        // The key is in neither table, so no entry in the chain below can
        // match the slot it lands on.
        let mut entry = (key, value);
        for _ in 0..self.max_kicks {
            let pos1 = self.slot1(&entry.0);
            match self.table1[pos1].replace(entry) {
                None => {
                    self.len += 1;
                    return Ok(());
                }
                Some(evicted) => entry = evicted,
            }

            let pos2 = self.slot2(&entry.0);
            match self.table2[pos2].replace(entry) {
                None => {
                    self.len += 1;
                    return Ok(());
                }
                Some(evicted) => entry = evicted,
            }
        }

        self.insert_failures += 1;
        tracing::warn!(
            max_kicks = self.max_kicks,
            failures = self.insert_failures,
            "cuckoo insert hit the displacement limit"
        );
        let (key, value) = entry;
        Err(CuckooInsertError {
            max_kicks: self.max_kicks,
            key,
            value,
        })
    }

    /// Value stored for `key`, probing one slot per table.
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: IndexKey + Eq + ?Sized,
    {
        let (table, pos) = self.locate(key)?;
        let slots = if table == 0 { &self.table1 } else { &self.table2 };
        slots[pos].as_ref().map(|(_, v)| v)
    }

    pub fn search_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: IndexKey + Eq + ?Sized,
    {
        let (table, pos) = self.locate(key)?;
        let slots = if table == 0 { &mut self.table1 } else { &mut self.table2 };
        slots[pos].as_mut().map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: IndexKey + Eq + ?Sized,
    {
        self.locate(key).is_some()
    }

    /// Remove `key`. Returns false if it was in neither table.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: IndexKey + Eq + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Remove `key` and return its value.
    pub fn take<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: IndexKey + Eq + ?Sized,
    {
        let (table, pos) = self.locate(key)?;
        let slots = if table == 0 { &mut self.table1 } else { &mut self.table2 };
        let (_, value) = slots[pos].take()?;
        self.len -= 1;
        Some(value)
    }

    /// Table (0 or 1) and slot holding `key`.
    fn locate<Q>(&self, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: IndexKey + Eq + ?Sized,
    {
        let bytes = key.canonical_bytes();

        let pos1 = self.reduce(fx_hash(self.seed, &bytes));
        if matches!(&self.table1[pos1], Some((k, _)) if Borrow::<Q>::borrow(k) == key) {
            return Some((0, pos1));
        }
        let pos2 = self.reduce(sip_hash(self.seed, &bytes));
        if matches!(&self.table2[pos2], Some((k, _)) if Borrow::<Q>::borrow(k) == key) {
            return Some((1, pos2));
        }
        None
    }

    fn slot1(&self, key: &K) -> usize {
        self.reduce(fx_hash(self.seed, &key.canonical_bytes()))
    }

    fn slot2(&self, key: &K) -> usize {
        self.reduce(sip_hash(self.seed, &key.canonical_bytes()))
    }
}

impl<K, V> CuckooHashTable<K, V> {
    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots per table
    pub fn table_size(&self) -> usize {
        self.table1.len()
    }

    pub fn max_kicks(&self) -> usize {
        self.max_kicks
    }

    pub fn insert_failures(&self) -> usize {
        self.insert_failures
    }

    /// Occupied slots across both tables, counted by scanning
    pub fn count_filled(&self) -> usize {
        self.table1
            .iter()
            .chain(self.table2.iter())
            .filter(|slot| slot.is_some())
            .count()
    }

    /// Occupied fraction of all slots in both tables
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / (2 * self.table_size()) as f64
    }

    /// Stored entries, `table1` first
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.table1
            .iter()
            .chain(self.table2.iter())
            .filter_map(|slot| slot.as_ref().map(|(k, v)| (k, v)))
    }

    /// Consume the table, yielding its entries for a rebuild.
    pub fn into_entries(self) -> Vec<(K, V)> {
        self.table1
            .into_iter()
            .chain(self.table2)
            .flatten()
            .collect()
    }

    pub fn memory_bytes(&self) -> usize {
        (self.table1.capacity() + self.table2.capacity()) * std::mem::size_of::<Option<(K, V)>>()
    }

    fn reduce(&self, hash: u64) -> usize {
        (hash % self.table1.len() as u64) as usize
    }
}

impl<K: Hash + Eq, V> CuckooHashTable<K, V> {
    /// Consistency check: true if any key occupies more than one slot, within
    /// one table or across both. A table built through `insert` never does.
    pub fn has_collision(&self) -> bool {
        let mut seen = FxHashSet::default();
        self.table1
            .iter()
            .chain(self.table2.iter())
            .flatten()
            .any(|(k, _)| !seen.insert(k))
    }
}
