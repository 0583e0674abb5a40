//! Ordered skip list over totally-ordered keys.
//!
//! Nodes live in an arena and link to each other by `u32` index. Slot 0 is the
//! header: it holds no key and carries one link per level. Removed slots are
//! recycled through a free list.
//!
//! Levels are numbered `0..=max_level`. A node drawn at level `r` is linked into
//! the chains of levels `0..=r`; every chain is strictly increasing and is a
//! subsequence of the chain below it.
//!
//! ```text
//! Level 2: HEAD ----------------------> 9 -> NIL
//! Level 1: HEAD -> 1 -----------------> 9 -> NIL
//! Level 0: HEAD -> 1 -> 3 ----> 5 ----> 9 -> NIL
//! ```
//!
//! Level promotion draws from an injected [`rand::Rng`], so a seeded generator
//! gives a reproducible shape.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::IndexError;

/// Highest `max_level` a list accepts.
pub const MAX_LEVEL_CEILING: usize = 32;

/// Node index type.
type Idx = u32;

/// Null link marker.
const NIL: Idx = Idx::MAX;

/// Arena slot of the header node.
const HEAD: Idx = 0;

/// Arena capacity, header included. `NIL` is never a valid slot.
pub const MAX_NODES: usize = NIL as usize;

/// Slot index for the `len`-th arena entry, if the arena has room for it.
fn arena_index(len: usize) -> Option<Idx> {
    Idx::try_from(len).ok().filter(|&idx| idx != NIL)
}

/// Construction parameters for a [`SkipList`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipListConfig {
    /// Highest level a node can be promoted to
    pub max_level: usize,
    /// Chance that a node is promoted one more level
    pub promotion_probability: f64,
    /// Seed for level promotion (entropy when absent)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SkipListConfig {
    fn default() -> Self {
        Self {
            max_level: 4,
            promotion_probability: 0.5,
            seed: None,
        }
    }
}

impl SkipListConfig {
    pub fn new(max_level: usize, promotion_probability: f64) -> Self {
        Self {
            max_level,
            promotion_probability,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        if self.max_level > MAX_LEVEL_CEILING {
            return Err(IndexError::invalid(
                "max_level",
                format!("{} exceeds the ceiling of {}", self.max_level, MAX_LEVEL_CEILING),
            ));
        }
        let p = self.promotion_probability;
        if !(p > 0.0 && p < 1.0) {
            return Err(IndexError::invalid(
                "promotion_probability",
                format!("{} is not in the open interval (0, 1)", p),
            ));
        }
        Ok(())
    }
}

struct Node<K> {
    /// `None` for the header and for free slots.
    key: Option<K>,
    /// One forward link per level this node participates in.
    forward: Vec<Idx>,
}

/// Probabilistically balanced ordered set without duplicates.
///
/// Holds at most `MAX_NODES - 1` keys; inserting past that panics.
pub struct SkipList<K, R = StdRng> {
    /// Arena of nodes; slot 0 is the header.
    nodes: Vec<Node<K>>,
    /// Slots released by `delete`, reused by `insert`.
    free_list: Vec<Idx>,
    max_level: usize,
    promotion_probability: f64,
    /// Highest level that currently has at least one node (0 when empty).
    level: usize,
    len: usize,
    rng: R,
}

impl<K: Ord> SkipList<K, StdRng> {
    /// Create a list seeded from OS entropy.
    pub fn new(max_level: usize, promotion_probability: f64) -> Result<Self, IndexError> {
        Self::with_config(SkipListConfig::new(max_level, promotion_probability))
    }

    pub fn with_config(config: SkipListConfig) -> Result<Self, IndexError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config.max_level, config.promotion_probability, rng)
    }
}

impl<K: Ord, R: Rng> SkipList<K, R> {
    /// Create a list that draws promotion levels from `rng`.
    pub fn with_rng(
        max_level: usize,
        promotion_probability: f64,
        rng: R,
    ) -> Result<Self, IndexError> {
        SkipListConfig::new(max_level, promotion_probability).validate()?;
        tracing::debug!(max_level, promotion_probability, "creating skip list");

        let header = Node {
            key: None,
            forward: vec![NIL; max_level + 1],
        };
        Ok(Self {
            nodes: vec![header],
            free_list: Vec::new(),
            max_level,
            promotion_probability,
            level: 0,
            len: 0,
            rng,
        })
    }

    /// Insert `key`. Returns false, leaving the list untouched, if it is already present.
    pub fn insert(&mut self, key: K) -> bool {
        let mut update = vec![HEAD; self.max_level + 1];
        let next = self.descend(&key, |level, idx| update[level] = idx);

        if self.holds(next, &key) {
            return false;
        }

        // Levels above the current top keep HEAD as their predecessor
        let node_level = self.random_level();
        if node_level > self.level {
            self.level = node_level;
        }

        let idx = self.alloc_node(key, node_level);
        for (level, &prev) in update.iter().enumerate().take(node_level + 1) {
            let after = self.forward(prev, level);
            self.nodes[idx as usize].forward[level] = after;
            self.nodes[prev as usize].forward[level] = idx;
        }

        self.len += 1;
        true
    }

    /// Whether `key` is present.
    pub fn search(&self, key: &K) -> bool {
        let next = self.descend(key, |_, _| {});
        self.holds(next, key)
    }

    /// Remove `key`. Returns false if it was not present.
    pub fn delete(&mut self, key: &K) -> bool {
        let mut update = vec![HEAD; self.max_level + 1];
        let target = self.descend(key, |level, idx| update[level] = idx);

        if !self.holds(target, key) {
            return false;
        }

        let height = self.nodes[target as usize].forward.len();
        for (level, &prev) in update.iter().enumerate().take(height) {
            if self.forward(prev, level) != target {
                continue;
            }
            self.nodes[prev as usize].forward[level] = self.nodes[target as usize].forward[level];
        }
        self.release(target);

        while self.level > 0 && self.forward(HEAD, self.level) == NIL {
            self.level -= 1;
        }

        self.len -= 1;
        true
    }

    /// Replace `old` with `new`. Returns false, mutating nothing, if `old` is absent.
    ///
    /// If `new` is already present the result is just the removal of `old`.
    pub fn update(&mut self, old: &K, new: K) -> bool {
        if !self.delete(old) {
            return false;
        }
        self.insert(new);
        true
    }

    /// Smallest key.
    pub fn first(&self) -> Option<&K> {
        self.iter().next()
    }

    /// Largest key, found by running right along each level.
    pub fn last(&self) -> Option<&K> {
        let mut current = HEAD;
        for level in (0..=self.level).rev() {
            while self.forward(current, level) != NIL {
                current = self.forward(current, level);
            }
        }
        self.nodes[current as usize].key.as_ref()
    }

    fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level < self.max_level && self.rng.gen_bool(self.promotion_probability) {
            level += 1;
        }
        level
    }
}

impl<K: Ord, R> SkipList<K, R> {
    /// Walk from the top level down to level 0, stopping at each level on the
    /// last node whose key is below `key`. `record` sees that node per level.
    /// Returns the level-0 successor, the only node that can hold `key`.
    fn descend(&self, key: &K, mut record: impl FnMut(usize, Idx)) -> Idx {
        let mut current = HEAD;
        for level in (0..=self.level).rev() {
            loop {
                let next = self.forward(current, level);
                if next != NIL && self.precedes(next, key) {
                    current = next;
                } else {
                    break;
                }
            }
            record(level, current);
        }
        self.forward(current, 0)
    }

    fn precedes(&self, idx: Idx, key: &K) -> bool {
        matches!(&self.nodes[idx as usize].key, Some(k) if k < key)
    }

    fn holds(&self, idx: Idx, key: &K) -> bool {
        idx != NIL && matches!(&self.nodes[idx as usize].key, Some(k) if k == key)
    }
}

impl<K, R> SkipList<K, R> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Highest populated level; 0 for an empty list.
    pub fn current_level(&self) -> usize {
        self.level
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn promotion_probability(&self) -> f64 {
        self.promotion_probability
    }

    /// Keys in increasing order (the level-0 chain).
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            nodes: &self.nodes,
            next: self.forward(HEAD, 0),
        }
    }

    /// Keys linked at `level`, in order. Empty above the current level.
    pub fn level_keys(&self, level: usize) -> Vec<&K> {
        let mut keys = Vec::new();
        if level > self.level {
            return keys;
        }
        let mut idx = self.forward(HEAD, level);
        while idx != NIL {
            let node = &self.nodes[idx as usize];
            if let Some(key) = node.key.as_ref() {
                keys.push(key);
            }
            idx = node.forward[level];
        }
        keys
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_bytes(&self) -> usize {
        let links: usize = self.nodes.iter().map(|n| n.forward.capacity()).sum();
        self.nodes.capacity() * std::mem::size_of::<Node<K>>()
            + links * std::mem::size_of::<Idx>()
            + self.free_list.capacity() * std::mem::size_of::<Idx>()
    }

    fn forward(&self, idx: Idx, level: usize) -> Idx {
        self.nodes[idx as usize].forward.get(level).copied().unwrap_or(NIL)
    }

    fn alloc_node(&mut self, key: K, level: usize) -> Idx {
        if let Some(idx) = self.free_list.pop() {
            let node = &mut self.nodes[idx as usize];
            node.key = Some(key);
            node.forward.clear();
            node.forward.resize(level + 1, NIL);
            idx
        } else {
            let idx = arena_index(self.nodes.len())
                .unwrap_or_else(|| panic!("skip list arena is full ({} slots)", MAX_NODES));
            self.nodes.push(Node {
                key: Some(key),
                forward: vec![NIL; level + 1],
            });
            idx
        }
    }

    fn release(&mut self, idx: Idx) {
        let node = &mut self.nodes[idx as usize];
        node.key = None;
        node.forward.clear();
        self.free_list.push(idx);
    }
}

/// Iterator over the keys of a [`SkipList`] in increasing order.
pub struct Iter<'a, K> {
    nodes: &'a [Node<K>],
    next: Idx,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        if self.next == NIL {
            return None;
        }
        let node = &self.nodes[self.next as usize];
        self.next = node.forward[0];
        node.key.as_ref()
    }
}

impl<'a, K, R> IntoIterator for &'a SkipList<K, R> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K: Ord, R: Rng> Extend<K> for SkipList<K, R> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

/// One line per level, top level first.
impl<K: fmt::Display, R> fmt::Display for SkipList<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in (0..=self.level).rev() {
            write!(f, "Level {}:", level)?;
            for key in self.level_keys(level) {
                write!(f, " {}", key)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<K, R> fmt::Debug for SkipList<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("len", &self.len)
            .field("level", &self.level)
            .field("max_level", &self.max_level)
            .field("promotion_probability", &self.promotion_probability)
            .finish()
    }
}

#[cfg(test)]
impl<K: Ord + fmt::Debug, R> SkipList<K, R> {
    fn check_invariants(&self) {
        // Every chain is strictly increasing and only holds nodes tall enough for it
        for level in 0..=self.max_level {
            let keys = self.level_keys(level);
            for pair in keys.windows(2) {
                assert!(pair[0] < pair[1], "level {} out of order: {:?}", level, pair);
            }
            if level > self.level {
                assert_eq!(self.forward(HEAD, level), NIL, "level {} above top is linked", level);
            }
        }

        // Each level is a subsequence of the one below
        for level in 1..=self.level {
            let below = self.level_keys(level - 1);
            let mut it = below.iter();
            for key in self.level_keys(level) {
                assert!(it.any(|k| *k == key), "{:?} at level {} missing below", key, level);
            }
        }

        assert_eq!(self.iter().count(), self.len);
        if self.len > 0 {
            assert_ne!(self.forward(HEAD, self.level), NIL);
        } else {
            assert_eq!(self.level, 0);
        }
    }
}
