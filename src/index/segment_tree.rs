//! Fixed-capacity range-sum index.
//!
//! Iterative (bottom-up) segment tree in a flat array of `2n` accumulators:
//! leaves at `[n, 2n)`, and `tree[i] = tree[2i] + tree[2i + 1]` for every
//! internal `i` in `[1, n)`. Capacity is fixed at build time; removing a value
//! zeroes its leaf rather than shrinking the array.
//!
//! Indices outside the tree are rejected with [`IndexError`], never clamped.

use std::ops::Add;

use super::IndexError;

/// Segment tree answering half-open range sums. `T::default()` is the additive identity.
#[derive(Debug, Clone)]
pub struct SegmentTree<T = f64> {
    tree: Vec<T>,
    len: usize,
}

impl<T> SegmentTree<T>
where
    T: Copy + Default + Add<Output = T>,
{
    /// Build from the initial leaf values in O(n).
    pub fn build(values: &[T]) -> Self {
        let n = values.len();
        let mut tree = vec![T::default(); 2 * n];
        tree[n..].copy_from_slice(values);
        for i in (1..n).rev() {
            tree[i] = tree[2 * i] + tree[2 * i + 1];
        }

        tracing::debug!(len = n, "built segment tree");
        Self { tree, len: n }
    }

    /// Overwrite the value at `index` and recompute its ancestors.
    pub fn update(&mut self, index: usize, value: T) -> Result<(), IndexError> {
        self.check_index(index)?;

        let mut pos = index + self.len;
        self.tree[pos] = value;
        while pos > 1 {
            pos /= 2;
            self.tree[pos] = self.tree[2 * pos] + self.tree[2 * pos + 1];
        }
        Ok(())
    }

    /// Zero the value at `index`. The slot stays in the tree.
    pub fn remove(&mut self, index: usize) -> Result<(), IndexError> {
        self.update(index, T::default())
    }

    /// Sum of the values in `[left, right)`. An empty range sums to the identity.
    pub fn query(&self, left: usize, right: usize) -> Result<T, IndexError> {
        if left > right || right > self.len {
            return Err(IndexError::InvalidRange {
                left,
                right,
                len: self.len,
            });
        }

        let mut result = T::default();
        let mut l = left + self.len;
        let mut r = right + self.len;
        while l < r {
            if l % 2 == 1 {
                result = result + self.tree[l];
                l += 1;
            }
            if r % 2 == 1 {
                r -= 1;
                result = result + self.tree[r];
            }
            l /= 2;
            r /= 2;
        }
        Ok(result)
    }

    /// Current value at `index`.
    pub fn get(&self, index: usize) -> Result<T, IndexError> {
        self.check_index(index)?;
        Ok(self.tree[index + self.len])
    }

    /// Sum of every value.
    pub fn total(&self) -> T {
        match self.len {
            0 => T::default(),
            // With a single leaf, slot 1 is the leaf itself
            _ => self.tree[1],
        }
    }
}

impl<T> SegmentTree<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current leaf values in index order.
    pub fn leaves(&self) -> &[T] {
        &self.tree[self.len..]
    }

    pub fn memory_bytes(&self) -> usize {
        self.tree.capacity() * std::mem::size_of::<T>()
    }

    fn check_index(&self, index: usize) -> Result<(), IndexError> {
        if index >= self.len {
            return Err(IndexError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}
