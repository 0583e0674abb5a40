use serde::Serialize;

use super::config::CatalogConfig;
use crate::data::{DataType, Value};
use crate::index::{BloomFilter, BloomParams, IndexError, SegmentTree, SkipList};

/// The indexes kept for one column.
///
/// - `values`: ordered set of the distinct non-null values (exact lookups)
/// - `membership`: Bloom filter over the non-null values (fast negative lookups)
/// - `sums`: segment tree over the numeric projection, one leaf per row;
///   null, NaN and non-numeric cells contribute 0
#[derive(Debug)]
pub struct ColumnIndex {
    name: String,
    data_type: DataType,
    rows: usize,
    values: SkipList<Value>,
    membership: BloomFilter,
    sums: SegmentTree<f64>,
}

impl ColumnIndex {
    pub fn build(name: &str, values: &[Value], config: &CatalogConfig) -> Result<Self, IndexError> {
        let mut skip_list = SkipList::with_config(config.skip_list_for(name))?;
        let params = BloomParams::optimal(values.len().max(1), config.false_positive_rate)?;
        let mut membership = BloomFilter::seeded(params, config.hash_seed())?;

        let mut data_type = DataType::Null;
        let mut numeric = Vec::with_capacity(values.len());
        for value in values {
            data_type = data_type.merge(&DataType::from_value(value));
            numeric.push(value.as_f64().unwrap_or(0.0));
            if value.is_null() {
                continue;
            }
            membership.add(value);
            skip_list.insert(value.clone());
        }

        tracing::debug!(
            column = name,
            rows = values.len(),
            distinct = skip_list.len(),
            data_type = %data_type,
            "indexed column"
        );

        Ok(Self {
            name: name.to_string(),
            data_type,
            rows: values.len(),
            values: skip_list,
            membership,
            sums: SegmentTree::build(&numeric),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of rows (segment tree leaves)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Exact membership via the skip list
    pub fn contains(&self, value: &Value) -> bool {
        self.values.search(value)
    }

    /// Probabilistic membership via the Bloom filter; `false` is certain
    pub fn might_contain(&self, value: &Value) -> bool {
        self.membership.check(value)
    }

    /// Sum of the numeric projection over rows `[left, right)`
    pub fn range_sum(&self, left: usize, right: usize) -> Result<f64, IndexError> {
        self.sums.query(left, right)
    }

    /// Overwrite the numeric projection of one row
    pub fn set_numeric(&mut self, row: usize, value: f64) -> Result<(), IndexError> {
        self.sums.update(row, value)
    }

    /// Zero the numeric projection of one row
    pub fn clear_numeric(&mut self, row: usize) -> Result<(), IndexError> {
        self.sums.remove(row)
    }

    /// Add a value to the value set. Nulls are not indexed.
    pub fn insert_value(&mut self, value: Value) -> bool {
        if value.is_null() {
            return false;
        }
        self.data_type = self.data_type.merge(&DataType::from_value(&value));
        self.membership.add(&value);
        self.values.insert(value)
    }

    /// Remove a value from the value set. The Bloom filter keeps its bits, so
    /// `might_contain` may still report it.
    pub fn delete_value(&mut self, value: &Value) -> bool {
        self.values.delete(value)
    }

    /// Replace `old` with `new` in the value set; false if `old` is absent
    pub fn update_value(&mut self, old: &Value, new: Value) -> bool {
        if new.is_null() || !self.values.search(old) {
            return false;
        }
        self.data_type = self.data_type.merge(&DataType::from_value(&new));
        self.membership.add(&new);
        self.values.update(old, new)
    }

    pub fn values(&self) -> &SkipList<Value> {
        &self.values
    }

    pub fn membership(&self) -> &BloomFilter {
        &self.membership
    }

    pub fn sums(&self) -> &SegmentTree<f64> {
        &self.sums
    }

    pub fn memory_bytes(&self) -> usize {
        self.values.memory_bytes() + self.membership.memory_bytes() + self.sums.memory_bytes()
    }

    pub fn stats(&self) -> ColumnStats {
        ColumnStats {
            name: self.name.clone(),
            data_type: self.data_type,
            rows: self.rows,
            distinct_values: self.values.len(),
            skip_list_level: self.values.current_level(),
            bloom_bits: self.membership.num_bits(),
            bloom_hashes: self.membership.num_hashes(),
            bloom_estimated_fpr: self.membership.estimated_false_positive_rate(),
            sum: self.sums.total(),
            min: self.values.first().cloned(),
            max: self.values.last().cloned(),
            memory_bytes: self.memory_bytes(),
        }
    }
}

/// Per-column statistics
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStats {
    pub name: String,
    pub data_type: DataType,
    pub rows: usize,
    pub distinct_values: usize,
    pub skip_list_level: usize,
    pub bloom_bits: usize,
    pub bloom_hashes: u32,
    pub bloom_estimated_fpr: f64,
    pub sum: f64,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub memory_bytes: usize,
}
