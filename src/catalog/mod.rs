//! Per-column index registry.
//!
//! The catalog takes columns that a caller has already loaded and builds one
//! [`ColumnIndex`] for each, plus an optional row table that maps a row's
//! rendered contents to its row number. It is single-owner: mutation goes
//! through `&mut self` and nothing inside is locked.

pub mod column;
pub mod config;

pub use column::{ColumnIndex, ColumnStats};
pub use config::CatalogConfig;

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::data::Value;
use crate::index::{CuckooHashTable, IndexError, IndexKey};

/// Registry of column indexes and the row table
#[derive(Debug)]
pub struct IndexCatalog {
    config: CatalogConfig,
    columns: HashMap<String, ColumnIndex>,
    rows: Option<RowTable>,
}

#[derive(Debug)]
struct RowTable {
    table: CuckooHashTable<Vec<u8>, usize>,
    rows: usize,
    rebuilds: usize,
}

impl IndexCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        config.validate()?;
        Ok(Self {
            config,
            columns: HashMap::new(),
            rows: None,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Build the indexes for one column
    pub fn index_column(
        &mut self,
        name: impl Into<String>,
        values: &[Value],
    ) -> Result<(), CatalogError> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(CatalogError::ColumnExists(name));
        }

        let index = ColumnIndex::build(&name, values, &self.config)?;
        self.columns.insert(name, index);
        Ok(())
    }

    /// Build the indexes for several columns in parallel. Either every column
    /// is added or none is.
    pub fn index_columns(&mut self, columns: Vec<(String, Vec<Value>)>) -> Result<usize, CatalogError> {
        {
            let mut names = HashSet::new();
            for (name, _) in &columns {
                if self.columns.contains_key(name) || !names.insert(name.as_str()) {
                    return Err(CatalogError::ColumnExists(name.clone()));
                }
            }
        }

        let config = &self.config;
        let built = columns
            .into_par_iter()
            .map(|(name, values)| {
                ColumnIndex::build(&name, &values, config).map(|index| (name, index))
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        let count = built.len();
        self.columns.extend(built);
        Ok(count)
    }

    /// Build the row table: each row's encoded contents map to its row number.
    ///
    /// Each table starts at twice the row count. If an insert hits the
    /// displacement limit the table is rebuilt at double the size, up to
    /// `max_rebuilds` times. Identical rows share a key; the last one wins.
    pub fn index_rows(&mut self, rows: &[Vec<Value>]) -> Result<(), CatalogError> {
        let keys: Vec<Vec<u8>> = rows.iter().map(Vec::as_slice).map(row_key).collect();
        let mut table_size = (2 * keys.len()).max(1);

        for rebuilds in 0..=self.config.max_rebuilds {
            match self.fill_row_table(&keys, table_size)? {
                Some(table) => {
                    tracing::debug!(
                        rows = keys.len(),
                        table_size,
                        rebuilds,
                        "indexed rows"
                    );
                    self.rows = Some(RowTable {
                        table,
                        rows: keys.len(),
                        rebuilds,
                    });
                    return Ok(());
                }
                None => {
                    tracing::warn!(
                        table_size,
                        attempt = rebuilds + 1,
                        "row table overflowed, rebuilding at double size"
                    );
                    table_size *= 2;
                }
            }
        }

        Err(CatalogError::RowTableExhausted {
            rows: keys.len(),
            attempts: self.config.max_rebuilds + 1,
        })
    }

    fn fill_row_table(
        &self,
        keys: &[Vec<u8>],
        table_size: usize,
    ) -> Result<Option<CuckooHashTable<Vec<u8>, usize>>, IndexError> {
        let mut table = CuckooHashTable::with_config(self.config.row_table(table_size))?;
        for (row, key) in keys.iter().enumerate() {
            if table.insert(key.clone(), row).is_err() {
                return Ok(None);
            }
        }
        Ok(Some(table))
    }

    /// Row number of a row with exactly these contents
    pub fn lookup_row(&self, row: &[Value]) -> Option<usize> {
        let rows = self.rows.as_ref()?;
        rows.table.search(row_key(row).as_slice()).copied()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnIndex> {
        self.columns.get(name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnIndex> {
        self.columns.get_mut(name)
    }

    /// Column names in sorted order
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.columns.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn drop_column(&mut self, name: &str) -> Result<(), CatalogError> {
        if self.columns.remove(name).is_none() {
            return Err(CatalogError::ColumnNotFound(name.to_string()));
        }
        Ok(())
    }

    /// Exact membership test on a column
    pub fn contains(&self, column: &str, value: &Value) -> Result<bool, CatalogError> {
        Ok(self.get(column)?.contains(value))
    }

    /// Bloom filter membership test on a column
    pub fn might_contain(&self, column: &str, value: &Value) -> Result<bool, CatalogError> {
        Ok(self.get(column)?.might_contain(value))
    }

    /// Sum of a column's numeric projection over rows `[left, right)`
    pub fn range_sum(&self, column: &str, left: usize, right: usize) -> Result<f64, CatalogError> {
        Ok(self.get(column)?.range_sum(left, right)?)
    }

    pub fn set_numeric(&mut self, column: &str, row: usize, value: f64) -> Result<(), CatalogError> {
        Ok(self.get_mut(column)?.set_numeric(row, value)?)
    }

    pub fn clear_numeric(&mut self, column: &str, row: usize) -> Result<(), CatalogError> {
        Ok(self.get_mut(column)?.clear_numeric(row)?)
    }

    pub fn insert_value(&mut self, column: &str, value: Value) -> Result<bool, CatalogError> {
        Ok(self.get_mut(column)?.insert_value(value))
    }

    pub fn delete_value(&mut self, column: &str, value: &Value) -> Result<bool, CatalogError> {
        Ok(self.get_mut(column)?.delete_value(value))
    }

    pub fn update_value(
        &mut self,
        column: &str,
        old: &Value,
        new: Value,
    ) -> Result<bool, CatalogError> {
        Ok(self.get_mut(column)?.update_value(old, new))
    }

    pub fn stats(&self) -> CatalogStats {
        let mut columns: Vec<ColumnStats> = self.columns.values().map(|c| c.stats()).collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));

        CatalogStats {
            columns,
            rows: self.rows.as_ref().map(|r| RowTableStats {
                rows: r.rows,
                distinct_rows: r.table.len(),
                table_size: r.table.table_size(),
                load_factor: r.table.load_factor(),
                rebuilds: r.rebuilds,
                memory_bytes: r.table.memory_bytes(),
            }),
        }
    }

    fn get(&self, column: &str) -> Result<&ColumnIndex, CatalogError> {
        self.columns
            .get(column)
            .ok_or_else(|| CatalogError::ColumnNotFound(column.to_string()))
    }

    fn get_mut(&mut self, column: &str) -> Result<&mut ColumnIndex, CatalogError> {
        self.columns
            .get_mut(column)
            .ok_or_else(|| CatalogError::ColumnNotFound(column.to_string()))
    }
}

/// Row table key: each cell's canonical bytes behind a `u32` length prefix.
///
/// Cells carry their type tag, so `Int64(1)` and `Float64(1.0)` differ, and
/// the prefix keeps cell boundaries apart (`["a,b"]` is not `["a", "b"]`).
pub fn row_key(row: &[Value]) -> Vec<u8> {
    let mut key = Vec::new();
    let mut cell = Vec::new();
    for value in row {
        cell.clear();
        value.write_canonical(&mut cell);
        key.extend_from_slice(&(cell.len() as u32).to_le_bytes());
        key.extend_from_slice(&cell);
    }
    key
}

/// Catalog statistics
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub columns: Vec<ColumnStats>,
    pub rows: Option<RowTableStats>,
}

/// Row table statistics
#[derive(Debug, Clone, Serialize)]
pub struct RowTableStats {
    pub rows: usize,
    pub distinct_rows: usize,
    pub table_size: usize,
    pub load_factor: f64,
    pub rebuilds: usize,
    pub memory_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Column '{0}' already exists")]
    ColumnExists(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Row table could not hold {rows} rows after {attempts} attempts")]
    RowTableExhausted { rows: usize, attempts: usize },

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}
