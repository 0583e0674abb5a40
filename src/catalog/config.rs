//! Catalog configuration

use serde::{Deserialize, Serialize};

use crate::index::{CuckooConfig, IndexError, SkipListConfig};

/// Parameters shared by every index the catalog builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Skip list shape for every column
    pub skip_list: SkipListConfig,
    /// Target false positive rate of each column's Bloom filter
    pub false_positive_rate: f64,
    /// Displacement limit of the row table
    pub max_kicks: usize,
    /// How many times the row table may be rebuilt at double size
    pub max_rebuilds: usize,
    /// Seed for hashing and level promotion (entropy for skip lists when absent)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            skip_list: SkipListConfig::default(),
            false_positive_rate: 0.01, // 1%
            max_kicks: 20,
            max_rebuilds: 4,
            seed: None,
        }
    }
}

impl CatalogConfig {
    /// Read overrides from the environment, falling back to defaults:
    /// - COLINDEX_SEED: seed for hashing and level promotion
    /// - COLINDEX_FPR: Bloom filter false positive rate (default: 0.01)
    /// - COLINDEX_MAX_LEVEL: skip list max level (default: 4)
    /// - COLINDEX_MAX_KICKS: cuckoo displacement limit (default: 20)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.seed = std::env::var("COLINDEX_SEED")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(rate) = std::env::var("COLINDEX_FPR")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
        {
            config.false_positive_rate = rate;
        }
        if let Some(level) = std::env::var("COLINDEX_MAX_LEVEL")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            config.skip_list.max_level = level;
        }
        if let Some(kicks) = std::env::var("COLINDEX_MAX_KICKS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        {
            config.max_kicks = kicks;
        }

        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_false_positive_rate(mut self, rate: f64) -> Self {
        self.false_positive_rate = rate;
        self
    }

    pub fn with_skip_list(mut self, skip_list: SkipListConfig) -> Self {
        self.skip_list = skip_list;
        self
    }

    pub fn with_max_kicks(mut self, max_kicks: usize) -> Self {
        self.max_kicks = max_kicks;
        self
    }

    pub fn with_max_rebuilds(mut self, max_rebuilds: usize) -> Self {
        self.max_rebuilds = max_rebuilds;
        self
    }

    /// Reject parameters no index could be built with
    pub fn validate(&self) -> Result<(), IndexError> {
        self.skip_list.validate()?;
        let p = self.false_positive_rate;
        if !(p > 0.0 && p < 1.0) {
            return Err(IndexError::invalid(
                "false_positive_rate",
                format!("{} is not in the open interval (0, 1)", p),
            ));
        }
        CuckooConfig::new(1).with_max_kicks(self.max_kicks).validate()
    }

    /// Skip list config for one column. With a catalog seed, each column gets
    /// its own stream derived from the column name.
    pub(crate) fn skip_list_for(&self, column: &str) -> SkipListConfig {
        match self.seed.or(self.skip_list.seed) {
            Some(seed) => SkipListConfig {
                seed: Some(seed ^ fxhash::hash64(column.as_bytes())),
                ..self.skip_list.clone()
            },
            None => self.skip_list.clone(),
        }
    }

    pub(crate) fn hash_seed(&self) -> u64 {
        self.seed.unwrap_or(crate::index::hashing::DEFAULT_SEED)
    }

    pub(crate) fn row_table(&self, table_size: usize) -> CuckooConfig {
        CuckooConfig::new(table_size)
            .with_max_kicks(self.max_kicks)
            .with_seed(self.hash_seed())
    }
}
