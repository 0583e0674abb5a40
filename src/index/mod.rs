pub mod bloom;
pub mod cuckoo;
pub mod error;
pub mod hashing;
pub mod key;
pub mod segment_tree;
pub mod skiplist;

pub use bloom::{BloomFilter, BloomParams};
pub use cuckoo::{CuckooConfig, CuckooHashTable, CuckooInsertError};
pub use error::IndexError;
pub use key::{IndexKey, TotalF64};
pub use segment_tree::SegmentTree;
pub use skiplist::{SkipList, SkipListConfig};
