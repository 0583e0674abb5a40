//! colindex: In-Memory Columnar Index Structures
//!
//! Four independent index structures for tabular data, plus a catalog that
//! builds them per column.
//!
//! # Structures
//!
//! - **SkipList**: Ordered duplicate-free set with probabilistic balancing
//! - **SegmentTree**: Fixed-size array with point updates and range sums
//! - **BloomFilter**: Bit-array membership test with a tunable false positive rate
//! - **CuckooHashTable**: Two-table key/value store with bounded displacement
//! - **IndexCatalog**: One skip list, Bloom filter and segment tree per column,
//!   and a cuckoo table mapping row contents to row numbers
//!
//! # Example
//!
//! ```
//! use colindex::index::{BloomFilter, SegmentTree, SkipList};
//!
//! let mut list = SkipList::new(4, 0.5).unwrap();
//! for key in [5, 1, 9, 3] {
//!     list.insert(key);
//! }
//! assert!(list.search(&9));
//! list.delete(&1);
//! assert!(!list.search(&1));
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![3, 5, 9]);
//!
//! let sums = SegmentTree::build(&[1, 2, 3, 4]);
//! assert_eq!(sums.query(0, 4).unwrap(), 10);
//!
//! let mut bloom = BloomFilter::new(1000, 0.01).unwrap();
//! bloom.add("kitchen");
//! assert!(bloom.check("kitchen"));
//! ```

pub mod catalog;
pub mod data;
pub mod index;

// Re-export commonly used types
pub use catalog::{CatalogConfig, CatalogError, IndexCatalog};
pub use data::{DataType, Value};
pub use index::{BloomFilter, CuckooHashTable, IndexError, SegmentTree, SkipList};
