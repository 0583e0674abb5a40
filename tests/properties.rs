//! Property-based tests for the index structures.

use std::collections::{BTreeSet, HashMap};

use colindex::data::Value;
use colindex::index::{BloomFilter, CuckooConfig, CuckooHashTable, SegmentTree, SkipList};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// =============================================================================
// Test helpers
// =============================================================================

#[derive(Clone, Debug)]
enum SetOp {
    Insert(i32),
    Delete(i32),
}

fn arbitrary_set_op() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        3 => (-50..50i32).prop_map(SetOp::Insert),
        1 => (-50..50i32).prop_map(SetOp::Delete),
    ]
}

fn seeded_list(seed: u64) -> SkipList<i32> {
    SkipList::with_rng(4, 0.5, StdRng::seed_from_u64(seed)).unwrap()
}

/// Every level is strictly increasing and a subsequence of the level below.
fn assert_levels_nested(list: &SkipList<i32>) -> Result<(), TestCaseError> {
    let mut below: Vec<i32> = list.iter().copied().collect();
    for level in 1..=list.current_level() {
        let keys: Vec<i32> = list.level_keys(level).into_iter().copied().collect();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(keys.iter().all(|k| below.binary_search(k).is_ok()));
        below = keys;
    }
    prop_assert!(list.level_keys(list.current_level() + 1).is_empty());
    Ok(())
}

// =============================================================================
// SkipList properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Distinct keys inserted in any order traverse in strictly increasing order
    #[test]
    fn skip_list_traversal_is_sorted(keys in prop::collection::vec(any::<i32>(), 0..200), seed in any::<u64>()) {
        let mut list = seeded_list(seed);
        for &key in &keys {
            list.insert(key);
        }

        let expected: Vec<i32> = keys.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let traversed: Vec<i32> = list.iter().copied().collect();
        prop_assert_eq!(traversed, expected.clone());
        prop_assert_eq!(list.len(), expected.len());
        assert_levels_nested(&list)?;
    }

    /// search is true exactly for keys inserted and not since deleted
    #[test]
    fn skip_list_matches_ordered_set(ops in prop::collection::vec(arbitrary_set_op(), 0..300), seed in any::<u64>()) {
        let mut list = seeded_list(seed);
        let mut model = BTreeSet::new();

        for op in &ops {
            match *op {
                SetOp::Insert(k) => prop_assert_eq!(list.insert(k), model.insert(k)),
                SetOp::Delete(k) => prop_assert_eq!(list.delete(&k), model.remove(&k)),
            }
        }

        for k in -50..50 {
            prop_assert_eq!(list.search(&k), model.contains(&k));
        }
        prop_assert_eq!(list.first(), model.iter().next());
        prop_assert_eq!(list.last(), model.iter().next_back());
        assert_levels_nested(&list)?;
    }

    /// Re-inserting a present key changes nothing
    #[test]
    fn skip_list_reinsert_is_noop(keys in prop::collection::vec(-100..100i32, 1..100), seed in any::<u64>()) {
        let mut list = seeded_list(seed);
        list.extend(keys.iter().copied());
        let before = list.to_string();
        let len = list.len();

        for &key in &keys {
            prop_assert!(!list.insert(key));
        }
        prop_assert_eq!(list.to_string(), before);
        prop_assert_eq!(list.len(), len);
    }

    /// Deleting every key leaves an empty list at level 0
    #[test]
    fn skip_list_delete_all_resets_level(keys in prop::collection::vec(any::<i32>(), 0..150), seed in any::<u64>()) {
        let mut list = seeded_list(seed);
        list.extend(keys.iter().copied());

        for key in &keys {
            list.delete(key);
        }
        prop_assert!(list.is_empty());
        prop_assert_eq!(list.current_level(), 0);
        prop_assert_eq!(list.iter().next(), None);
    }
}

// =============================================================================
// SegmentTree properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every range sum equals the directly computed sum of its leaves
    #[test]
    fn segment_tree_query_matches_naive_sum(
        values in prop::collection::vec(-1_000i64..1_000, 1..120),
        updates in prop::collection::vec((any::<prop::sample::Index>(), -1_000i64..1_000), 0..40),
        range in (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
    ) {
        let mut tree = SegmentTree::build(&values);
        let mut model = values.clone();

        for (index, value) in &updates {
            let i = index.index(model.len());
            tree.update(i, *value).unwrap();
            model[i] = *value;
            prop_assert_eq!(tree.query(i, i + 1).unwrap(), *value);
        }

        let a = range.0.index(model.len() + 1);
        let b = range.1.index(model.len() + 1);
        let (left, right) = (a.min(b), a.max(b));
        prop_assert_eq!(tree.query(left, right).unwrap(), model[left..right].iter().sum::<i64>());
        prop_assert_eq!(tree.total(), model.iter().sum::<i64>());
    }

    /// Removing a leaf zeroes it and nothing else
    #[test]
    fn segment_tree_remove_zeroes_leaf(
        values in prop::collection::vec(-1_000i64..1_000, 1..120),
        index in any::<prop::sample::Index>(),
    ) {
        let mut tree = SegmentTree::build(&values);
        let i = index.index(values.len());
        tree.remove(i).unwrap();

        prop_assert_eq!(tree.query(i, i + 1).unwrap(), 0);
        prop_assert_eq!(tree.len(), values.len());
        prop_assert_eq!(tree.total(), values.iter().sum::<i64>() - values[i]);
    }

    /// Out-of-range arguments are rejected and leave the tree intact
    #[test]
    fn segment_tree_rejects_out_of_range(values in prop::collection::vec(-1_000i64..1_000, 0..50), extra in 0usize..10) {
        let mut tree = SegmentTree::build(&values);
        let n = values.len();

        prop_assert!(tree.update(n + extra, 1).is_err());
        prop_assert!(tree.query(0, n + 1 + extra).is_err());
        prop_assert_eq!(tree.query(0, n).unwrap(), values.iter().sum::<i64>());
    }
}

// =============================================================================
// BloomFilter properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Added items always check true
    #[test]
    fn bloom_has_no_false_negatives(
        items in prop::collection::vec("[a-z0-9_]{0,12}", 1..300),
        rate in 0.001f64..0.5,
    ) {
        let mut bloom = BloomFilter::new(items.len(), rate).unwrap();
        for item in &items {
            bloom.add(item.as_str());
        }
        for item in &items {
            prop_assert!(bloom.check(item.as_str()));
        }
        prop_assert_eq!(bloom.count(), items.len());
    }

    /// Values that compare equal hit the same bits
    #[test]
    fn bloom_value_keys_are_canonical(ints in prop::collection::vec(any::<i64>(), 1..100)) {
        let mut bloom = BloomFilter::new(ints.len(), 0.01).unwrap();
        for &i in &ints {
            bloom.add(&Value::Int64(i));
        }
        for &i in &ints {
            prop_assert!(bloom.check(&Value::Int64(i)));
        }
    }
}

// =============================================================================
// CuckooHashTable properties
// =============================================================================

#[derive(Clone, Debug)]
enum MapOp {
    Insert(u16, u32),
    Remove(u16),
}

fn arbitrary_map_op() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        3 => (0..400u16, any::<u32>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        1 => (0..400u16).prop_map(MapOp::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The table agrees with a hash map, minus any entry a failed insert left homeless
    #[test]
    fn cuckoo_matches_hash_map(
        ops in prop::collection::vec(arbitrary_map_op(), 0..300),
        table_size in 1usize..600,
        seed in any::<u64>(),
    ) {
        let config = CuckooConfig::new(table_size).with_seed(seed);
        let mut table = CuckooHashTable::with_config(config).unwrap();
        let mut model = HashMap::new();

        for op in &ops {
            match *op {
                MapOp::Insert(k, v) => {
                    model.insert(k, v);
                    if let Err(err) = table.insert(k, v) {
                        let (homeless, _) = err.into_entry();
                        model.remove(&homeless);
                    }
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(table.remove(&k), model.remove(&k).is_some());
                }
            }
            prop_assert!(!table.has_collision());
        }

        prop_assert_eq!(table.len(), model.len());
        prop_assert_eq!(table.count_filled(), model.len());
        for k in 0..400u16 {
            prop_assert_eq!(table.search(&k), model.get(&k));
        }
    }

    /// Re-inserting stored keys overwrites in place: the last value wins and
    /// no displacement happens
    #[test]
    fn cuckoo_overwrite_never_displaces(keys in prop::collection::hash_set("[a-z]{1,10}", 0..200), seed in any::<u64>()) {
        let config = CuckooConfig::for_keys(keys.len()).with_seed(seed);
        let mut table = CuckooHashTable::with_config(config).unwrap();

        let mut stored = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            stored.push((key.clone(), i));
            if let Err(err) = table.insert(key.clone(), i) {
                let (homeless, _) = err.into_entry();
                stored.retain(|(k, _)| *k != homeless);
            }
        }

        let failures = table.insert_failures();
        for (key, i) in &stored {
            prop_assert!(table.insert(key.clone(), i + 1).is_ok());
        }

        prop_assert_eq!(table.insert_failures(), failures);
        prop_assert_eq!(table.len(), stored.len());
        for (key, i) in &stored {
            prop_assert_eq!(table.search(key.as_str()), Some(&(i + 1)));
        }
    }
}

// =============================================================================
// Cross-structure scenario
// =============================================================================

#[test]
fn test_lights_scenario() {
    let mut list = SkipList::new(4, 0.5).unwrap();
    for key in [5, 1, 9, 3] {
        list.insert(key);
    }

    assert!(list.search(&9));
    assert!(list.delete(&1));
    assert!(!list.search(&1));
    assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![3, 5, 9]);

    let tree = SegmentTree::build(&[1, 2, 3, 4]);
    assert_eq!(tree.query(0, 4).unwrap(), 10);
}
