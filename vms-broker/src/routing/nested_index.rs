/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Insert/remove helpers for keyed set indexes.
//!
//! All removals from the routing index go through here so that no key is ever
//! left bound to an empty collection.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

pub(crate) type SetIndex<K, V> = HashMap<K, HashSet<V>>;
pub(crate) type NestedSetIndex<K1, K2, V> = HashMap<K1, HashMap<K2, HashSet<V>>>;

/// Inserts `value` under `key`. Returns `true` if it was not already present.
pub(crate) fn insert<K, V>(index: &mut SetIndex<K, V>, key: K, value: V) -> bool
where
    K: Eq + Hash,
    V: Eq + Hash,
{
    index.entry(key).or_default().insert(value)
}

/// Inserts `value` under `outer`/`inner`. Returns `true` if it was not already present.
pub(crate) fn insert_nested<K1, K2, V>(
    index: &mut NestedSetIndex<K1, K2, V>,
    outer: K1,
    inner: K2,
    value: V,
) -> bool
where
    K1: Eq + Hash,
    K2: Eq + Hash,
    V: Eq + Hash,
{
    index
        .entry(outer)
        .or_default()
        .entry(inner)
        .or_default()
        .insert(value)
}

/// Removes `value` under `key`, dropping the key once its set is empty.
pub(crate) fn remove<K, V>(index: &mut SetIndex<K, V>, key: &K, value: &V) -> bool
where
    K: Eq + Hash,
    V: Eq + Hash,
{
    let Some(values) = index.get_mut(key) else {
        return false;
    };
    let removed = values.remove(value);
    if values.is_empty() {
        index.remove(key);
    }
    removed
}

/// Removes `value` under `outer`/`inner`, dropping inner and outer keys once empty.
pub(crate) fn remove_nested<K1, K2, V>(
    index: &mut NestedSetIndex<K1, K2, V>,
    outer: &K1,
    inner: &K2,
    value: &V,
) -> bool
where
    K1: Eq + Hash,
    K2: Eq + Hash,
    V: Eq + Hash,
{
    let Some(by_inner) = index.get_mut(outer) else {
        return false;
    };
    let removed = remove(by_inner, inner, value);
    if by_inner.is_empty() {
        index.remove(outer);
    }
    removed
}

/// Removes `value` from every set in the index. Returns `true` if any set held it.
pub(crate) fn remove_everywhere<K, V>(index: &mut SetIndex<K, V>, value: &V) -> bool
where
    K: Eq + Hash,
    V: Eq + Hash,
{
    let mut removed = false;
    index.retain(|_, values| {
        removed |= values.remove(value);
        !values.is_empty()
    });
    removed
}

/// Nested variant of [`remove_everywhere`].
pub(crate) fn remove_everywhere_nested<K1, K2, V>(
    index: &mut NestedSetIndex<K1, K2, V>,
    value: &V,
) -> bool
where
    K1: Eq + Hash,
    K2: Eq + Hash,
    V: Eq + Hash,
{
    let mut removed = false;
    index.retain(|_, by_inner| {
        removed |= remove_everywhere(by_inner, value);
        !by_inner.is_empty()
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_last_value_drops_key() {
        let mut index: SetIndex<u8, &str> = SetIndex::new();
        insert(&mut index, 1, "a");
        insert(&mut index, 1, "b");

        assert!(remove(&mut index, &1, &"a"));
        assert!(index.contains_key(&1));
        assert!(remove(&mut index, &1, &"b"));
        assert!(!index.contains_key(&1));
    }

    #[test]
    fn remove_missing_value_leaves_index_untouched() {
        let mut index: SetIndex<u8, &str> = SetIndex::new();
        insert(&mut index, 1, "a");

        assert!(!remove(&mut index, &1, &"z"));
        assert!(!remove(&mut index, &2, &"a"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_nested_drops_inner_then_outer() {
        let mut index: NestedSetIndex<u8, i32, &str> = NestedSetIndex::new();
        insert_nested(&mut index, 1, 10, "a");
        insert_nested(&mut index, 1, 11, "a");

        assert!(remove_nested(&mut index, &1, &10, &"a"));
        assert_eq!(index[&1].len(), 1);
        assert!(remove_nested(&mut index, &1, &11, &"a"));
        assert!(index.is_empty());
    }

    #[test]
    fn remove_everywhere_prunes_emptied_keys() {
        let mut index: NestedSetIndex<u8, i32, &str> = NestedSetIndex::new();
        insert_nested(&mut index, 1, 10, "a");
        insert_nested(&mut index, 1, 10, "b");
        insert_nested(&mut index, 2, 20, "a");

        assert!(remove_everywhere_nested(&mut index, &"a"));
        assert!(!index.contains_key(&2));
        assert_eq!(index[&1][&10].len(), 1);
        assert!(!remove_everywhere_nested(&mut index, &"a"));
    }
}
