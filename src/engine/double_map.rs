//! LAPSE - Two-Level Key Index Map
//! A row reachable through two different keys, e.g. both directions of a
//! NAT translation.
//!
//! ## Layout
//! - `rows`: one `Row { first, second, value }` per index, owned once
//! - `by_first` / `by_second`: `KeyIndexMap`s pointing at the row's index
//!
//! Inserts validate everything before touching any structure, and erasure
//! always removes the row and both key entries together, so the two
//! sub-maps can never disagree about which rows exist.

use std::hash::Hash;

use crate::error::{LapseError, Result};
use crate::types::{EitherKey, Index, Row};

use super::key_map::KeyIndexMap;
use super::store::DenseStore;

/// Rows indexed by directory index and addressable by either key.
#[derive(Debug, Clone)]
pub struct TwoLevelKeyIndexMap<K1, K2, V> {
    rows: DenseStore<Row<K1, K2, V>>,
    by_first: KeyIndexMap<K1>,
    by_second: KeyIndexMap<K2>,
}

impl<K1, K2, V> TwoLevelKeyIndexMap<K1, K2, V>
where
    K1: Hash + Eq + Clone,
    K2: Hash + Eq + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: DenseStore::new(capacity),
            by_first: KeyIndexMap::with_capacity(capacity),
            by_second: KeyIndexMap::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows.capacity()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Store a row at `index`, reachable from both `first` and `second`.
    pub fn insert(&mut self, first: K1, second: K2, value: V, index: Index) -> Result<()> {
        if index >= self.capacity() {
            return Err(LapseError::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            });
        }
        if self.rows.is_occupied(index) {
            return Err(LapseError::SlotOccupied(index));
        }
        if self.by_first.contains_key(&first) || self.by_second.contains_key(&second) {
            return Err(LapseError::DuplicateKey);
        }

        self.by_first.insert(first.clone(), index)?;
        self.by_second.insert(second.clone(), index)?;
        self.rows.place(index, Row::new(first, second, value))
    }

    pub fn lookup_first(&self, key: &K1) -> Option<Index> {
        self.by_first.lookup(key)
    }

    pub fn lookup_second(&self, key: &K2) -> Option<Index> {
        self.by_second.lookup(key)
    }

    pub fn lookup(&self, key: EitherKey<'_, K1, K2>) -> Option<Index> {
        match key {
            EitherKey::First(key) => self.lookup_first(key),
            EitherKey::Second(key) => self.lookup_second(key),
        }
    }

    pub fn get(&self, index: Index) -> Option<&Row<K1, K2, V>> {
        self.rows.get(index)
    }

    /// Mutable access to a row's value. Keys stay fixed for the row's life.
    pub fn value_mut(&mut self, index: Index) -> Option<&mut V> {
        self.rows.get_mut(index).map(|row| &mut row.value)
    }

    /// Remove the row at `index` from the row store and both sub-maps.
    pub fn erase(&mut self, index: Index) -> Option<Row<K1, K2, V>> {
        let row = self.rows.erase(index).ok()?;
        let first = self.by_first.erase(&row.first);
        let second = self.by_second.erase(&row.second);
        debug_assert_eq!(first, Some(index), "first key of row {index} not mapped to it");
        debug_assert_eq!(second, Some(index), "second key of row {index} not mapped to it");
        Some(row)
    }

    /// Remove the row reachable through either key.
    pub fn erase_by_either(&mut self, key: EitherKey<'_, K1, K2>) -> Option<Row<K1, K2, V>> {
        let index = self.lookup(key)?;
        self.erase(index)
    }

    /// Indices of all stored rows, ascending.
    pub fn indices(&self) -> impl Iterator<Item = Index> + '_ {
        self.rows.indices()
    }

    /// Panics unless every row is reachable from both of its keys and
    /// neither sub-map holds an entry without a row.
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.by_first.len(), self.rows.len(), "first map size != rows");
        assert_eq!(self.by_second.len(), self.rows.len(), "second map size != rows");
        for index in self.rows.indices() {
            let row = self
                .rows
                .get(index)
                .unwrap_or_else(|| panic!("row {index} is checked out"));
            assert_eq!(self.by_first.lookup(&row.first), Some(index));
            assert_eq!(self.by_second.lookup(&row.second), Some(index));
        }
    }
}
