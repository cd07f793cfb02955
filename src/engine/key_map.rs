//! LAPSE - Key Index Map
//! Hash map from an application key to the directory index holding it.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{LapseError, Result};
use crate::types::Index;

/// Bounded `key -> index` lookup table. Keys are unique; indices are
/// referenced, never owned.
#[derive(Debug, Clone)]
pub struct KeyIndexMap<K> {
    entries: HashMap<K, Index>,
    capacity: usize,
}

impl<K: Hash + Eq> KeyIndexMap<K> {
    /// Create a map holding at most `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map `key` to `index`. An existing key is never overwritten.
    pub fn insert(&mut self, key: K, index: Index) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(LapseError::DuplicateKey);
        }
        if self.entries.len() >= self.capacity {
            return Err(LapseError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        self.entries.insert(key, index);
        Ok(())
    }

    pub fn lookup<Q>(&self, key: &Q) -> Option<Index>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).copied()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Remove `key`, returning the index it pointed at.
    pub fn erase<Q>(&mut self, key: &Q) -> Option<Index>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key)
    }

    /// Iterate `(key, index)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, Index)> + '_ {
        self.entries.iter().map(|(key, &index)| (key, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut map = KeyIndexMap::with_capacity(4);
        map.insert("10.0.0.1:80".to_string(), 0).unwrap();
        map.insert("10.0.0.2:80".to_string(), 3).unwrap();
        assert_eq!(map.lookup("10.0.0.1:80"), Some(0));
        assert_eq!(map.lookup("10.0.0.2:80"), Some(3));
        assert_eq!(map.lookup("10.0.0.3:80"), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut map = KeyIndexMap::with_capacity(4);
        map.insert(7u32, 1).unwrap();
        assert_eq!(map.insert(7, 2), Err(LapseError::DuplicateKey));
        assert_eq!(map.lookup(&7), Some(1));
    }

    #[test]
    fn test_capacity_bound() {
        let mut map = KeyIndexMap::with_capacity(1);
        map.insert(1u8, 0).unwrap();
        assert_eq!(
            map.insert(2, 1),
            Err(LapseError::CapacityExhausted { capacity: 1 })
        );
    }

    #[test]
    fn test_erase() {
        let mut map = KeyIndexMap::with_capacity(2);
        map.insert(b"k".to_vec(), 1).unwrap();
        assert_eq!(map.erase(b"k".as_slice()), Some(1));
        assert_eq!(map.erase(b"k".as_slice()), None);
        assert!(map.is_empty());
        assert!(!map.contains_key(b"k".as_slice()));
    }
}
