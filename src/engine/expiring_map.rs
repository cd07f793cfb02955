//! LAPSE - Expiring Map
//! Single-key table: a flow table whose entries age out when they have not
//! been refreshed for `expiration_time`.
//!
//! ## Layout
//! ```text
//! IndexDirectory      oldest ──► ... ──► newest   (index, timestamp)
//! DenseStore<K>       keys[index]
//! DenseStore<V>       values[index]
//! KeyIndexMap<K>      key ──► index
//! ```
//! Every mutator keeps the four structures in lockstep: an index is
//! allocated iff both slots are occupied iff exactly one key maps to it.

use std::borrow::Borrow;
use std::hash::Hash;

use crate::config::Config;
use crate::error::{LapseError, Result};
use crate::types::{Index, Timestamp};

use super::directory::IndexDirectory;
use super::expirator::expire_single_map_with;
use super::key_map::KeyIndexMap;
use super::metrics::TableMetrics;
use super::store::DenseStore;

/// Bounded key/value table with O(k) bulk expiration.
pub struct ExpiringMap<K, V> {
    directory: IndexDirectory,
    keys: DenseStore<K>,
    values: DenseStore<V>,
    map: KeyIndexMap<K>,
    config: Config,
    metrics: TableMetrics,
}

impl<K, V> ExpiringMap<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Build an empty table sized by `config.capacity`.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Expiring map opened (capacity {}, expiration time {})",
            config.capacity,
            config.expiration_time
        );

        Ok(Self {
            directory: IndexDirectory::new(config.capacity),
            keys: DenseStore::new(config.capacity),
            values: DenseStore::new(config.capacity),
            map: KeyIndexMap::with_capacity(config.capacity),
            config,
            metrics: TableMetrics::new(),
        })
    }

    /// Insert a new entry stamped with `now`.
    pub fn insert(&mut self, key: K, value: V, now: Timestamp) -> Result<Index> {
        if self.map.contains_key(&key) {
            return Err(LapseError::DuplicateKey);
        }
        let index = match self.directory.allocate(now) {
            Ok(index) => index,
            Err(err @ LapseError::CapacityExhausted { .. }) => {
                self.metrics.record_rejected_insert();
                log::warn!("Insert rejected: {err}");
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        self.map.insert(key.clone(), index)?;
        self.keys.place(index, key)?;
        self.values.place(index, value)?;
        self.metrics.record_insert();
        Ok(index)
    }

    pub fn lookup<Q>(&self, key: &Q) -> Option<Index>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.lookup(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.values.get(self.map.lookup(key)?)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.map.lookup(key)?;
        self.values.get_mut(index)
    }

    /// Restamp an entry with `now`, moving it to the newest end.
    pub fn refresh<Q>(&mut self, key: &Q, now: Timestamp) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.map.lookup(key).ok_or(LapseError::KeyNotFound)?;
        self.directory.refresh(index, now)?;
        self.metrics.record_refresh();
        Ok(())
    }

    /// Remove an entry before it expires, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.map.erase(key).ok_or(LapseError::KeyNotFound)?;
        self.directory.free(index)?;
        self.keys.erase(index)?;
        let value = self.values.erase(index)?;
        self.metrics.record_removal();
        Ok(value)
    }

    /// Drop every entry idle for longer than the configured expiration time
    /// as of `now`. Returns the number of entries removed.
    pub fn expire(&mut self, now: Timestamp) -> usize {
        self.expire_bounded(now, usize::MAX)
    }

    /// Like [`expire`](Self::expire), but removes at most `max` entries.
    pub fn expire_bounded(&mut self, now: Timestamp, max: usize) -> usize {
        let cutoff = self.config.cutoff(now);
        let values = &mut self.values;
        let count = expire_single_map_with(
            &mut self.directory,
            &mut self.keys,
            &mut self.map,
            cutoff,
            max,
            |index, _key| {
                let erased = values.erase(index);
                debug_assert!(erased.is_ok(), "value slot {index} out of sync");
            },
        );
        self.metrics.record_expiration(count);
        count
    }

    /// Timestamp of the least recently refreshed entry.
    pub fn oldest_timestamp(&self) -> Option<Timestamp> {
        self.directory.oldest().map(|(_, time)| time)
    }

    /// Last-refresh time of the entry under `key`.
    pub fn timestamp<Q>(&self, key: &Q) -> Option<Timestamp>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.directory.timestamp(self.map.lookup(key)?)
    }

    /// Iterate `(key, value)` pairs from least to most recently refreshed.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.directory
            .iter()
            .filter_map(|(index, _)| Some((self.keys.get(index)?, self.values.get(index)?)))
    }

    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.directory.capacity()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &TableMetrics {
        &self.metrics
    }

    /// Panics unless directory, key store, value store and key map agree on
    /// the set of live indices and every stored key maps to its own index.
    pub fn debug_validate_invariants(&self) {
        self.directory.debug_validate_invariants();

        let mut live: Vec<Index> = self.directory.iter().map(|(index, _)| index).collect();
        live.sort_unstable();
        assert_eq!(self.keys.indices().collect::<Vec<_>>(), live, "key slots != directory");
        assert_eq!(self.values.indices().collect::<Vec<_>>(), live, "value slots != directory");
        assert_eq!(self.map.len(), live.len(), "map size != directory");

        for (key, index) in self.map.iter() {
            assert!(self.keys.get(index) == Some(key), "key at slot {index} differs from map");
        }
    }
}
