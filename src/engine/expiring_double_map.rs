//! LAPSE - Expiring Double Map
//! Two-key table, e.g. a NAT table where the internal and the external
//! endpoint both lead to the same translation.

use std::hash::Hash;

use crate::config::Config;
use crate::error::{LapseError, Result};
use crate::types::{EitherKey, Index, Row, Timestamp};

use super::directory::IndexDirectory;
use super::double_map::TwoLevelKeyIndexMap;
use super::expirator::expire_double_map_with;
use super::metrics::TableMetrics;

/// Bounded two-key table with O(k) bulk expiration.
pub struct ExpiringDoubleMap<K1, K2, V> {
    directory: IndexDirectory,
    rows: TwoLevelKeyIndexMap<K1, K2, V>,
    config: Config,
    metrics: TableMetrics,
}

impl<K1, K2, V> ExpiringDoubleMap<K1, K2, V>
where
    K1: Hash + Eq + Clone,
    K2: Hash + Eq + Clone,
{
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Expiring double map opened (capacity {}, expiration time {})",
            config.capacity,
            config.expiration_time
        );

        Ok(Self {
            directory: IndexDirectory::new(config.capacity),
            rows: TwoLevelKeyIndexMap::new(config.capacity),
            config,
            metrics: TableMetrics::new(),
        })
    }

    /// Insert a row reachable from both keys, stamped with `now`.
    pub fn insert(&mut self, first: K1, second: K2, value: V, now: Timestamp) -> Result<Index> {
        if self.rows.lookup_first(&first).is_some() || self.rows.lookup_second(&second).is_some() {
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

        if let Err(err) = self.rows.insert(first, second, value, index) {
            // Keys were checked above; a slot clash means the row store
            // drifted from the directory. Hand the index back.
            self.directory.free(index)?;
            return Err(err);
        }
        self.metrics.record_insert();
        Ok(index)
    }

    pub fn lookup(&self, key: EitherKey<'_, K1, K2>) -> Option<Index> {
        self.rows.lookup(key)
    }

    pub fn get(&self, key: EitherKey<'_, K1, K2>) -> Option<&V> {
        self.rows.get(self.rows.lookup(key)?).map(|row| &row.value)
    }

    pub fn get_mut(&mut self, key: EitherKey<'_, K1, K2>) -> Option<&mut V> {
        let index = self.rows.lookup(key)?;
        self.rows.value_mut(index)
    }

    /// The full row, both keys included.
    pub fn row(&self, key: EitherKey<'_, K1, K2>) -> Option<&Row<K1, K2, V>> {
        self.rows.get(self.rows.lookup(key)?)
    }

    /// Restamp the row reached through `key` with `now`.
    pub fn refresh(&mut self, key: EitherKey<'_, K1, K2>, now: Timestamp) -> Result<()> {
        let index = self.rows.lookup(key).ok_or(LapseError::KeyNotFound)?;
        self.directory.refresh(index, now)?;
        self.metrics.record_refresh();
        Ok(())
    }

    /// Remove the row reached through `key` from both sub-maps and the directory.
    pub fn remove(&mut self, key: EitherKey<'_, K1, K2>) -> Result<Row<K1, K2, V>> {
        let index = self.rows.lookup(key).ok_or(LapseError::KeyNotFound)?;
        self.directory.free(index)?;
        let row = self.rows.erase(index).ok_or(LapseError::SlotEmpty(index))?;
        self.metrics.record_removal();
        Ok(row)
    }

    /// Drop every row idle for longer than the configured expiration time.
    pub fn expire(&mut self, now: Timestamp) -> usize {
        self.expire_bounded(now, usize::MAX)
    }

    /// Like [`expire`](Self::expire), but removes at most `max` rows.
    pub fn expire_bounded(&mut self, now: Timestamp, max: usize) -> usize {
        let cutoff = self.config.cutoff(now);
        let count = expire_double_map_with(&mut self.directory, &mut self.rows, cutoff, max, |_, _| {});
        self.metrics.record_expiration(count);
        count
    }

    pub fn timestamp(&self, key: EitherKey<'_, K1, K2>) -> Option<Timestamp> {
        self.directory.timestamp(self.rows.lookup(key)?)
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

    /// Panics unless the directory and the row map agree on live indices.
    pub fn debug_validate_invariants(&self) {
        self.directory.debug_validate_invariants();
        self.rows.debug_validate_invariants();

        let mut live: Vec<Index> = self.directory.iter().map(|(index, _)| index).collect();
        live.sort_unstable();
        assert_eq!(self.rows.indices().collect::<Vec<_>>(), live, "rows != directory");
    }
}
