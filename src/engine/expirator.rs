//! LAPSE - Expiration
//! Bulk removal of every entry whose last-refresh time is below a cutoff.
//!
//! Both entry points loop on `IndexDirectory::pop_oldest_if_expired` and,
//! for each released index, erase the matching key(s) and slot so that the
//! directory, the store and the map(s) stay coherent. The cost is O(k) for
//! k expired entries; the loop ends because every iteration shrinks the
//! allocated set.
//!
//! A directory/map disagreement found here is a caller bug: it trips a
//! `debug_assert!` in debug builds and is logged in release builds. The
//! index is released and counted either way, so expiration never fails.

use std::hash::Hash;

use crate::error::Result;
use crate::types::{Index, Row, Timestamp};

use super::directory::IndexDirectory;
use super::double_map::TwoLevelKeyIndexMap;
use super::key_map::KeyIndexMap;
use super::store::DenseStore;

/// Expire every index older than `now` from a directory, its key store and
/// its key map. Returns the number of entries removed.
pub fn expire_single_map<K>(
    directory: &mut IndexDirectory,
    keys: &mut DenseStore<K>,
    map: &mut KeyIndexMap<K>,
    now: Timestamp,
) -> usize
where
    K: Hash + Eq,
{
    expire_single_map_with(directory, keys, map, now, usize::MAX, |_, _| {})
}

/// Like [`expire_single_map`], but stops after `max` removals.
pub fn expire_single_map_bounded<K>(
    directory: &mut IndexDirectory,
    keys: &mut DenseStore<K>,
    map: &mut KeyIndexMap<K>,
    now: Timestamp,
    max: usize,
) -> usize
where
    K: Hash + Eq,
{
    expire_single_map_with(directory, keys, map, now, max, |_, _| {})
}

/// Expire at most `max` entries older than `now`, handing each removed
/// `(index, key)` to `on_expire` once all three structures have dropped it.
pub fn expire_single_map_with<K, F>(
    directory: &mut IndexDirectory,
    keys: &mut DenseStore<K>,
    map: &mut KeyIndexMap<K>,
    now: Timestamp,
    max: usize,
    mut on_expire: F,
) -> usize
where
    K: Hash + Eq,
    F: FnMut(Index, K),
{
    let mut count = 0;
    while count < max {
        let Some(index) = directory.pop_oldest_if_expired(now) else {
            break;
        };
        count += 1;

        match erase_keyed_slot(keys, map, index) {
            Ok(key) => {
                log::trace!("expired index {index}");
                on_expire(index, key);
            }
            Err(err) => {
                debug_assert!(false, "expired index {index} incoherent with key store: {err}");
                log::error!("expired index {index} incoherent with key store: {err}");
            }
        }
    }

    if count > 0 {
        log::debug!("expired {count} entries older than {now}");
    }
    count
}

/// Read the key at `index`, drop it from the map, then empty the slot.
fn erase_keyed_slot<K>(keys: &mut DenseStore<K>, map: &mut KeyIndexMap<K>, index: Index) -> Result<K>
where
    K: Hash + Eq,
{
    let key = keys.borrow(index)?;
    let mapped = map.erase(&key);
    keys.give_back(index, key)?;

    debug_assert_eq!(mapped, Some(index), "key at index {index} mapped elsewhere");
    if mapped != Some(index) {
        log::error!("key at index {index} was mapped to {mapped:?}");
    }
    keys.erase(index)
}

/// Expire every index older than `now` from a directory and its two-key
/// map. Returns the number of rows removed.
pub fn expire_double_map<K1, K2, V>(
    directory: &mut IndexDirectory,
    map: &mut TwoLevelKeyIndexMap<K1, K2, V>,
    now: Timestamp,
) -> usize
where
    K1: Hash + Eq + Clone,
    K2: Hash + Eq + Clone,
{
    expire_double_map_with(directory, map, now, usize::MAX, |_, _| {})
}

/// Like [`expire_double_map`], but stops after `max` removals.
pub fn expire_double_map_bounded<K1, K2, V>(
    directory: &mut IndexDirectory,
    map: &mut TwoLevelKeyIndexMap<K1, K2, V>,
    now: Timestamp,
    max: usize,
) -> usize
where
    K1: Hash + Eq + Clone,
    K2: Hash + Eq + Clone,
{
    expire_double_map_with(directory, map, now, max, |_, _| {})
}

/// Expire at most `max` rows older than `now`, handing each removed row to
/// `on_expire`.
pub fn expire_double_map_with<K1, K2, V, F>(
    directory: &mut IndexDirectory,
    map: &mut TwoLevelKeyIndexMap<K1, K2, V>,
    now: Timestamp,
    max: usize,
    mut on_expire: F,
) -> usize
where
    K1: Hash + Eq + Clone,
    K2: Hash + Eq + Clone,
    F: FnMut(Index, Row<K1, K2, V>),
{
    let mut count = 0;
    while count < max {
        let Some(index) = directory.pop_oldest_if_expired(now) else {
            break;
        };
        count += 1;

        match map.erase(index) {
            Some(row) => {
                log::trace!("expired row {index}");
                on_expire(index, row);
            }
            None => {
                debug_assert!(false, "expired index {index} has no row");
                log::error!("expired index {index} has no row");
            }
        }
    }

    if count > 0 {
        log::debug!("expired {count} rows older than {now}");
    }
    count
}
