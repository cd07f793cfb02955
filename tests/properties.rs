//! LAPSE - Property Tests
//! Random operation sequences checked against a plain `HashMap` model:
//! coherence, sortedness, expiration completeness/minimality, count
//! correctness and capacity conservation.

use std::collections::{BTreeSet, HashMap};

use lapse::config::Config;
use lapse::engine::{
    expire_single_map, DenseStore, ExpiringDoubleMap, IndexDirectory, KeyIndexMap,
};
use lapse::error::LapseError;
use lapse::types::{EitherKey, Index, Timestamp};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8),
    Refresh(u8),
    Remove(u8),
    Tick(u8),
    Expire(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..24).prop_map(Op::Insert),
        3 => (0u8..24).prop_map(Op::Refresh),
        1 => (0u8..24).prop_map(Op::Remove),
        3 => any::<u8>().prop_map(Op::Tick),
        2 => any::<u8>().prop_map(Op::Expire),
    ]
}

/// Directory + key store + key map driven alongside a `key -> time` model.
struct Harness {
    directory: IndexDirectory,
    keys: DenseStore<u8>,
    map: KeyIndexMap<u8>,
    model: HashMap<u8, Timestamp>,
    now: Timestamp,
}

impl Harness {
    fn new(capacity: usize) -> Self {
        Self {
            directory: IndexDirectory::new(capacity),
            keys: DenseStore::new(capacity),
            map: KeyIndexMap::with_capacity(capacity),
            model: HashMap::new(),
            now: 0,
        }
    }

    fn apply(&mut self, op: Op) -> Result<(), TestCaseError> {
        match op {
            Op::Insert(key) => {
                if self.map.contains_key(&key) {
                    return Ok(());
                }
                match self.directory.allocate(self.now) {
                    Ok(index) => {
                        self.keys.place(index, key).unwrap();
                        self.map.insert(key, index).unwrap();
                        self.model.insert(key, self.now);
                    }
                    Err(err) => {
                        prop_assert_eq!(
                            err,
                            LapseError::CapacityExhausted {
                                capacity: self.directory.capacity()
                            }
                        );
                        prop_assert_eq!(self.model.len(), self.directory.capacity());
                    }
                }
            }
            Op::Refresh(key) => match self.map.lookup(&key) {
                Some(index) => {
                    self.directory.refresh(index, self.now).unwrap();
                    self.model.insert(key, self.now);
                }
                None => prop_assert!(!self.model.contains_key(&key)),
            },
            Op::Remove(key) => match self.map.erase(&key) {
                Some(index) => {
                    self.directory.free(index).unwrap();
                    prop_assert_eq!(self.keys.erase(index), Ok(key));
                    self.model.remove(&key);
                }
                None => prop_assert!(!self.model.contains_key(&key)),
            },
            Op::Tick(dt) => self.now += Timestamp::from(dt),
            Op::Expire(lag) => {
                let cutoff = self.now.saturating_sub(Timestamp::from(lag));
                let expected: BTreeSet<u8> = self
                    .model
                    .iter()
                    .filter(|(_, &time)| time < cutoff)
                    .map(|(&key, _)| key)
                    .collect();

                let count =
                    expire_single_map(&mut self.directory, &mut self.keys, &mut self.map, cutoff);

                // Count correctness.
                prop_assert_eq!(count, expected.len());
                // Completeness: nothing older than the cutoff survives.
                for key in &expected {
                    prop_assert!(!self.map.contains_key(key));
                }
                // Minimality: everything else is still there.
                self.model.retain(|_, time| *time >= cutoff);
                for (_, time) in self.directory.iter() {
                    prop_assert!(time >= cutoff);
                }
            }
        }
        self.check_coherence()
    }

    fn check_coherence(&self) -> Result<(), TestCaseError> {
        self.directory.debug_validate_invariants();

        let allocated: BTreeSet<Index> = self.directory.iter().map(|(index, _)| index).collect();
        let occupied: BTreeSet<Index> = self.keys.indices().collect();
        let mapped: BTreeSet<Index> = self.map.iter().map(|(_, index)| index).collect();
        prop_assert_eq!(&allocated, &occupied);
        prop_assert_eq!(&allocated, &mapped);
        prop_assert_eq!(
            self.directory.len() + self.directory.free_count(),
            self.directory.capacity()
        );

        prop_assert_eq!(self.map.len(), self.model.len());
        for (key, index) in self.map.iter() {
            prop_assert_eq!(self.keys.get(index), Some(key));
            prop_assert_eq!(self.directory.timestamp(index), self.model.get(key).copied());
        }
        Ok(())
    }
}

proptest! {
    /// Directory, store and map stay coherent and sorted under any sequence,
    /// and every expiration removes exactly the entries below its cutoff.
    #[test]
    fn prop_single_map_matches_model(
        capacity in 1usize..16,
        ops in prop::collection::vec(op_strategy(), 0..200)
    ) {
        let mut harness = Harness::new(capacity);
        for op in ops {
            harness.apply(op)?;
        }
    }

    /// Two passes with non-decreasing cutoffs: the second removes exactly
    /// the entries stamped in `[first, second)`.
    #[test]
    fn prop_second_pass_removes_window(
        gaps in prop::collection::vec(0u64..5, 1..40),
        first in 0u64..100,
        extra in 0u64..100
    ) {
        let second = first + extra;
        let mut harness = Harness::new(gaps.len());
        let mut stamps = Vec::new();
        for (key, gap) in gaps.iter().enumerate() {
            harness.now += gap;
            harness.apply(Op::Insert(key as u8))?;
            stamps.push(harness.now);
        }

        let c1 = expire_single_map(&mut harness.directory, &mut harness.keys, &mut harness.map, first);
        let c2 = expire_single_map(&mut harness.directory, &mut harness.keys, &mut harness.map, second);
        prop_assert_eq!(c1, stamps.iter().filter(|&&t| t < first).count());
        prop_assert_eq!(c2, stamps.iter().filter(|&&t| t >= first && t < second).count());
    }

    /// Allocating and expiring at a cutoff no entry is older than changes
    /// nothing, and allocated + free always equals capacity.
    #[test]
    fn prop_unaged_entries_survive(
        capacity in 1usize..32,
        now in 1u64..1_000
    ) {
        let mut harness = Harness::new(capacity);
        harness.now = now;
        for key in 0..capacity {
            harness.apply(Op::Insert(key as u8))?;
        }
        let count = expire_single_map(&mut harness.directory, &mut harness.keys, &mut harness.map, now);
        prop_assert_eq!(count, 0);
        prop_assert_eq!(harness.directory.len(), capacity);
        prop_assert_eq!(harness.directory.free_count(), 0);
        harness.check_coherence()?;
    }

    /// The two-key table keeps both sub-maps and the directory in lockstep.
    #[test]
    fn prop_double_map_coherent(
        ops in prop::collection::vec(op_strategy(), 0..150)
    ) {
        let mut nat: ExpiringDoubleMap<u8, u16, u8> =
            ExpiringDoubleMap::open(Config::new(8).with_expiration_time(0)).unwrap();
        let mut model: HashMap<u8, Timestamp> = HashMap::new();
        let mut now: Timestamp = 0;

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let result = nat.insert(key, u16::from(key) + 1000, key, now);
                    match result {
                        Ok(_) => { model.insert(key, now); }
                        Err(LapseError::DuplicateKey) => prop_assert!(model.contains_key(&key)),
                        Err(LapseError::CapacityExhausted { .. }) => prop_assert_eq!(model.len(), 8),
                        Err(err) => prop_assert!(false, "unexpected error {}", err),
                    }
                }
                Op::Refresh(key) => {
                    let second = u16::from(key) + 1000;
                    let refreshed = nat.refresh(EitherKey::Second(&second), now).is_ok();
                    prop_assert_eq!(refreshed, model.contains_key(&key));
                    if refreshed {
                        model.insert(key, now);
                    }
                }
                Op::Remove(key) => {
                    let removed = nat.remove(EitherKey::First(&key)).is_ok();
                    prop_assert_eq!(removed, model.remove(&key).is_some());
                }
                Op::Tick(dt) => now += Timestamp::from(dt),
                Op::Expire(lag) => {
                    let cutoff = now.saturating_sub(Timestamp::from(lag));
                    let expected = model.values().filter(|&&t| t < cutoff).count();
                    prop_assert_eq!(nat.expire(cutoff), expected);
                    model.retain(|_, t| *t >= cutoff);
                }
            }

            nat.debug_validate_invariants();
            prop_assert_eq!(nat.len(), model.len());
            for (&key, &time) in &model {
                let second = u16::from(key) + 1000;
                prop_assert_eq!(nat.timestamp(EitherKey::First(&key)), Some(time));
                prop_assert_eq!(nat.lookup(EitherKey::First(&key)), nat.lookup(EitherKey::Second(&second)));
            }
        }
    }
}
