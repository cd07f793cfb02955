//! LAPSE - Core Type Definitions
//! Defines fundamental types shared by the directory, stores and maps.

/// Small integer handle into a bounded-capacity structure.
/// Valid indices live in `[0, capacity)` and are reused after release.
pub type Index = usize;

/// Last-refresh time of an entry.
/// Logical ticks or wall-clock microseconds; only the ordering matters.
pub type Timestamp = u64;

/// A row of a two-key table: the value plus both keys that reach it.
/// Owned once by the row store; the two key maps only hold its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<K1, K2, V> {
    pub first: K1,
    pub second: K2,
    pub value: V,
}

impl<K1, K2, V> Row<K1, K2, V> {
    pub fn new(first: K1, second: K2, value: V) -> Self {
        Self {
            first,
            second,
            value,
        }
    }
}

/// Selects a row of a two-key table through either of its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EitherKey<'a, K1, K2> {
    First(&'a K1),
    Second(&'a K2),
}
