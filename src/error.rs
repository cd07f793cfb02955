//! LAPSE - Custom Error Types
//! Defines the error hierarchy for the expiring index directory.

use thiserror::Error;

use crate::types::{Index, Timestamp};

/// Custom Result type for the lapse crate.
pub type Result<T> = std::result::Result<T, LapseError>;

/// Error types for the directory, stores, maps and tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LapseError {
    /// Allocation requested with no free index left.
    #[error("Capacity exhausted: all {capacity} indices are allocated")]
    CapacityExhausted { capacity: usize },

    /// Index outside `[0, capacity)`.
    #[error("Index {index} out of range (capacity {capacity})")]
    IndexOutOfRange { index: Index, capacity: usize },

    /// Refresh or free of an index that is not allocated.
    #[error("Index {0} is not allocated")]
    IndexNotAllocated(Index),

    /// A timestamp older than the newest entry would break the ordering.
    #[error("Stale timestamp {now}: newest entry was refreshed at {newest}")]
    StaleTimestamp { now: Timestamp, newest: Timestamp },

    /// Slot access on an empty slot.
    #[error("Slot {0} is empty")]
    SlotEmpty(Index),

    /// Placement into a slot that already holds a value.
    #[error("Slot {0} is already occupied")]
    SlotOccupied(Index),

    /// Access to a slot whose value is currently checked out.
    #[error("Slot {0} is borrowed")]
    SlotBorrowed(Index),

    /// Return of a value to a slot that was never borrowed.
    #[error("Slot {0} is not borrowed")]
    SlotNotBorrowed(Index),

    /// Insert of a key that is already mapped.
    #[error("Key already present")]
    DuplicateKey,

    /// Key not found in the map.
    #[error("Key not found")]
    KeyNotFound,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LapseError {
    /// Returns true for errors that signal a broken caller contract rather
    /// than an ordinary runtime condition such as a full table.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(
            self,
            LapseError::CapacityExhausted { .. } | LapseError::KeyNotFound | LapseError::Config(_)
        )
    }
}
