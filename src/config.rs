//! LAPSE - Table Configuration
//! Defines tunable parameters for the expiring tables.

use serde::{Deserialize, Serialize};

use crate::error::{LapseError, Result};
use crate::types::Timestamp;

/// Configuration for an expiring table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of live entries (and the index range `[0, capacity)`).
    pub capacity: usize,

    /// Entries not refreshed for longer than this are expired.
    /// Expressed in the same unit as the timestamps handed to the table.
    pub expiration_time: Timestamp,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 65_536,
            expiration_time: 10_000_000, // 10 s in microseconds
        }
    }
}

impl Config {
    /// Create a new Config with a custom capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Set the maximum number of live entries.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the idle time after which an entry expires.
    pub fn with_expiration_time(mut self, expiration_time: Timestamp) -> Self {
        self.expiration_time = expiration_time;
        self
    }

    /// Reject configurations no table can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(LapseError::Config("capacity must be non-zero".into()));
        }
        Ok(())
    }

    /// Oldest timestamp that survives an expiration pass run at `now`.
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub(self.expiration_time)
    }
}
