//! LAPSE - Dense Store
//! Fixed-capacity slot array addressed by directory indices.
//!
//! Each slot is empty, occupied, or borrowed. `borrow` moves the value out
//! and leaves the slot marked borrowed until `give_back` returns it, which
//! models exclusive checkout of a slot during an external operation (for
//! example reading a key before erasing it from a map). Short scoped access
//! goes through `get`/`get_mut` instead.

use std::mem;

use crate::error::{LapseError, Result};
use crate::types::Index;

#[derive(Debug, Clone)]
enum Slot<T> {
    Empty,
    Occupied(T),
    Borrowed,
}

/// Array of `capacity` optional values indexed by `Index`.
#[derive(Debug, Clone)]
pub struct DenseStore<T> {
    slots: Vec<Slot<T>>,
    /// Occupied plus borrowed slots.
    len: usize,
}

impl<T> DenseStore<T> {
    /// Create a store with `capacity` empty slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| Slot::Empty).take(capacity).collect(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of non-empty slots, borrowed ones included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if the slot holds a value or has it checked out.
    pub fn is_occupied(&self, index: Index) -> bool {
        matches!(
            self.slots.get(index),
            Some(Slot::Occupied(_) | Slot::Borrowed)
        )
    }

    pub fn is_borrowed(&self, index: Index) -> bool {
        matches!(self.slots.get(index), Some(Slot::Borrowed))
    }

    /// Store `value` in an empty slot.
    pub fn place(&mut self, index: Index, value: T) -> Result<()> {
        let slot = self.slot_mut(index)?;
        match *slot {
            Slot::Empty => {
                *slot = Slot::Occupied(value);
                self.len += 1;
                Ok(())
            }
            Slot::Occupied(_) => Err(LapseError::SlotOccupied(index)),
            Slot::Borrowed => Err(LapseError::SlotBorrowed(index)),
        }
    }

    pub fn get(&self, index: Index) -> Option<&T> {
        match self.slots.get(index) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        match self.slots.get_mut(index) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Check the value out of its slot. The slot stays reserved until
    /// `give_back`; any other access to it fails with `SlotBorrowed`.
    pub fn borrow(&mut self, index: Index) -> Result<T> {
        let slot = self.slot_mut(index)?;
        match mem::replace(slot, Slot::Borrowed) {
            Slot::Occupied(value) => Ok(value),
            Slot::Empty => {
                *slot = Slot::Empty;
                Err(LapseError::SlotEmpty(index))
            }
            Slot::Borrowed => Err(LapseError::SlotBorrowed(index)),
        }
    }

    /// Return a value checked out with `borrow`.
    pub fn give_back(&mut self, index: Index, value: T) -> Result<()> {
        let slot = self.slot_mut(index)?;
        match *slot {
            Slot::Borrowed => {
                *slot = Slot::Occupied(value);
                Ok(())
            }
            _ => Err(LapseError::SlotNotBorrowed(index)),
        }
    }

    /// Empty an occupied slot, handing its value back to the caller.
    pub fn erase(&mut self, index: Index) -> Result<T> {
        let slot = self.slot_mut(index)?;
        match mem::replace(slot, Slot::Empty) {
            Slot::Occupied(value) => {
                self.len -= 1;
                Ok(value)
            }
            Slot::Empty => Err(LapseError::SlotEmpty(index)),
            Slot::Borrowed => {
                *slot = Slot::Borrowed;
                Err(LapseError::SlotBorrowed(index))
            }
        }
    }

    /// Indices of all non-empty slots, ascending.
    pub fn indices(&self) -> impl Iterator<Item = Index> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !matches!(slot, Slot::Empty))
            .map(|(index, _)| index)
    }

    fn slot_mut(&mut self, index: Index) -> Result<&mut Slot<T>> {
        let capacity = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(LapseError::IndexOutOfRange { index, capacity })
    }
}
