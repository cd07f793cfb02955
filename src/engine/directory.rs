//! LAPSE - Index Directory
//! Capacity-bounded allocator of small integer indices, each tagged with
//! its last-refresh timestamp and kept in oldest-to-newest order.
//!
//! ## Design
//! - One cell per index holding `prev`/`next` links and a timestamp
//! - Allocated indices form an intrusive doubly linked list sorted by
//!   timestamp: allocation and refresh always link at the newest end
//! - Free indices sit on a stack (LIFO reuse; a fresh directory hands
//!   out 0, 1, 2, ...)
//!
//! Because every mutator appends at the newest end, the oldest end is always
//! the next expiration candidate and draining `k` expired indices costs O(k).
//!
//! | Operation                | Time |
//! |--------------------------|------|
//! | `allocate`               | O(1) |
//! | `refresh`                | O(1) |
//! | `free`                   | O(1) |
//! | `pop_oldest_if_expired`  | O(1) |
//!
//! Entries that share a timestamp stay in allocation/refresh order.

use crate::error::{LapseError, Result};
use crate::types::{Index, Timestamp};

/// Link sentinel: no neighbour.
const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Cell {
    prev: usize,
    next: usize,
    time: Timestamp,
    allocated: bool,
}

impl Cell {
    const FREE: Cell = Cell {
        prev: NIL,
        next: NIL,
        time: 0,
        allocated: false,
    };
}

/// Index allocator ordered by last-refresh time.
#[derive(Debug, Clone)]
pub struct IndexDirectory {
    cells: Vec<Cell>,
    /// Unallocated indices; the top of the stack is handed out next.
    free: Vec<Index>,
    /// Head of the allocated list (oldest timestamp).
    oldest: usize,
    /// Tail of the allocated list (newest timestamp).
    newest: usize,
    len: usize,
}

impl IndexDirectory {
    /// Create a directory with every index in `[0, capacity)` free.
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: vec![Cell::FREE; capacity],
            free: (0..capacity).rev().collect(),
            oldest: NIL,
            newest: NIL,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Number of allocated indices.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn is_allocated(&self, index: Index) -> bool {
        self.cells.get(index).is_some_and(|cell| cell.allocated)
    }

    /// Last-refresh time of an allocated index.
    pub fn timestamp(&self, index: Index) -> Option<Timestamp> {
        self.cells
            .get(index)
            .filter(|cell| cell.allocated)
            .map(|cell| cell.time)
    }

    /// The next expiration candidate.
    pub fn oldest(&self) -> Option<(Index, Timestamp)> {
        self.entry_at(self.oldest)
    }

    /// The most recently allocated or refreshed index.
    pub fn newest(&self) -> Option<(Index, Timestamp)> {
        self.entry_at(self.newest)
    }

    /// Take a free index and place it at the newest end with timestamp `now`.
    pub fn allocate(&mut self, now: Timestamp) -> Result<Index> {
        self.check_monotonic(now)?;
        let index = self.free.pop().ok_or(LapseError::CapacityExhausted {
            capacity: self.capacity(),
        })?;

        let cell = &mut self.cells[index];
        cell.time = now;
        cell.allocated = true;
        self.link_newest(index);
        self.len += 1;
        Ok(index)
    }

    /// Move an allocated index to the newest end with timestamp `now`.
    pub fn refresh(&mut self, index: Index, now: Timestamp) -> Result<()> {
        self.check_allocated(index)?;
        self.check_monotonic(now)?;

        self.unlink(index);
        self.cells[index].time = now;
        self.link_newest(index);
        Ok(())
    }

    /// Release an allocated index regardless of its age.
    pub fn free(&mut self, index: Index) -> Result<()> {
        self.check_allocated(index)?;
        self.release(index);
        Ok(())
    }

    /// Release and return the oldest index if its timestamp is strictly
    /// below `cutoff`. Leaves the directory untouched otherwise.
    pub fn pop_oldest_if_expired(&mut self, cutoff: Timestamp) -> Option<Index> {
        let (index, time) = self.oldest()?;
        if time >= cutoff {
            return None;
        }
        self.release(index);
        Some(index)
    }

    /// Iterate allocated indices from oldest to newest.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            directory: self,
            cursor: self.oldest,
        }
    }

    /// Panics if the list, the free stack and the counters disagree,
    /// or if the order is not sorted by timestamp.
    pub fn debug_validate_invariants(&self) {
        let mut walked = 0;
        let mut prev = NIL;
        let mut cursor = self.oldest;
        while cursor != NIL {
            let cell = &self.cells[cursor];
            assert!(cell.allocated, "listed index {cursor} is not allocated");
            assert_eq!(cell.prev, prev, "broken back link at index {cursor}");
            if prev != NIL {
                assert!(
                    self.cells[prev].time <= cell.time,
                    "order not sorted at index {cursor}"
                );
            }
            walked += 1;
            assert!(walked <= self.capacity(), "cycle in allocated list");
            prev = cursor;
            cursor = cell.next;
        }
        assert_eq!(prev, self.newest, "tail does not match last listed index");
        assert_eq!(walked, self.len, "len({}) != listed({walked})", self.len);

        for &index in &self.free {
            assert!(!self.cells[index].allocated, "free index {index} is allocated");
        }
        assert_eq!(
            self.len + self.free.len(),
            self.capacity(),
            "allocated({}) + free({}) != capacity({})",
            self.len,
            self.free.len(),
            self.capacity()
        );
    }

    fn entry_at(&self, index: usize) -> Option<(Index, Timestamp)> {
        (index != NIL).then(|| (index, self.cells[index].time))
    }

    fn check_allocated(&self, index: Index) -> Result<()> {
        match self.cells.get(index) {
            None => Err(LapseError::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            }),
            Some(cell) if !cell.allocated => Err(LapseError::IndexNotAllocated(index)),
            Some(_) => Ok(()),
        }
    }

    fn check_monotonic(&self, now: Timestamp) -> Result<()> {
        match self.newest() {
            Some((_, newest)) if now < newest => Err(LapseError::StaleTimestamp { now, newest }),
            _ => Ok(()),
        }
    }

    fn release(&mut self, index: Index) {
        self.unlink(index);
        self.cells[index].allocated = false;
        self.free.push(index);
        self.len -= 1;
    }

    fn link_newest(&mut self, index: Index) {
        let tail = self.newest;
        let cell = &mut self.cells[index];
        cell.prev = tail;
        cell.next = NIL;
        if tail == NIL {
            self.oldest = index;
        } else {
            self.cells[tail].next = index;
        }
        self.newest = index;
    }

    fn unlink(&mut self, index: Index) {
        let Cell { prev, next, .. } = self.cells[index];
        if prev == NIL {
            self.oldest = next;
        } else {
            self.cells[prev].next = next;
        }
        if next == NIL {
            self.newest = prev;
        } else {
            self.cells[next].prev = prev;
        }
        let cell = &mut self.cells[index];
        cell.prev = NIL;
        cell.next = NIL;
    }
}

/// Oldest-to-newest iterator over `(index, timestamp)` pairs.
pub struct Iter<'a> {
    directory: &'a IndexDirectory,
    cursor: usize,
}

impl Iterator for Iter<'_> {
    type Item = (Index, Timestamp);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.directory.entry_at(self.cursor)?;
        self.cursor = self.directory.cells[self.cursor].next;
        Some(entry)
    }
}
