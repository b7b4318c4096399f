//! Typed cell arena for evaluator values.
//!
//! The evaluator allocates one cell per value slot (attribute values, list
//! elements, primop results) and refers to it by a [`CellId`]. Cells are
//! never freed one by one: the whole arena is reclaimed when it is dropped.
//!
//! # Architecture
//!
//! - [`CellArena`]: owns the cells in a [`ChunkedVec`], hands out ids
//! - [`CellId`]: dense `u32` handle, valid only for the arena that issued it
//! - [`ArenaStats`]: allocation counters for profiling
//!
//! # Thread Safety
//!
//! `CellArena` is not synchronized. Evaluation is single-threaded; callers
//! that share an arena across threads must wrap it in a lock themselves.
//!
//! # Examples
//!
//! ```
//! use ferrix_mem::CellArena;
//!
//! let mut arena = CellArena::new(1024);
//! let id = arena.alloc(42u64);
//!
//! arena[id] += 1;
//! assert_eq!(arena[id], 43);
//! assert_eq!(arena.stats().cells, 1);
//! ```

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::chunked::ChunkedVec;

/// Handle to a cell in a [`CellArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u32);

impl CellId {
    /// Returns the raw index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell({})", self.0)
    }
}

/// Arena allocation statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Number of cells allocated.
    pub cells: usize,
    /// Number of chunks in the arena.
    pub chunk_count: usize,
    /// Cell slots reserved across all chunks.
    pub total_capacity: usize,
    /// Bytes occupied by allocated cells.
    pub bytes_allocated: usize,
}

/// Append-only arena of `T` cells addressed by [`CellId`].
pub struct CellArena<T> {
    cells: ChunkedVec<T>,
}

impl<T> CellArena<T> {
    /// Creates an arena with `chunk_size` cells per chunk.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        CellArena {
            cells: ChunkedVec::new(chunk_size),
        }
    }

    /// Moves `value` into a fresh cell.
    ///
    /// # Panics
    ///
    /// Panics if the arena has run out of `u32` ids.
    #[inline]
    pub fn alloc(&mut self, value: T) -> CellId {
        let (_, index) = self.cells.add(value);
        CellId(index)
    }

    /// Returns the cell for `id`, or `None` if it came from another arena.
    #[must_use]
    #[inline]
    pub fn get(&self, id: CellId) -> Option<&T> {
        self.cells.get(id.0)
    }

    /// Returns the cell for `id` mutably.
    #[must_use]
    #[inline]
    pub fn get_mut(&mut self, id: CellId) -> Option<&mut T> {
        self.cells.get_mut(id.0)
    }

    /// Returns the number of allocated cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if no cell has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns allocation statistics for this arena.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let cells = self.cells.len();
        let chunk_count = self.cells.chunk_count();
        ArenaStats {
            cells,
            chunk_count,
            total_capacity: chunk_count * self.cells.chunk_size(),
            bytes_allocated: cells * std::mem::size_of::<T>(),
        }
    }
}

impl<T> Index<CellId> for CellArena<T> {
    type Output = T;

    fn index(&self, id: CellId) -> &T {
        &self.cells[id.0]
    }
}

impl<T> IndexMut<CellId> for CellArena<T> {
    fn index_mut(&mut self, id: CellId) -> &mut T {
        &mut self.cells[id.0]
    }
}
