//! Append-only chunked storage with stable element addresses.
//!
//! [`ChunkedVec`] is the backing store for interned symbol text and for
//! evaluator value cells. It never moves an element once it has been added:
//!
//! - **Fixed-size chunks**: each chunk is allocated with its full capacity up
//!   front and is never grown, so pushing into it cannot reallocate
//! - **Append only**: elements are never removed or reordered
//! - **Dense indices**: the n-th added element has index `n`, which makes the
//!   index a cheap handle for the element
//!
//! # Performance
//!
//! - **Add**: amortized O(1); a new chunk is allocated every `chunk_size`
//!   elements
//! - **Get**: O(1), one division and two bounds checks
//!
//! # Examples
//!
//! ```
//! use ferrix_mem::ChunkedVec;
//!
//! let mut store = ChunkedVec::new(2);
//! let (_, a) = store.add(String::from("a"));
//! let (_, b) = store.add(String::from("b"));
//! let (_, c) = store.add(String::from("c")); // starts a second chunk
//!
//! assert_eq!((a, b, c), (0, 1, 2));
//! assert_eq!(store.chunk_count(), 2);
//! assert_eq!(store[2], "c");
//! ```

use std::ops::{Index, IndexMut};

/// Default number of elements per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Append-only vector split into fixed-size chunks.
///
/// Unlike `Vec<T>`, growth never relocates existing elements, so references
/// handed out earlier stay valid for as long as the store is alive (the
/// borrow checker still ties them to the store's lifetime).
pub struct ChunkedVec<T> {
    /// Chunks, each allocated with exactly `chunk_size` capacity.
    chunks: Vec<Vec<T>>,
    /// Elements per chunk.
    chunk_size: usize,
    /// Total number of elements across all chunks.
    len: usize,
}

impl<T> ChunkedVec<T> {
    /// Creates an empty store with `chunk_size` elements per chunk.
    ///
    /// A `chunk_size` of zero is treated as one.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self::with_reserved_chunks(chunk_size, 0)
    }

    /// Creates an empty store and reserves room for `chunks` chunk headers.
    ///
    /// Only the chunk directory is reserved; element storage is still
    /// allocated one chunk at a time.
    #[must_use]
    pub fn with_reserved_chunks(chunk_size: usize, chunks: usize) -> Self {
        ChunkedVec {
            chunks: Vec::with_capacity(chunks),
            chunk_size: chunk_size.max(1),
            len: 0,
        }
    }

    /// Appends `value` and returns a reference to it with its index.
    ///
    /// # Panics
    ///
    /// Panics if the `u32` index space is exhausted.
    pub fn add(&mut self, value: T) -> (&T, u32) {
        let index = u32::try_from(self.len)
            .ok()
            .filter(|&index| index != u32::MAX)
            .expect("chunked vector index space exhausted");

        let needs_chunk = self
            .chunks
            .last()
            .is_none_or(|chunk| chunk.len() == self.chunk_size);
        if needs_chunk {
            self.add_chunk();
        }

        let Some(chunk) = self.chunks.last_mut() else {
            unreachable!("a chunk was just added");
        };
        // capacity was reserved in add_chunk, this push never reallocates
        chunk.push(value);
        self.len += 1;

        let slot = chunk.len() - 1;
        (&chunk[slot], index)
    }

    #[cold]
    fn add_chunk(&mut self) {
        log::trace!(
            "chunked store: allocating chunk #{} ({} slots)",
            self.chunks.len(),
            self.chunk_size
        );
        self.chunks.push(Vec::with_capacity(self.chunk_size));
    }

    /// Returns the element at `index`, if any.
    #[must_use]
    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        let index = index as usize;
        self.chunks
            .get(index / self.chunk_size)?
            .get(index % self.chunk_size)
    }

    /// Returns the element at `index` mutably, if any.
    #[must_use]
    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        let index = index as usize;
        self.chunks
            .get_mut(index / self.chunk_size)?
            .get_mut(index % self.chunk_size)
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of allocated chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns the number of elements per chunk.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Iterates over all elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.chunks.iter().flatten()
    }

    /// Calls `callback` with every element and its index, in insertion order.
    pub fn for_each(&self, mut callback: impl FnMut(&T, u32)) {
        for (index, value) in (0u32..).zip(self.iter()) {
            callback(value, index);
        }
    }
}

impl<T> Index<u32> for ChunkedVec<T> {
    type Output = T;

    fn index(&self, index: u32) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "chunked vector index {index} out of bounds (len {})",
                self.len
            ),
        }
    }
}

impl<T> IndexMut<u32> for ChunkedVec<T> {
    fn index_mut(&mut self, index: u32) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("chunked vector index {index} out of bounds (len {len})"),
        }
    }
}

impl<T> Default for ChunkedVec<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}
