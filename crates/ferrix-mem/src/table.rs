//! Deduplicating symbol table.
//!
//! The table owns every interned string in a [`ChunkedVec`] and keeps a
//! hash index of store positions next to it. Symbol `n` names store slot
//! `n - 1`, so resolving a symbol is one division and two bounds checks.
//!
//! # Design
//!
//! - `store`: owns the text, never moves an entry once added
//! - `index`: `HashTable<u32>` of store positions hashed with `fxhash`; the
//!   index borrows the text through the store instead of keeping a second
//!   copy as a map key
//!
//! The table is not synchronized. Concurrent evaluators need either a lock
//! around the table or a table per thread.
//!
//! # Examples
//!
//! ```
//! use ferrix_mem::SymbolTable;
//!
//! let mut table = SymbolTable::new();
//!
//! let foo = table.create("foo");
//! let bar = table.create("bar");
//!
//! assert_eq!(table.create("foo"), foo);
//! assert_ne!(foo, bar);
//! assert_eq!(table.resolve(bar), "bar");
//! assert_eq!(&table[foo], "foo");
//! ```
//!
//! # Performance
//!
//! - **Known text**: one hash plus one string comparison per probe
//! - **New text**: one copy into the store plus one index insert
//! - **Resolve**: O(1) chunk indexing

use std::fmt;
use std::ops::Index;

use hashbrown::HashTable;

use crate::chunked::{ChunkedVec, DEFAULT_CHUNK_SIZE};
use crate::symbol::{Symbol, SymbolStr};

/// Chunk headers reserved up front by [`SymbolTable::new`].
const RESERVED_CHUNKS: usize = 16;

#[inline]
fn hash_text(text: &str) -> u64 {
    fxhash::hash64(text)
}

/// Symbol table with a bidirectional text/id mapping.
///
/// Ids are dense and start at 1. The empty string is an ordinary entry.
pub struct SymbolTable {
    /// Store positions, keyed by the hash of the text they point at.
    index: HashTable<u32>,

    /// Interned text. Slot `n` backs symbol `n + 1`.
    store: ChunkedVec<String>,

    /// Sum of the byte lengths of all interned strings.
    total_bytes: usize,
}

impl SymbolTable {
    /// Creates an empty table with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates an empty table storing `chunk_size` strings per chunk.
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        SymbolTable {
            index: HashTable::new(),
            store: ChunkedVec::with_reserved_chunks(chunk_size, RESERVED_CHUNKS),
            total_bytes: 0,
        }
    }

    /// Interns `text`, returning its symbol.
    ///
    /// Text seen before gets its existing symbol back. Otherwise a copy is
    /// appended to the store and the next id is assigned.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrix_mem::SymbolTable;
    ///
    /// let mut table = SymbolTable::new();
    ///
    /// assert_eq!(table.create("foo").as_u32(), 1);
    /// assert_eq!(table.create("bar").as_u32(), 2);
    /// assert_eq!(table.create("foo").as_u32(), 1);
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn create(&mut self, text: &str) -> Symbol {
        let hash = hash_text(text);
        if let Some(symbol) = self.find(hash, text) {
            return symbol;
        }
        self.insert_hashed(hash, text)
    }

    /// Interns `text` without checking whether it is already present.
    ///
    /// Inserting text that is already interned breaks the one-id-per-text
    /// guarantee; only debug builds check for it.
    pub(crate) fn insert(&mut self, text: &str) -> Symbol {
        debug_assert!(
            self.lookup(text).is_none(),
            "unchecked insert of already interned text {text:?}"
        );
        self.insert_hashed(hash_text(text), text)
    }

    fn find(&self, hash: u64, text: &str) -> Option<Symbol> {
        let store = &self.store;
        self.index
            .find(hash, |&slot| store[slot] == text)
            .map(|&slot| Symbol::new(slot + 1))
    }

    fn insert_hashed(&mut self, hash: u64, text: &str) -> Symbol {
        let (_, slot) = self.store.add(text.to_owned());
        self.total_bytes += text.len();

        let store = &self.store;
        self.index
            .insert_unique(hash, slot, |&other| hash_text(&store[other]));

        log::trace!("symbol table: interned {text:?} as #{}", slot + 1);
        Symbol::new(slot + 1)
    }

    /// Returns the symbol for `text` if it has been interned, without
    /// interning it.
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<Symbol> {
        self.find(hash_text(text), text)
    }

    /// Returns the text of `symbol`, or `None` if this table never issued it.
    #[must_use]
    pub fn get(&self, symbol: Symbol) -> Option<SymbolStr<'_>> {
        let slot = symbol.as_u32().checked_sub(1)?;
        self.store.get(slot).map(|text| SymbolStr::new(text))
    }

    /// Resolves `symbol` to its text.
    ///
    /// # Panics
    ///
    /// Panics if `symbol` is the invalid symbol or was not issued by this
    /// table. Both mean the caller mixed up tables or forged an id.
    #[must_use]
    #[track_caller]
    pub fn resolve(&self, symbol: Symbol) -> SymbolStr<'_> {
        match self.get(symbol) {
            Some(text) => text,
            None => invalid_symbol(symbol, self.len()),
        }
    }

    /// Resolves every symbol in `symbols`, preserving order.
    ///
    /// # Panics
    ///
    /// Panics on the first symbol [`resolve`](Self::resolve) would reject.
    #[must_use]
    #[track_caller]
    pub fn resolve_all(&self, symbols: &[Symbol]) -> Vec<SymbolStr<'_>> {
        symbols.iter().map(|&symbol| self.resolve(symbol)).collect()
    }

    /// Returns the number of interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the total byte length of all interned text.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.total_bytes
    }

    /// Returns the number of store chunks allocated so far.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.store.chunk_count()
    }

    /// Calls `callback` once per interned string, in insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrix_mem::SymbolTable;
    ///
    /// let mut table = SymbolTable::new();
    /// table.create("x");
    /// table.create("yy");
    ///
    /// let mut bytes = 0;
    /// table.dump(|text, _| bytes += text.len());
    /// assert_eq!(bytes, table.total_size());
    /// ```
    pub fn dump<'a>(&'a self, mut callback: impl FnMut(SymbolStr<'a>, Symbol)) {
        for (symbol, text) in self.iter() {
            callback(text, symbol);
        }
    }

    /// Iterates over `(symbol, text)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, SymbolStr<'_>)> + '_ {
        (1u32..)
            .zip(self.store.iter())
            .map(|(id, text)| (Symbol::new(id), SymbolStr::new(text)))
    }
}

#[cold]
#[track_caller]
fn invalid_symbol(symbol: Symbol, len: usize) -> ! {
    panic!("invalid symbol id {} (table holds {len} symbols)", symbol.as_u32())
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<Symbol> for SymbolTable {
    type Output = str;

    #[track_caller]
    fn index(&self, symbol: Symbol) -> &str {
        self.resolve(symbol).as_str()
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("len", &self.len())
            .field("total_size", &self.total_bytes)
            .field("chunks", &self.store.chunk_count())
            .finish()
    }
}
