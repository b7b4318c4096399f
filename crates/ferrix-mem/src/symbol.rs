//! Symbol type for interned identifiers.
//!
//! Symbols are dense 32-bit identifiers issued by a
//! [`SymbolTable`](crate::SymbolTable). Id `0` is reserved as "no symbol";
//! every symbol a table returns is non-zero.
//!
//! # Examples
//!
//! ```
//! use ferrix_mem::{Symbol, SymbolTable};
//!
//! let mut table = SymbolTable::new();
//! let foo = table.create("foo");
//!
//! assert!(foo.is_valid());
//! assert!(!Symbol::default().is_valid());
//! assert_eq!(table.resolve(foo), "foo");
//! ```

use std::fmt;
use std::ops::Deref;

/// A symbol representing an interned identifier.
///
/// Symbols provide:
/// - O(1) equality comparison (compare `u32` ids)
/// - A total order by id, used to sort attribute records. The order follows
///   interning order, not the lexical order of the text.
/// - Minimal footprint (4 bytes)
///
/// A symbol is only meaningful for the table that issued it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Creates a symbol from a raw id. Only tables mint symbols.
    #[must_use]
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrix_mem::SymbolTable;
    ///
    /// let mut table = SymbolTable::new();
    /// assert_eq!(table.create("a").as_u32(), 1);
    /// assert_eq!(table.create("b").as_u32(), 2);
    /// ```
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the raw id value as usize.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Returns false for the reserved "no symbol" id.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// The reserved "no symbol" value.
    #[must_use]
    pub const fn invalid() -> Self {
        Self(0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Borrowed view of a symbol's text.
///
/// The view borrows the table that owns the text, so it cannot outlive it
/// and cannot be mixed up with another table's identifier space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolStr<'a>(&'a str);

impl<'a> SymbolStr<'a> {
    pub(crate) const fn new(text: &'a str) -> Self {
        Self(text)
    }

    /// Returns the text with the table's lifetime.
    #[must_use]
    pub const fn as_str(self) -> &'a str {
        self.0
    }
}

impl Deref for SymbolStr<'_> {
    type Target = str;

    fn deref(&self) -> &str {
        self.0
    }
}

impl AsRef<str> for SymbolStr<'_> {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl fmt::Display for SymbolStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl PartialEq<str> for SymbolStr<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SymbolStr<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for SymbolStr<'_> {
    fn eq(&self, other: &String) -> bool {
        self.0 == other.as_str()
    }
}

impl<'a> From<SymbolStr<'a>> for &'a str {
    fn from(view: SymbolStr<'a>) -> Self {
        view.0
    }
}
