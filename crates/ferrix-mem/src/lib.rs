//! `ferrix` memory and interning infrastructure
//!
//! This crate provides the storage primitives underneath the `ferrix`
//! evaluator:
//!
//! - **Chunked storage**: append-only vector whose elements never move
//! - **Cell arena**: typed value cells addressed by dense ids
//! - **Symbol table**: deduplicated identifier storage with `u32` symbols
//! - **Static symbols**: well-known attribute names interned up front
//!
//! Nothing here is synchronized. An evaluator owns its table and arena and
//! uses them from one thread.

pub mod arena;
pub mod chunked;
pub mod static_symbols;
pub mod symbol;
pub mod table;

pub use arena::{ArenaStats, CellArena, CellId};
pub use chunked::{ChunkedVec, DEFAULT_CHUNK_SIZE};
pub use static_symbols::StaticSymbols;
pub use symbol::{Symbol, SymbolStr};
pub use table::SymbolTable;
