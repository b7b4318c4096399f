//! Subcommand implementations.
//!
//! Each command writes to a caller-supplied sink so tests can capture it.

pub mod dump_builtins;
pub mod symbols;

pub use dump_builtins::run_dump_builtins;
pub use symbols::run_symbols;
