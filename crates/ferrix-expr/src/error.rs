//! Error types for the evaluator core.
//!
//! Only conditions a well-formed program can trigger are errors here.
//! Internal corruption (forged symbols, overfilled records, lookups on
//! unsorted records) panics instead.

use thiserror::Error;

/// Recoverable evaluation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// A record was requested with more slots than a record can index.
    #[error("attribute set of size {requested} is too big")]
    AttrSetTooBig { requested: usize },

    /// A primop received a value of the wrong type.
    #[error("expected a value of type '{expected}' but found '{got}'")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    /// Selecting a name that is not in the record.
    #[error("attribute '{name}' missing")]
    MissingAttribute { name: String },

    /// A native-code primop ran without an installed host.
    #[error("'{primop}' requires native code support, which is not available")]
    NativeCodeUnavailable { primop: &'static str },

    #[error("primop '{primop}' expects {expected} argument(s) but got {got}")]
    WrongArgumentCount {
        primop: &'static str,
        expected: usize,
        got: usize,
    },

    /// Failure reported by the embedder's native host.
    #[error("native code failed: {0}")]
    Native(String),
}

/// Result type for evaluator operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Error parsing [`EvalSettings`](crate::EvalSettings) input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown experimental feature '{0}'")]
    UnknownFeature(String),

    #[error("invalid boolean '{value}' for {key} (expected true/false/1/0/yes/no)")]
    InvalidBool { key: String, value: String },
}
