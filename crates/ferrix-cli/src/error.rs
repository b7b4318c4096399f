//! Error type for the `ferrix` binary.

use ferrix_expr::{EvalError, SettingsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("invalid log level: {0}")]
    LogLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
