//! `ferrix` - inspect the evaluator core from the command line.
//!
//! Builds an evaluator from the standard primop registry and dumps what it
//! sees: the `builtins` record, or the contents of a symbol table.

mod commands;
mod error;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ferrix_expr::{EvalSettings, ExperimentalFeature};

use commands::{run_dump_builtins, run_symbols};
use error::{CliError, Result};

/// Ferrix - evaluator core inspector
#[derive(Parser, Debug)]
#[command(name = "ferrix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect the ferrix evaluator core", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Experimental features to enable, in addition to those set in
    /// FERRIX_EXPERIMENTAL_FEATURES
    #[arg(long = "experimental-features", global = true, value_delimiter = ',')]
    experimental_features: Vec<ExperimentalFeature>,

    /// Expose primops that load or run native code
    #[arg(long, global = true)]
    enable_native_code: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, env = ferrix_log::LOG_ENV)]
    log_level: Option<String>,

    /// Print evaluator statistics after the command
    #[arg(long, global = true)]
    show_stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every entry of the `builtins` record
    ///
    /// Entries are printed in name order with their arity, argument names
    /// and documentation. Constants are printed with their value.
    DumpBuiltins,

    /// Intern words into a fresh symbol table and dump it
    ///
    /// Reads one word per line from stdin when no words are given.
    Symbols {
        /// Words to intern
        words: Vec<String>,
    },
}

impl Cli {
    fn settings(&self) -> Result<EvalSettings> {
        let mut settings = EvalSettings::from_env()?
            .with_features(self.experimental_features.iter().copied());
        if self.enable_native_code {
            settings = settings.enable_native_code(true);
        }
        Ok(settings)
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    match level {
        Some(level) => {
            let level = ferrix_log::parse_level(level).map_err(CliError::LogLevel)?;
            ferrix_log::init_with_level(level);
        }
        None => ferrix_log::init(),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_level.as_deref())?;

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Commands::DumpBuiltins => run_dump_builtins(cli.settings()?, cli.show_stats, &mut stdout),
        Commands::Symbols { words } => {
            run_symbols(words, io::stdin().lock(), cli.show_stats, &mut stdout)
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
