//! Terminal logging backend for the `ferrix` workspace.
//!
//! Library crates in the workspace log through the [`log`] facade and never
//! install a logger themselves. Binaries and test harnesses call [`init`] (or
//! [`init_with_level`]) once to route records to stderr as colored
//! `[LEVEL] target: message` lines.
//!
//! # Example
//!
//! ```
//! use log::LevelFilter;
//!
//! ferrix_log::init_with_level(LevelFilter::Debug);
//!
//! log::info!("interned {} symbols", 42);
//! log::debug!("chunk sizes: {:?}", [8192, 8192]);
//! ```

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Environment variable consulted by [`init`].
pub const LOG_ENV: &str = "FERRIX_LOG";

/// Level used when [`LOG_ENV`] is unset or unparsable.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Warn;

/// Returns the ANSI color code for a record level.
const fn color_code(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m", // Red
        Level::Warn => "\x1b[33m",  // Yellow
        Level::Info => "\x1b[32m",  // Green
        Level::Debug => "\x1b[36m", // Cyan
        Level::Trace => "\x1b[35m", // Magenta
    }
}

const fn filter_from_usize(raw: usize) -> LevelFilter {
    match raw {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Colored stderr logger.
///
/// The minimum level lives in an atomic so it can be changed after the
/// logger has been installed.
pub struct TerminalLogger {
    level: AtomicUsize,
}

impl TerminalLogger {
    const fn new(level: LevelFilter) -> Self {
        TerminalLogger {
            level: AtomicUsize::new(level as usize),
        }
    }

    /// Sets the minimum level of this logger.
    ///
    /// Does not touch the facade's max level; see [`set_level`] for that.
    pub fn set_level(&self, level: LevelFilter) {
        self.level.store(level as usize, Ordering::SeqCst);
    }

    /// Returns the current minimum level.
    pub fn level(&self) -> LevelFilter {
        filter_from_usize(self.level.load(Ordering::Relaxed))
    }
}

impl Log for TerminalLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level()
    }

    fn log(&self, record: &Record<'_>) {
        static RESET: &str = "\x1b[0m";

        if !self.enabled(record.metadata()) {
            return;
        }

        let color = color_code(record.level());
        let level = record.level().as_str();
        let target = record.target();

        eprintln!("{color}[{level}]{RESET} {target}: {}", record.args());
    }

    fn flush(&self) {}
}

static LOGGER: TerminalLogger = TerminalLogger::new(DEFAULT_LEVEL);

/// Returns the process-wide terminal logger.
pub fn get_logger() -> &'static TerminalLogger {
    &LOGGER
}

/// Parses a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`),
/// case-insensitively.
pub fn parse_level(s: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(s.trim()).map_err(|_| format!("Invalid log level: {s}"))
}

/// Installs the terminal logger with its level taken from [`LOG_ENV`].
///
/// Installing twice is harmless: the second call only updates the level.
pub fn init() {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|raw| parse_level(&raw).ok())
        .unwrap_or(DEFAULT_LEVEL);
    init_with_level(level);
}

/// Installs the terminal logger with an explicit level.
pub fn init_with_level(level: LevelFilter) {
    // a logger may already be installed (e.g. by another test in the binary)
    let _ = log::set_logger(&LOGGER);
    set_level(level);
}

/// Sets the minimum level of the installed logger and of the `log` facade.
pub fn set_level(level: LevelFilter) {
    LOGGER.set_level(level);
    log::set_max_level(level);
}

/// Sets the minimum level from a string.
///
/// # Example
///
/// ```
/// ferrix_log::set_level_from_str("debug").unwrap();
/// assert!(ferrix_log::set_level_from_str("loud").is_err());
/// ```
pub fn set_level_from_str(s: &str) -> Result<(), String> {
    let level = parse_level(s)?;
    set_level(level);
    Ok(())
}
