//! Logging setup for the import binary.
//!
//! Two sinks: a console layer on stderr whose level follows the verbosity
//! flags, and a plain-text layer appending to the import log file.

use crate::{DbL10nError, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Level written to the log file regardless of console verbosity.
pub const LOG_FILE_LEVEL: tracing::Level = tracing::Level::DEBUG;

/// Maps the `-v`/`-q` flags to a console level.
///
/// `quiet` wins over any verbosity: only errors are shown.
pub fn console_level(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Opens the import log for appending, creating it if needed.
///
/// # Errors
/// Returns an I/O error naming the path if the file cannot be opened.
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DbL10nError::io(format!("Failed to open log file {}", path.display()), e))
}

/// Initializes console and file logging.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs on the console
/// * `log_file` - Path of the import log
///
/// # Example
/// ```rust,no_run
/// use dbl10n_core::logging::init_logging;
/// use std::path::Path;
///
/// init_logging(0, false, Path::new("import.log")).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool, log_file: &Path) -> Result<()> {
    let file = open_log_file(log_file)?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(LevelFilter::from_level(console_level(verbose, quiet)));

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_filter(LevelFilter::from_level(LOG_FILE_LEVEL));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DbL10nError::configuration(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}
