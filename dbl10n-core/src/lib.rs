//! Core of the DB-l10n predefined-data import.
//!
//! Provides the connection parameters, logging setup, database session and
//! import pipeline used by the `dbl10n-import` binary.
//!
//! # Flow
//! parse arguments, connect, import phase (one transaction), post-load
//! maintenance (`VACUUM ANALYZE` in autocommit mode), disconnect.

pub mod connection;
pub mod error;
pub mod import;
pub mod logging;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use connection::ConnectionParams;
pub use error::{DbL10nError, Result};
pub use import::{DEFAULT_SCHEMA, ImportOptions, ImportReport, run_import};
pub use logging::init_logging;
pub use registry::RegistrySource;
pub use session::{ImportSession, PostgresSession};
