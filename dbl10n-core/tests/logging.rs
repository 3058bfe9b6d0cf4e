//! Import log file tests.
//!
//! Runs in its own process so the global subscriber can be installed here.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use dbl10n_core::{DbL10nError, init_logging};

#[test]
fn test_log_file_receives_debug_events_without_ansi() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("import.log");
    std::fs::write(&path, "previous run\n").unwrap();

    // Quiet console; the file still records DEBUG
    init_logging(0, true, &path).expect("first initialization succeeds");
    tracing::debug!("registry staged for schema l10n");
    tracing::trace!("below the file level");

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("previous run\n"), "log was truncated");
    assert!(contents.contains("DEBUG"));
    assert!(contents.contains("registry staged for schema l10n"));
    assert!(!contents.contains("below the file level"));
    assert!(!contents.contains("\x1b["), "ANSI escapes in log file");

    // Only one global subscriber per process
    let error = init_logging(0, false, &path).unwrap_err();
    assert!(matches!(error, DbL10nError::Configuration { .. }));
}
