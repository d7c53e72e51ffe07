// Unit tests for logger module initialization logic
// Tests focus on idempotence, log file errors and level parsing

use crate::logger::{DEFAULT_LOG_LEVEL, LOG_FILE_NAME, initialize, open_log_file, parse_level};

use std::path::PathBuf;

use log::LevelFilter;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Tests and the binary may both reach initialization. If the
/// second call errors, startup would fail for no real reason.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to fail when setting a global logger twice.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = tempfile::tempdir().unwrap();

    // WHEN: Calling initialize twice
    let result1 = initialize(temp_dir.path(), LevelFilter::Info);
    let result2 = initialize(temp_dir.path(), LevelFilter::Info);

    // THEN: Both should return Ok (second one logs warning but doesn't error)
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(
        result2.is_ok(),
        "Second initialization should succeed (idempotent)"
    );
}

/// **VALUE**: Verifies that an unusable log directory is an error, not a panic.
///
/// **WHY THIS MATTERS**: If the data directory can't be written (permissions, a file
/// in the way), the monitor should exit with a clear message.
///
/// **BUG THIS CATCHES**: Would catch if `fern::log_file()` is unwrapped instead of
/// mapped into `MonitorError::Monitor`.
#[test]
fn given_invalid_log_dir_when_opening_log_file_then_returns_monitor_error() {
    // GIVEN: A path under a non-directory
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Opening the log file
    let result = open_log_file(&invalid_dir);

    // THEN: Monitor variant
    let err = result.unwrap_err();
    let err_string = format!("{err:?}");
    assert!(
        err_string.contains("Monitor"),
        "Error should be MonitorError::Monitor variant: {err_string}"
    );
}

/// **VALUE**: Verifies the log file lands in the given directory.
///
/// **WHY THIS MATTERS**: Users are told where to find logs; the file must be there.
///
/// **BUG THIS CATCHES**: Would catch if the file name or join changes.
#[test]
fn given_valid_dir_when_opening_log_file_then_file_created() {
    // GIVEN: A temporary directory
    let temp_dir = tempfile::tempdir().unwrap();

    // WHEN: Opening the log file
    open_log_file(temp_dir.path()).unwrap();

    // THEN: The file exists
    assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
}

/// **VALUE**: Verifies level parsing from `FRAME_LOG_LEVEL` values.
///
/// **WHY THIS MATTERS**: A typo in the variable should fall back to the default rather
/// than silence all logging.
///
/// **BUG THIS CATCHES**: Would catch case-sensitive parsing or a missing fallback.
#[test]
fn given_level_values_when_parsed_then_known_levels_used_and_others_default() {
    // GIVEN / WHEN / THEN
    assert_eq!(parse_level(Some("trace")), LevelFilter::Trace);
    assert_eq!(parse_level(Some(" WARN ")), LevelFilter::Warn);
    assert_eq!(parse_level(Some("off")), LevelFilter::Off);
    assert_eq!(parse_level(Some("loud")), DEFAULT_LOG_LEVEL);
    assert_eq!(parse_level(None), DEFAULT_LOG_LEVEL);
}
