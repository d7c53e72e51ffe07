//! Logging for the monitor: colored stdout plus a plain log file.
//!
//! Initialization runs once per process; later calls only warn. The level
//! comes from `FRAME_LOG_LEVEL` when set, otherwise from the build profile.

use crate::error::MonitorError;

use common::ErrorLocation;

use std::env;
use std::fs::File;
use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::str::FromStr;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339_millis;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "frame-monitor.log";
pub const ENV_LOG_LEVEL: &str = "FRAME_LOG_LEVEL";

#[cfg(debug_assertions)]
pub(crate) const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
pub(crate) const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Crates whose internals are only interesting when they warn.
const QUIET_TARGETS: [&str; 5] = [
    "hyper",
    "hyper_util",
    "reqwest",
    "tungstenite",
    "tokio_tungstenite",
];

/// `FRAME_LOG_LEVEL` if it names a level, else the build default.
pub fn level_from_env() -> LevelFilter {
    parse_level(env::var(ENV_LOG_LEVEL).ok().as_deref())
}

pub(crate) fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// Initialize stdout and `<log_dir>/frame-monitor.log` logging.
///
/// Safe to call more than once; only the first call configures anything.
///
/// # Errors
///
/// Returns [`MonitorError::Monitor`] if the log file can't be opened or a
/// global logger is already installed by someone else.
pub fn initialize(log_dir: &Path, level: LevelFilter) -> Result<(), MonitorError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let mut result = Ok(());
    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, level);
        if result.is_ok() {
            info!(
                "Logging at {level:?} to {}",
                log_dir.join(LOG_FILE_NAME).display()
            );
        }
    });
    result
}

#[track_caller]
fn initialize_internal(log_dir: &Path, level: LevelFilter) -> Result<(), MonitorError> {
    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let mut base = Dispatch::new().level(level);
    for target in QUIET_TARGETS {
        base = base.level_for(target, LevelFilter::Warn);
    }

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}] {message} {}",
                format_rfc3339_millis(SystemTime::now()),
                colors.color(record.level()),
                origin(record),
            ))
        })
        .chain(stdout());

    let log_file = open_log_file(log_dir)?;

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {message} {}",
                format_rfc3339_millis(SystemTime::now()),
                record.level(),
                origin(record),
            ))
        })
        .chain(log_file);

    base.chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| MonitorError::Monitor {
            message: format!("Failed to install logger: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

#[track_caller]
pub(crate) fn open_log_file(log_dir: &Path) -> Result<File, MonitorError> {
    fern::log_file(log_dir.join(LOG_FILE_NAME)).map_err(|e| MonitorError::Monitor {
        message: format!("Failed to open log file in {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn origin(record: &Record<'_>) -> String {
    format!(
        "[{}:{}]",
        record.file().unwrap_or(record.target()),
        record.line().unwrap_or(0)
    )
}
