//! Where the monitor keeps its config and logs.
//!
//! Lookup order for the config directory:
//! 1. `FRAME_CONFIG_DIR` (explicit override)
//! 2. Platform config directory via `dirs`, plus `frame-monitor`
//!
//! Logs go to a `logs` directory inside the platform's local data dir, or
//! inside the overridden config dir.

use crate::error::MonitorError;

use std::env;
use std::fmt;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use log::info;

pub const APP_DIR_NAME: &str = "frame-monitor";
pub const ENV_CONFIG_DIR: &str = "FRAME_CONFIG_DIR";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorPaths {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub source: PathSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    EnvVar,
    PlatformDefault,
}

impl fmt::Display for PathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSource::EnvVar => write!(f, "{ENV_CONFIG_DIR}"),
            PathSource::PlatformDefault => write!(f, "platform default"),
        }
    }
}

/// Resolve config and log directories from the environment.
///
/// # Errors
///
/// Returns [`MonitorError::Monitor`] if there is no override and the
/// platform has no config directory.
pub fn resolve() -> Result<MonitorPaths, MonitorError> {
    if let Some(custom) = env::var_os(ENV_CONFIG_DIR).filter(|v| !v.is_empty()) {
        return Ok(from_override(Path::new(&custom)));
    }

    let config_dir = dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| {
            MonitorError::monitor(format!(
                "No platform config directory; set {ENV_CONFIG_DIR}"
            ))
        })?;
    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(LOG_DIR_NAME))
        .unwrap_or_else(|| config_dir.join(LOG_DIR_NAME));

    Ok(MonitorPaths {
        config_dir,
        log_dir,
        source: PathSource::PlatformDefault,
    })
}

/// Paths rooted at an explicit directory.
pub fn from_override(dir: &Path) -> MonitorPaths {
    MonitorPaths {
        config_dir: dir.to_path_buf(),
        log_dir: dir.join(LOG_DIR_NAME),
        source: PathSource::EnvVar,
    }
}

impl MonitorPaths {
    /// Create both directories if missing.
    pub fn ensure_exist(&self) -> Result<(), MonitorError> {
        for dir in [&self.config_dir, &self.log_dir] {
            create_dir_all(dir).map_err(|e| {
                MonitorError::monitor(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }
        info!(
            "Using config dir {} ({})",
            self.config_dir.display(),
            self.source
        );
        Ok(())
    }
}
