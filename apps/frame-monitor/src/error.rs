use common::ErrorLocation;

use frame_core::error::CoreError;
use frame_core::error::config::ConfigError;
use frame_core::error::session::SessionError;

use std::panic::Location;

use thiserror::Error;

/// Errors that stop the monitor from starting or running.
///
/// Engine errors are flattened to their message; the location is where the
/// monitor received them.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Error from this app
    #[error("Monitor Error: {message} {location}")]
    Monitor {
        message: String,
        location: ErrorLocation,
    },

    /// Config file could not be loaded, validated or saved
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Error from frame-core (session start, closed actor)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl MonitorError {
    #[track_caller]
    pub fn monitor(message: impl Into<String>) -> Self {
        MonitorError::Monitor {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for MonitorError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        MonitorError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for MonitorError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Config(error) => MonitorError::from(error),
            other => MonitorError::Core {
                message: other.to_string(),
                location: ErrorLocation::from(Location::caller()),
            },
        }
    }
}

impl From<SessionError> for MonitorError {
    #[track_caller]
    fn from(error: SessionError) -> Self {
        MonitorError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
