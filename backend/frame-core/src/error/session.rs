use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors returned to callers of the session handle.
///
/// Protocol failures are never returned here; they are published as
/// notifications. These only cover a dead actor and local file access.
#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("Session Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },
}

impl SessionError {
    #[track_caller]
    pub fn closed(message: impl Into<String>) -> Self {
        SessionError::Closed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<IoError> for SessionError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        SessionError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
