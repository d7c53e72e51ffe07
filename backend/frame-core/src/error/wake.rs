use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum WakeError {
    #[error("Socket Error: {message} {location}")]
    Socket {
        message: String,
        location: ErrorLocation,
    },
}

impl From<IoError> for WakeError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        WakeError::Socket {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
