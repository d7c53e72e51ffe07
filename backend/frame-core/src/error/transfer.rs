use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Failures of a single upload or thumbnail download. Each one aborts only
/// the transfer it belongs to.
#[derive(Debug, ThisError)]
pub enum TransferError {
    #[error("Connect Error: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Header Error: {message} {location}")]
    Header {
        message: String,
        location: ErrorLocation,
    },

    #[error("Truncated Error: received {received} of {expected} bytes {location}")]
    Truncated {
        received: usize,
        expected: usize,
        location: ErrorLocation,
    },

    #[error("Endpoint Error: {message} {location}")]
    Endpoint {
        message: String,
        location: ErrorLocation,
    },
}

impl TransferError {
    #[track_caller]
    pub fn header(message: impl Into<String>) -> Self {
        TransferError::Header {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        TransferError::Timeout {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn endpoint(message: impl Into<String>) -> Self {
        TransferError::Endpoint {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<IoError> for TransferError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        TransferError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for TransferError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        TransferError::Header {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
