use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;
use tokio_tungstenite::tungstenite;

/// Control channel failures: opening the WebSocket, sending frames, or
/// decoding an inbound envelope.
#[derive(Debug, ThisError)]
pub enum ChannelError {
    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Open Error: {message} {location}")]
    NotOpen {
        message: String,
        location: ErrorLocation,
    },

    #[error("Envelope Error: {message} {location}")]
    Envelope {
        message: String,
        location: ErrorLocation,
    },

    #[error("URL Parse Error: {message} {location}")]
    UrlParse {
        message: String,
        location: ErrorLocation,
    },
}

impl ChannelError {
    #[track_caller]
    pub fn envelope(message: impl Into<String>) -> Self {
        ChannelError::Envelope {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_open(message: impl Into<String>) -> Self {
        ChannelError::NotOpen {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for ChannelError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        ChannelError::Envelope {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<tungstenite::Error> for ChannelError {
    #[track_caller]
    fn from(error: tungstenite::Error) -> Self {
        ChannelError::Send {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for ChannelError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        ChannelError::UrlParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
