use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

/// Failures of the REST discovery step. Any of these aborts the connection attempt.
#[derive(Debug, ThisError)]
pub enum DiscoveryError {
    #[error("Request Error: {message} {location}")]
    Request {
        message: String,
        is_timeout: bool,
        is_connection: bool,
        location: ErrorLocation,
    },

    #[error("HTTP Error: {status_code} - {message} {location}")]
    Http {
        status_code: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },

    #[error("Payload Error: {message} {location}")]
    Payload {
        message: String,
        location: ErrorLocation,
    },

    #[error("URL Parse Error: {message} {location}")]
    UrlParse {
        message: String,
        location: ErrorLocation,
    },
}

impl DiscoveryError {
    #[track_caller]
    pub fn payload(message: impl Into<String>) -> Self {
        DiscoveryError::Payload {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn http(status_code: u16, body: impl Into<String>) -> Self {
        DiscoveryError::Http {
            status_code: HttpStatusCode(status_code),
            message: body.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Short category name for log lines and notifications.
    pub fn error_category(&self) -> &'static str {
        match self {
            DiscoveryError::Request {
                is_timeout: true, ..
            } => "timeout",
            DiscoveryError::Request {
                is_connection: true,
                ..
            } => "connection",
            DiscoveryError::Request { .. } => "request",
            DiscoveryError::Http { status_code, .. } if status_code.is_client_error() => {
                "client_error"
            }
            DiscoveryError::Http { status_code, .. } if status_code.is_server_error() => {
                "server_error"
            }
            DiscoveryError::Http { .. } => "http",
            DiscoveryError::Payload { .. } => "payload",
            DiscoveryError::UrlParse { .. } => "url",
        }
    }
}

impl From<reqwest::Error> for DiscoveryError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        // Check the category before the error is flattened into a string
        let is_timeout = error.is_timeout();
        let is_connection = error.is_connect();

        if let Some(status) = error.status() {
            return DiscoveryError::Http {
                status_code: HttpStatusCode(status.as_u16()),
                message: error.to_string(),
                location: ErrorLocation::from(Location::caller()),
            };
        }

        DiscoveryError::Request {
            message: error.to_string(),
            is_timeout,
            is_connection,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for DiscoveryError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        DiscoveryError::Payload {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for DiscoveryError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        DiscoveryError::UrlParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
