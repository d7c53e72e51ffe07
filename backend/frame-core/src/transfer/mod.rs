//! Bulk image transfer over device-furnished TCP endpoints.
//!
//! The control channel only negotiates; the bytes move over a separate TCP
//! connection per transfer. Each transfer owns its socket and its buffer,
//! so any number of them may run side by side.

pub mod codec;
pub mod download;
pub mod upload;

pub use codec::{DownloadHeader, FrameAssembler, TransferFrame, UploadHeader, encode_frame};
pub use download::{Thumbnail, fetch_thumbnail};
pub use upload::push_image;

use crate::error::transfer::TransferError;

use common::{ErrorLocation, RedactedKey};

use std::fmt;
use std::panic::Location;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

/// `ip`/`port` pair the device opens for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEndpoint {
    pub ip: String,
    pub port: u16,
}

impl fmt::Display for TransferEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Endpoint plus the one-time key the device expects in the upload header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub endpoint: TransferEndpoint,
    pub key: RedactedKey,
}

/// Which way bytes were flowing when a transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Upload,
    Download,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Upload => write!(f, "upload"),
            TransferDirection::Download => write!(f, "download"),
        }
    }
}

pub(crate) async fn connect(
    endpoint: &TransferEndpoint,
    connect_timeout: Duration,
) -> Result<TcpStream, TransferError> {
    if endpoint.ip.is_empty() || endpoint.port == 0 {
        return Err(TransferError::endpoint(format!(
            "device sent an unusable endpoint '{endpoint}'"
        )));
    }

    match timeout(
        connect_timeout,
        TcpStream::connect((endpoint.ip.as_str(), endpoint.port)),
    )
    .await
    {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(TransferError::Connect {
            message: format!("connect to {endpoint} failed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        }),
        Err(_) => Err(TransferError::timeout(format!(
            "connect to {endpoint} timed out after {connect_timeout:?}"
        ))),
    }
}
