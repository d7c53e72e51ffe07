//! Length-prefixed transfer framing.
//!
//! ```text
//! [header length: u32 BE][header: JSON, header-length bytes][payload: fileLength bytes]
//! ```
//!
//! The same layout is used for uploads (we write) and thumbnail downloads
//! (the device writes). Only the header fields differ.

use crate::error::transfer::TransferError;
use crate::json_fields::{lenient_string, lenient_u64};

use common::RedactedKey;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const LENGTH_PREFIX_LEN: usize = 4;

/// Upper bound for a declared header length. Anything larger is a corrupt
/// prefix rather than a header we should wait for.
pub const MAX_HEADER_LEN: usize = 1024 * 1024;

/// Upper bound for a declared payload length on a frame we receive.
pub const MAX_PAYLOAD_LEN: u64 = 256 * 1024 * 1024;

pub const UPLOAD_FILE_NAME: &str = "frame-remote-upload";
pub const UPLOAD_FILE_TYPE: &str = "jpg";
pub const UPLOAD_PROTOCOL_VERSION: &str = "0.0.1";

/// A header that declares how many payload bytes follow it.
pub trait TransferHeader: DeserializeOwned {
    /// Declared payload length as sent on the wire.
    fn file_length(&self) -> u64;
}

/// Header the engine writes in front of an uploaded image.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadHeader {
    pub num: u32,
    pub total: u32,
    #[serde(deserialize_with = "lenient_u64")]
    pub file_length: u64,
    pub file_name: String,
    pub file_type: String,
    pub sec_key: String,
    pub version: String,
}

impl UploadHeader {
    /// Header for a single-part upload of `file_length` bytes.
    pub fn single_part(file_length: usize, key: &RedactedKey) -> Self {
        Self {
            num: 0,
            total: 1,
            file_length: file_length as u64,
            file_name: UPLOAD_FILE_NAME.to_string(),
            file_type: UPLOAD_FILE_TYPE.to_string(),
            sec_key: key.expose().to_string(),
            version: UPLOAD_PROTOCOL_VERSION.to_string(),
        }
    }
}

impl fmt::Debug for UploadHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadHeader")
            .field("num", &self.num)
            .field("total", &self.total)
            .field("file_length", &self.file_length)
            .field("file_name", &self.file_name)
            .field("file_type", &self.file_type)
            .field("sec_key", &"[REDACTED]")
            .field("version", &self.version)
            .finish()
    }
}

impl TransferHeader for UploadHeader {
    fn file_length(&self) -> u64 {
        self.file_length
    }
}

/// Header the device sends in front of a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadHeader {
    #[serde(rename = "fileName", default, deserialize_with = "lenient_string")]
    pub file_name: String,
    #[serde(rename = "fileType", default, deserialize_with = "lenient_string")]
    pub file_type: String,
    #[serde(rename = "fileID", deserialize_with = "lenient_string")]
    pub file_id: String,
    #[serde(rename = "fileLength", deserialize_with = "lenient_u64")]
    pub file_length: u64,
}

impl DownloadHeader {
    /// File extension for the saved thumbnail. `jpeg` is folded into `jpg`.
    pub fn extension(&self) -> &str {
        match self.file_type.as_str() {
            "jpeg" | "JPEG" => "jpg",
            other => other,
        }
    }
}

impl TransferHeader for DownloadHeader {
    fn file_length(&self) -> u64 {
        self.file_length
    }
}

/// A decoded header together with exactly its declared payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferFrame<H> {
    pub header: H,
    pub payload: Vec<u8>,
}

/// Serialize `header` and frame it in front of `payload`.
pub fn encode_frame<H: Serialize>(header: &H, payload: &[u8]) -> Result<Vec<u8>, TransferError> {
    let header_bytes = serde_json::to_vec(header)?;
    if header_bytes.len() > MAX_HEADER_LEN {
        return Err(TransferError::header(format!(
            "header is {} bytes (max {MAX_HEADER_LEN})",
            header_bytes.len()
        )));
    }
    let header_len = header_bytes.len() as u32;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + header_bytes.len() + payload.len());
    frame.extend_from_slice(&header_len.to_be_bytes());
    frame.extend_from_slice(&header_bytes);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Accumulates the bytes of one transfer connection until a full frame is
/// buffered.
///
/// Lives for exactly one socket. Yields at most one frame: once
/// [`try_decode`](Self::try_decode) has returned `Some`, it only returns
/// `None` afterwards.
#[derive(Debug)]
struct DecodedHeader<H> {
    header: H,
    payload_start: usize,
    total: usize,
}

#[derive(Debug)]
pub struct FrameAssembler<H> {
    buffer: Vec<u8>,
    /// Decoded header with the payload start and total frame length.
    header: Option<DecodedHeader<H>>,
    finished: bool,
}

impl<H: TransferHeader> Default for FrameAssembler<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: TransferHeader> FrameAssembler<H> {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            header: None,
            finished: false,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total frame size, once the header has been decoded.
    pub fn expected_len(&self) -> Option<usize> {
        self.header.as_ref().map(|decoded| decoded.total)
    }

    /// Try to cut a complete frame out of the buffer.
    ///
    /// `Ok(None)` means more bytes are needed. The header is decoded as
    /// soon as it is fully buffered and kept, so later calls only compare
    /// lengths.
    ///
    /// # Errors
    ///
    /// [`TransferError::Header`] if the declared header or payload length is
    /// absurd or the header JSON doesn't decode into `H`.
    pub fn try_decode(&mut self) -> Result<Option<TransferFrame<H>>, TransferError> {
        if self.finished {
            return Ok(None);
        }

        if self.header.is_none() {
            if self.buffer.len() < LENGTH_PREFIX_LEN {
                return Ok(None);
            }

            let mut prefix = [0u8; LENGTH_PREFIX_LEN];
            prefix.copy_from_slice(&self.buffer[..LENGTH_PREFIX_LEN]);
            let header_len = u32::from_be_bytes(prefix) as usize;

            if header_len > MAX_HEADER_LEN {
                return Err(TransferError::header(format!(
                    "declared header length {header_len} exceeds {MAX_HEADER_LEN}"
                )));
            }

            let header_end = LENGTH_PREFIX_LEN + header_len;
            if self.buffer.len() < header_end {
                return Ok(None);
            }

            let header: H = serde_json::from_slice(&self.buffer[LENGTH_PREFIX_LEN..header_end])?;
            let total = frame_total(header_end, header.file_length())?;
            self.header = Some(DecodedHeader {
                header,
                payload_start: header_end,
                total,
            });
        }

        let Some(total) = self.expected_len() else {
            return Ok(None);
        };
        if self.buffer.len() < total {
            return Ok(None);
        }

        let Some(decoded) = self.header.take() else {
            return Ok(None);
        };
        let Some(payload) = self.buffer.get(decoded.payload_start..decoded.total) else {
            return Err(TransferError::header("frame bounds out of range"));
        };
        let payload = payload.to_vec();
        let header = decoded.header;

        self.finished = true;
        self.buffer.clear();

        Ok(Some(TransferFrame { header, payload }))
    }
}

fn frame_total(header_end: usize, file_length: u64) -> Result<usize, TransferError> {
    if file_length > MAX_PAYLOAD_LEN {
        return Err(TransferError::header(format!(
            "declared payload length {file_length} exceeds {MAX_PAYLOAD_LEN}"
        )));
    }
    usize::try_from(file_length)
        .ok()
        .and_then(|payload_len| header_end.checked_add(payload_len))
        .ok_or_else(|| {
            TransferError::header(format!(
                "declared payload length {file_length} does not fit in memory"
            ))
        })
}
