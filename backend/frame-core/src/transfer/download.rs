use crate::error::transfer::TransferError;
use crate::transfer::codec::{DownloadHeader, FrameAssembler, TransferFrame};
use crate::transfer::{TransferEndpoint, connect};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

const READ_CHUNK_LEN: usize = 16 * 1024;

/// A thumbnail written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub content_id: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Read one thumbnail frame from `endpoint` and save it under `dir`.
///
/// Reads accumulate until the whole `4 + headerLength + fileLength` bytes
/// are buffered. Each read waits at most `read_timeout`.
///
/// # Errors
///
/// - [`TransferError::Connect`] / [`TransferError::Timeout`] - endpoint unreachable or stalled
/// - [`TransferError::Truncated`] - device closed the socket before the frame completed
/// - [`TransferError::Header`] - header JSON unusable
/// - [`TransferError::Io`] - read or file write failure
pub async fn fetch_thumbnail(
    endpoint: &TransferEndpoint,
    dir: &Path,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Thumbnail, TransferError> {
    let mut stream = connect(endpoint, connect_timeout).await?;
    debug!("Connected to {endpoint} for thumbnail download");

    let mut assembler = FrameAssembler::<DownloadHeader>::new();
    let mut chunk = vec![0u8; READ_CHUNK_LEN];

    let frame = loop {
        let read = timeout(read_timeout, stream.read(&mut chunk))
            .await
            .map_err(|_| {
                TransferError::timeout(format!(
                    "no data from {endpoint} for {read_timeout:?} ({} bytes buffered)",
                    assembler.buffered()
                ))
            })??;

        if read == 0 {
            return Err(TransferError::Truncated {
                received: assembler.buffered(),
                expected: assembler.expected_len().unwrap_or(0),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        assembler.extend(&chunk[..read]);
        if let Some(frame) = assembler.try_decode()? {
            break frame;
        }
    };

    // The device doesn't wait for anything after the payload
    let _ = stream.shutdown().await;

    let thumbnail = save_thumbnail(dir, frame).await?;
    info!(
        "Saved thumbnail {} ({} bytes) to {}",
        thumbnail.content_id,
        thumbnail.size,
        thumbnail.path.display()
    );
    Ok(thumbnail)
}

/// Write a decoded frame to `<dir>/<fileID>.<ext>`.
pub async fn save_thumbnail(
    dir: &Path,
    frame: TransferFrame<DownloadHeader>,
) -> Result<Thumbnail, TransferError> {
    let TransferFrame { header, payload } = frame;

    let content_id = header.file_id.trim();
    let extension = header.extension();
    for (field, value) in [("fileID", content_id), ("fileType", extension)] {
        if value.is_empty()
            || value.contains(['/', '\\'])
            || value.contains("..")
        {
            return Err(TransferError::header(format!(
                "unusable {field} '{value}' in thumbnail header"
            )));
        }
    }

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{content_id}.{extension}"));
    tokio::fs::write(&path, &payload).await?;

    Ok(Thumbnail {
        content_id: content_id.to_string(),
        path,
        size: payload.len(),
    })
}
