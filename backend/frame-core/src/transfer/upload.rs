use crate::error::transfer::TransferError;
use crate::transfer::codec::{UploadHeader, encode_frame};
use crate::transfer::{UploadTicket, connect};

use std::time::Duration;

use log::{debug, info};
use tokio::io::AsyncWriteExt;

/// Push one image to the endpoint from a `ready_to_use` event.
///
/// Writes the framed header and the payload, then shuts the write half
/// down. Nothing is read back: the device confirms with an `image_added`
/// event on the control channel.
///
/// # Returns
///
/// Number of bytes written, prefix and header included.
pub async fn push_image(
    ticket: &UploadTicket,
    payload: &[u8],
    connect_timeout: Duration,
) -> Result<usize, TransferError> {
    let header = UploadHeader::single_part(payload.len(), &ticket.key);
    let frame = encode_frame(&header, payload)?;

    let mut stream = connect(&ticket.endpoint, connect_timeout).await?;
    debug!(
        "Connected to {} for upload ({} payload bytes, key {} chars)",
        ticket.endpoint,
        payload.len(),
        ticket.key.len()
    );

    stream.write_all(&frame).await?;
    stream.flush().await?;
    stream.shutdown().await?;

    info!("Uploaded {} bytes to {}", payload.len(), ticket.endpoint);
    Ok(frame.len())
}
