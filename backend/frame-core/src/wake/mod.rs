//! Wake-on-LAN for a device that is in standby.
//!
//! Best-effort and fire-and-forget: nothing is ever read back, and an
//! address that doesn't normalize to six bytes simply produces no datagram.

use crate::error::wake::WakeError;

use std::net::{Ipv4Addr, SocketAddr};

use log::{debug, trace};
use tokio::net::UdpSocket;

pub const MAGIC_PACKET_LEN: usize = 102;

const SYNC_STREAM_LEN: usize = 6;
const ADDRESS_REPEATS: usize = 16;

/// Reduce a hardware address to its six bytes.
///
/// Every non-hex character is discarded first, so `AA:BB:CC:DD:EE:FF`,
/// `aa-bb-cc-dd-ee-ff` and `aabb.ccdd.eeff` all normalize the same way.
/// Returns `None` unless exactly 12 hex digits remain.
pub fn normalize_hardware_address(address: &str) -> Option<[u8; 6]> {
    let digits: Vec<u8> = address
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();

    if digits.len() != 12 {
        return None;
    }

    let mut bytes = [0u8; 6];
    for (byte, pair) in bytes.iter_mut().zip(digits.chunks_exact(2)) {
        *byte = (pair[0] << 4) | pair[1];
    }
    Some(bytes)
}

/// Build the 102-byte magic packet: six `0xFF` then the address sixteen times.
pub fn magic_packet(address: &str) -> Option<[u8; MAGIC_PACKET_LEN]> {
    let mac = normalize_hardware_address(address)?;

    let mut packet = [0xFFu8; MAGIC_PACKET_LEN];
    for repeat in 0..ADDRESS_REPEATS {
        let start = SYNC_STREAM_LEN + repeat * mac.len();
        packet[start..start + mac.len()].copy_from_slice(&mac);
    }
    Some(packet)
}

/// Broadcast a magic packet for `address` to `target`.
///
/// # Returns
///
/// * `Ok(true)` - the datagram was handed to the OS
/// * `Ok(false)` - the address did not normalize, nothing was sent
///
/// # Errors
///
/// Returns [`WakeError::Socket`] if the socket can't be bound, switched to
/// broadcast, or the send fails.
pub async fn send_wake(address: &str, target: SocketAddr) -> Result<bool, WakeError> {
    let Some(packet) = magic_packet(address) else {
        trace!("Skipping wake: '{address}' is not a 6-byte hardware address");
        return Ok(false);
    };

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;
    let sent = socket.send_to(&packet, target).await?;

    debug!("Sent {sent}-byte wake packet to {target}");
    Ok(true)
}
