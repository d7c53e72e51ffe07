// Unit tests for the wake signal
// Hardware address normalization and magic packet layout

use crate::wake::{MAGIC_PACKET_LEN, magic_packet, normalize_hardware_address, send_wake};

use std::net::{Ipv4Addr, SocketAddr};

const ADDRESS_BYTES: [u8; 6] = [0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22];

/// **VALUE**: Verifies every common MAC separator style normalizes to the same bytes.
///
/// **WHY THIS MATTERS**: Users paste addresses from router pages, `ip link` output
/// and TV menus. Each uses a different separator.
///
/// **BUG THIS CATCHES**: Would catch a normalizer that only strips `:` and rejects
/// dashes, dots or mixed case.
#[test]
fn given_separated_addresses_when_normalized_then_yield_same_bytes() {
    for address in [
        "aa:bb:cc:00:11:22",
        "AA-BB-CC-00-11-22",
        "aabb.cc00.1122",
        "AABBCC001122",
        " aa:bb:cc:00:11:22 ",
    ] {
        assert_eq!(
            normalize_hardware_address(address),
            Some(ADDRESS_BYTES),
            "failed for {address:?}"
        );
    }
}

/// **VALUE**: Verifies anything other than exactly 12 hex digits is rejected.
///
/// **BUG THIS CATCHES**: Would catch truncation or zero-padding of short addresses,
/// which would wake nothing while looking successful.
#[test]
fn given_wrong_length_addresses_when_normalized_then_none() {
    assert_eq!(normalize_hardware_address(""), None);
    assert_eq!(normalize_hardware_address("aa:bb:cc:00:11"), None);
    assert_eq!(normalize_hardware_address("aa:bb:cc:00:11:22:33"), None);
    assert_eq!(normalize_hardware_address("not a mac"), None);
}

/// **VALUE**: Verifies the 102-byte magic packet layout.
///
/// **WHY THIS MATTERS**: NICs match this exact pattern in hardware; one misplaced
/// byte and the TV stays asleep.
#[test]
fn given_valid_address_when_magic_packet_built_then_sync_stream_then_sixteen_repeats() {
    // GIVEN / WHEN
    let packet = magic_packet("aa:bb:cc:00:11:22").unwrap();

    // THEN
    assert_eq!(packet.len(), MAGIC_PACKET_LEN);
    assert_eq!(&packet[..6], &[0xFF; 6]);
    for chunk in packet[6..].chunks(6) {
        assert_eq!(chunk, &ADDRESS_BYTES);
    }
    assert_eq!(packet[6..].chunks(6).count(), 16);
}

/// **VALUE**: Verifies an unusable address is a silent no-op, not an error.
///
/// **BUG THIS CATCHES**: Would catch `send_wake` surfacing an error (and so failing
/// a connect) just because no MAC was configured.
#[tokio::test]
async fn given_invalid_address_when_send_wake_then_reports_not_sent() {
    let target = SocketAddr::from((Ipv4Addr::LOCALHOST, 9));

    let sent = send_wake("", target).await.unwrap();

    assert!(!sent);
}

/// **VALUE**: Verifies a valid address produces exactly one datagram with the packet.
#[tokio::test]
async fn given_valid_address_when_send_wake_then_listener_receives_packet() {
    // GIVEN: A UDP listener on loopback
    let listener = tokio::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let target = listener.local_addr().unwrap();

    // WHEN
    let sent = send_wake("AA-BB-CC-00-11-22", target).await.unwrap();

    // THEN
    assert!(sent);
    let mut buf = [0u8; 256];
    let (len, _) = listener.recv_from(&mut buf).await.unwrap();
    assert_eq!(len, MAGIC_PACKET_LEN);
    assert_eq!(&buf[..len], &magic_packet("aabbcc001122").unwrap()[..]);
}
