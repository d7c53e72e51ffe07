use crate::helpers::{
    FakeDevice, WAIT, connect_ready, mock_discovery, next_matching, test_config, wait_for_snapshot,
};

use frame_core::{FrameNotification, FrameSession};

use std::net::Ipv4Addr;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::net::UdpSocket;

async fn ready_session() -> (
    FrameSession,
    tokio::sync::broadcast::Receiver<FrameNotification>,
    FakeDevice,
    wiremock::MockServer,
    TempDir,
) {
    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(rest.address().port(), device.port, dir.path()))
        .unwrap();
    let mut notifications = session.subscribe();
    connect_ready(&session, &mut notifications, &mut device).await;
    (session, notifications, device, rest, dir)
}

/// **VALUE**: Verifies art-mode pushes update the cache and notify.
///
/// **BUG THIS CATCHES**: Would catch the cached flag only following one of the two
/// art-mode events.
#[tokio::test]
async fn given_art_mode_events_when_received_then_cache_and_notification_follow() {
    // GIVEN
    let (session, mut notifications, device, _rest, _dir) = ready_session().await;

    // WHEN / THEN
    device.send_service(json!({ "event": "artmode_status", "value": "off" }));
    next_matching(&mut notifications, |n| *n == FrameNotification::ArtModeChanged(false)).await;
    assert!(!session.snapshot().await.art_mode);

    device.send_service(json!({ "event": "art_mode_changed", "status": "on" }));
    next_matching(&mut notifications, |n| *n == FrameNotification::ArtModeChanged(true)).await;
    assert!(session.snapshot().await.art_mode);
}

/// **VALUE**: Verifies device-info events merge into the REST result.
///
/// **WHY THIS MATTERS**: The REST body has fields the channel event lacks (version,
/// support); both must survive.
#[tokio::test]
async fn given_device_info_event_when_received_then_merged_into_cache() {
    // GIVEN
    let (session, mut notifications, device, _rest, _dir) = ready_session().await;

    // WHEN
    device.send_service(json!({
        "event": "get_device_info",
        "id": "ignored",
        "name": "Renamed Frame",
        "FirmwareVersion": "T-KSM2",
    }));

    // THEN
    let FrameNotification::DeviceInfoUpdated(info) = next_matching(&mut notifications, |n| {
        matches!(n, FrameNotification::DeviceInfoUpdated(_))
    })
    .await
    else {
        unreachable!()
    };
    assert_eq!(info.name(), Some("Renamed Frame"));
    assert_eq!(info.get("FirmwareVersion"), Some(&json!("T-KSM2")));
    assert_eq!(info.get("version"), Some(&json!("2.0.25")));
    assert_eq!(info.get("model"), Some(&json!("QE55LS03")));
    assert!(info.get("id").is_none());

    let snapshot = wait_for_snapshot(&session, |s| s.frame_name() == Some("Renamed Frame")).await;
    assert_eq!(snapshot.device_info, info);
}

/// **VALUE**: Verifies list replies and pushes reach subscribers with decoded payloads.
#[tokio::test]
async fn given_reply_events_when_received_then_matching_notifications() {
    // GIVEN
    let (_session, mut notifications, device, _rest, _dir) = ready_session().await;

    // WHEN
    device.send_service(json!({ "event": "api_version", "version": "4.3.4.0" }));
    device.send_service(json!({
        "event": "content_list",
        "content_list": "[{\"content_id\":\"MY_F0001\"}]",
    }));
    device.send_service(json!({
        "event": "current_artwork",
        "content_id": "MY_F0001",
        "matte_id": "shadowbox_polar",
        "portrait_matte_id": "none",
    }));
    device.send_service(json!({
        "event": "image_list_deleted",
        "content_id_list": "[{\"content_id\":\"MY_F0001\"}]",
    }));
    device.send_service(json!({ "event": "error", "error_code": "-7", "request_data": "{\"request\":\"select_image\"}" }));

    // THEN: In order
    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::ApiVersion("4.3.4.0".to_string())
    );
    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::ContentList(vec![json!({ "content_id": "MY_F0001" })])
    );
    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::CurrentArtwork {
            content_id: "MY_F0001".to_string(),
            matte_id: "shadowbox_polar".to_string(),
            portrait_matte_id: "none".to_string(),
        }
    );
    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::ImagesDeleted(vec!["MY_F0001".to_string()])
    );
    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::DeviceError {
            error_code: "-7".to_string(),
            request: json!({ "request": "select_image" }),
        }
    );
}

/// **VALUE**: Verifies unknown tags and malformed frames leave state alone and
/// do not break the channel.
///
/// **BUG THIS CATCHES**: Would catch a parse error tearing the channel down, or an
/// unknown tag being merged into the device cache.
#[tokio::test]
async fn given_unknown_and_malformed_frames_when_received_then_state_unchanged() {
    // GIVEN
    let (session, mut notifications, device, _rest, _dir) = ready_session().await;
    let before = session.snapshot().await;

    // WHEN
    device.send_raw("{this is not json");
    device.send_raw(json!({ "event": "d2d_service_message", "data": "{broken" }).to_string());
    device.send_service(json!({ "event": "slideshow_status", "value": "off", "name": "nope" }));

    // THEN: The unknown tag is surfaced raw, nothing for the malformed ones
    let FrameNotification::Raw { event, data } = next_matching(&mut notifications, |_| true).await
    else {
        panic!("expected the unknown tag first");
    };
    assert_eq!(event, "slideshow_status");
    assert_eq!(data["value"], "off");

    // And the channel still works afterwards
    device.send_service(json!({ "event": "api_version", "version": "1" }));
    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::ApiVersion("1".to_string())
    );
    let after = session.snapshot().await;
    assert_eq!(after, before);
}

/// **VALUE**: Verifies commands are encoded with their parameters and the session id.
#[tokio::test]
async fn given_ready_session_when_commands_issued_then_device_receives_them_in_order() {
    // GIVEN
    let (session, _notifications, mut device, _rest, _dir) = ready_session().await;

    // WHEN
    session.set_art_mode_status(false).unwrap();
    session.change_matte("MY_F0001", "flexible_apricot").unwrap();
    session.delete_image("MY_F0002").unwrap();
    session.get_photo_filter_list().unwrap();
    session.get_current_artwork().unwrap();

    // THEN
    let request = device.next_request().await;
    assert_eq!(request["request"], "set_artmode_status");
    assert_eq!(request["value"], "off");
    assert_eq!(request["id"], session.session_id());

    let request = device.next_request().await;
    assert_eq!(request["request"], "change_matte");
    assert_eq!(request["matte_id"], "flexible_apricot");

    let request = device.next_request().await;
    assert_eq!(request["content_id_list"], json!([{ "content_id": "MY_F0002" }]));

    assert_eq!(device.next_request().await["request"], "get_photo_filter_list");
    assert_eq!(device.next_request().await["request"], "get_current_artwork");
    device.assert_no_request(Duration::from_millis(100)).await;
}

/// **VALUE**: Verifies an uncategorized image-added event selects the image and
/// reports the upload as finished.
///
/// **WHY THIS MATTERS**: This is how the user sees their upload on the TV right away.
#[tokio::test]
async fn given_uncategorized_image_added_when_received_then_selected_and_upload_finished() {
    // GIVEN
    let (_session, mut notifications, mut device, _rest, _dir) = ready_session().await;

    // WHEN
    device.send_service(json!({ "event": "image_added", "content_id": "MY_F0042", "category_id": "" }));

    // THEN
    next_matching(&mut notifications, |n| {
        *n == FrameNotification::UploadFinished {
            content_id: "MY_F0042".to_string(),
        }
    })
    .await;
    let request = device.next_request().await;
    assert_eq!(request["request"], "select_image");
    assert_eq!(request["content_id"], "MY_F0042");
    assert_eq!(request["show"], true);

}

/// **VALUE**: Verifies an image added to a category is neither selected nor reported
/// as a finished upload.
///
/// **WHY THIS MATTERS**: Categorized adds come from the TV's own library changes.
/// Selecting them would switch the displayed art behind the user's back.
///
/// **BUG THIS CATCHES**: Would catch the category check being dropped so every add
/// is treated as our upload.
#[tokio::test]
async fn given_categorized_image_added_when_received_then_no_select_and_no_upload_finished() {
    // GIVEN
    let (_session, mut notifications, mut device, _rest, _dir) = ready_session().await;

    // WHEN: A categorized add, followed by an art-mode push as a marker
    device.send_service(json!({ "event": "image_added", "content_id": "SAM-1", "category_id": "MY-C0004" }));
    device.send_service(json!({ "event": "art_mode_changed", "status": "off" }));

    // THEN: The marker is the next notification and no select went out
    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::ArtModeChanged(false)
    );
    device.assert_no_request(Duration::from_millis(200)).await;
}

/// **VALUE**: Verifies a standby push makes the session send a wake packet.
///
/// **WHY THIS MATTERS**: When the frame drops into standby it stops answering the
/// control channel. Waking it right away keeps it reachable.
///
/// **BUG THIS CATCHES**: Would catch `go_to_standby` being ignored or routed to the
/// raw-event fallback.
#[tokio::test]
async fn given_go_to_standby_when_received_then_magic_packet_sent() {
    // GIVEN: Wake datagrams aimed at a local socket
    let wake_listener = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let wake_port = wake_listener.local_addr().unwrap().port();

    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(rest.address().port(), device.port, dir.path());
    config.network.wake_broadcast = Ipv4Addr::LOCALHOST;
    config.network.wake_port = wake_port;

    let session = FrameSession::new(config).unwrap();
    let mut notifications = session.subscribe();
    // No hardware address yet, so connecting sends no wake packet
    connect_ready(&session, &mut notifications, &mut device).await;
    session.set_hardware_address("AA:BB:CC:DD:EE:FF").unwrap();
    wait_for_snapshot(&session, |s| s.target.mac_address == "AA:BB:CC:DD:EE:FF").await;

    // WHEN
    device.send_service(json!({ "event": "go_to_standby" }));

    // THEN: One magic packet: 6 x 0xFF, then the address 16 times
    let mut buffer = [0u8; 256];
    let (received, _) = tokio::time::timeout(WAIT, wake_listener.recv_from(&mut buffer))
        .await
        .expect("no wake packet")
        .unwrap();
    assert_eq!(received, 102);
    assert!(buffer[..6].iter().all(|b| *b == 0xFF));
    assert_eq!(&buffer[6..12], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    assert_eq!(&buffer[96..102], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
}

/// **VALUE**: Verifies transport-level errors and rejections reach subscribers.
#[tokio::test]
async fn given_transport_errors_when_received_then_notified() {
    let (_session, mut notifications, device, _rest, _dir) = ready_session().await;

    device.send_raw(json!({ "event": "ms.error", "data": { "message": "channel gone" } }).to_string());
    device.send_event("ms.channel.unauthorized");

    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::ChannelError {
            message: "channel gone".to_string()
        }
    );
    assert_eq!(
        next_matching(&mut notifications, |_| true).await,
        FrameNotification::Unauthorized
    );
}
