use crate::helpers::{
    DEVICE_HOST, FakeDevice, closed_port, connect_ready, mock_discovery, next_matching,
    test_config, wait_for_snapshot,
};

use frame_core::channel::ChannelState;
use frame_core::{FrameNotification, FrameSession, SessionPhase};

use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: Verifies a full connect: discovery, channel handshake, ready, follow-up requests.
///
/// **WHY THIS MATTERS**: This is the path every session takes before anything else works.
///
/// **BUG THIS CATCHES**: Would catch the channel opening before discovery finishes, a
/// missing follow-up request, or requests stamped with a different id than the session's.
#[tokio::test]
async fn given_reachable_device_when_connect_then_ready_with_follow_up_requests() {
    // GIVEN
    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(rest.address().port(), device.port, dir.path()))
        .unwrap();
    let mut notifications = session.subscribe();

    // WHEN
    session.set_client_name("Test Remote").unwrap();
    session.set_target_address(DEVICE_HOST).unwrap();
    session.connect().unwrap();

    // THEN: Discovery result is published before the channel is ready
    let FrameNotification::DeviceInfoUpdated(info) = next_matching(&mut notifications, |n| {
        matches!(n, FrameNotification::DeviceInfoUpdated(_))
    })
    .await
    else {
        unreachable!()
    };
    assert_eq!(info.name(), Some("Test Frame"));

    let uri = device.handshake_uri().await;
    assert!(uri.starts_with("/api/v2/channels/com.samsung.art-app?"), "{uri}");
    assert!(uri.contains("name=Test+Remote") || uri.contains("name=Test%20Remote"), "{uri}");

    let snapshot = wait_for_snapshot(&session, |s| s.is_connected()).await;
    assert_eq!(snapshot.phase, SessionPhase::AwaitingChannel);
    assert!(snapshot.is_connecting());

    device.send_event("ms.channel.ready");
    next_matching(&mut notifications, |n| {
        *n == FrameNotification::ConnectionChanged(true)
    })
    .await;

    for expected in ["get_api_version", "get_device_info", "get_artmode_status"] {
        let request = device.next_request().await;
        assert_eq!(request["request"], expected);
        assert_eq!(request["id"], session.session_id());
    }

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    assert!(!snapshot.is_connecting());
    assert_eq!(snapshot.frame_name(), Some("Test Frame"));
    assert!(snapshot.has_frame_tv_support());
    assert!(snapshot.art_mode);
}

/// **VALUE**: Verifies repeated connect calls issue exactly one discovery request.
///
/// **WHY THIS MATTERS**: UI code calls connect on every "retry" click. Parallel
/// attempts would open two channels and double every notification.
///
/// **BUG THIS CATCHES**: Would catch a missing phase guard in connect.
#[tokio::test]
async fn given_connect_in_progress_when_connect_again_then_single_discovery() {
    // GIVEN
    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(rest.address().port(), device.port, dir.path()))
        .unwrap();
    let mut notifications = session.subscribe();

    // WHEN: connect twice back to back, then once more when ready
    session.set_target_address(DEVICE_HOST).unwrap();
    session.connect().unwrap();
    session.connect().unwrap();
    wait_for_snapshot(&session, |s| s.is_connected()).await;
    device.send_event("ms.channel.ready");
    next_matching(&mut notifications, |n| {
        *n == FrameNotification::ConnectionChanged(true)
    })
    .await;
    session.connect().unwrap();

    // THEN: Commands after the extra connect still flow on the same channel
    session.get_matte_list().unwrap();
    let mut requests = Vec::new();
    for _ in 0..4 {
        requests.push(device.next_request().await["request"].clone());
    }
    assert_eq!(requests[3], "get_matte_list");

    rest.verify().await;
}

/// **VALUE**: Verifies connect without an address waits for one instead of failing.
///
/// **WHY THIS MATTERS**: The host may only learn the address later (config load,
/// user input) after the user already asked to connect.
#[tokio::test]
async fn given_no_address_when_connect_then_latched_until_address_set() {
    // GIVEN
    let rest = mock_discovery(1).await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(
        rest.address().port(),
        closed_port().await,
        dir.path(),
    ))
    .unwrap();
    let mut notifications = session.subscribe();

    // WHEN
    session.connect().unwrap();
    let snapshot = wait_for_snapshot(&session, |s| s.wants_connect).await;
    assert_eq!(snapshot.phase, SessionPhase::Disconnected);

    session.set_target_address(DEVICE_HOST).unwrap();

    // THEN: Discovery runs once, the (closed) channel port then fails the attempt
    next_matching(&mut notifications, |n| {
        matches!(n, FrameNotification::DeviceInfoUpdated(_))
    })
    .await;
    next_matching(&mut notifications, |n| {
        matches!(n, FrameNotification::ChannelError { .. })
    })
    .await;

    let snapshot = wait_for_snapshot(&session, |s| s.phase == SessionPhase::Disconnected).await;
    assert!(!snapshot.wants_connect);
    assert!(!snapshot.is_connected());
    rest.verify().await;
}

/// **VALUE**: Verifies a failed discovery aborts the attempt and allows a new one.
///
/// **BUG THIS CATCHES**: Would catch the session staying stuck in Connecting after an
/// HTTP error, refusing every later connect.
#[tokio::test]
async fn given_discovery_error_when_connect_then_failed_notification_and_retry_allowed() {
    // GIVEN
    let rest = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("standby"))
        .expect(2)
        .mount(&rest)
        .await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(
        rest.address().port(),
        closed_port().await,
        dir.path(),
    ))
    .unwrap();
    let mut notifications = session.subscribe();
    session.set_target_address(DEVICE_HOST).unwrap();

    for _ in 0..2 {
        // WHEN
        session.connect().unwrap();

        // THEN
        let FrameNotification::DiscoveryFailed { message } =
            next_matching(&mut notifications, |n| {
                matches!(n, FrameNotification::DiscoveryFailed { .. })
            })
            .await
        else {
            unreachable!()
        };
        assert!(message.contains("503"), "{message}");
        wait_for_snapshot(&session, |s| s.phase == SessionPhase::Disconnected).await;
    }

    rest.verify().await;
}

/// **VALUE**: Verifies disconnect closes the channel and forgets device state.
///
/// **BUG THIS CATCHES**: Would catch stale device info (e.g. the frame name) still
/// showing after the user disconnected.
#[tokio::test]
async fn given_ready_session_when_disconnect_then_state_reset_and_notified() {
    // GIVEN
    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(rest.address().port(), device.port, dir.path()))
        .unwrap();
    let mut notifications = session.subscribe();
    connect_ready(&session, &mut notifications, &mut device).await;
    device.send_service(serde_json::json!({ "event": "artmode_status", "value": "off" }));
    wait_for_snapshot(&session, |s| !s.art_mode).await;

    // WHEN
    session.disconnect().unwrap();

    // THEN
    next_matching(&mut notifications, |n| {
        *n == FrameNotification::ConnectionChanged(false)
    })
    .await;
    let snapshot = wait_for_snapshot(&session, |s| s.phase == SessionPhase::Disconnected).await;
    assert_eq!(snapshot.channel, ChannelState::Closed);
    assert!(snapshot.device_info.is_empty());
    assert!(snapshot.art_mode);
    assert_eq!(snapshot.frame_name(), None);
}

/// **VALUE**: Verifies a device-side close is reported and leaves the session reconnectable.
#[tokio::test]
async fn given_ready_session_when_device_closes_then_disconnected() {
    // GIVEN
    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(rest.address().port(), device.port, dir.path()))
        .unwrap();
    let mut notifications = session.subscribe();
    connect_ready(&session, &mut notifications, &mut device).await;

    // WHEN
    device.close();

    // THEN
    next_matching(&mut notifications, |n| {
        *n == FrameNotification::ConnectionChanged(false)
    })
    .await;
    let snapshot = wait_for_snapshot(&session, |s| s.phase == SessionPhase::Disconnected).await;
    assert!(!snapshot.is_connected());

    // Requests while closed are dropped, not queued
    session.get_content_list().unwrap();
    device.assert_no_request(Duration::from_millis(200)).await;
}

/// **VALUE**: Verifies the session id is stable and unique per session.
#[tokio::test]
async fn given_two_sessions_when_ids_compared_then_stable_and_distinct() {
    let dir = TempDir::new().unwrap();
    let a = FrameSession::new(test_config(1, 1, dir.path())).unwrap();
    let b = FrameSession::new(test_config(1, 1, dir.path())).unwrap();

    assert_eq!(a.session_id(), a.clone().session_id());
    assert_ne!(a.session_id(), b.session_id());
    assert_eq!(a.session_id().len(), 36);
}
