use crate::helpers::{
    FakeDevice, capture_upload, closed_port, connect_ready, mock_discovery, next_matching, serve_bytewise,
    test_config, thumbnail_frame, wait_for_snapshot,
};

use frame_core::transfer::{FrameAssembler, TransferDirection, UploadHeader};
use frame_core::{FrameNotification, FrameSession};

use serde_json::json;
use tempfile::TempDir;

/// **VALUE**: Verifies the full thumbnail path: request, device push, TCP fetch, file on disk.
///
/// **BUG THIS CATCHES**: Would catch the download landing outside the configured
/// directory or the notification firing before the file is written.
#[tokio::test]
async fn given_thumbnail_event_when_fetched_then_file_saved_and_notified() {
    // GIVEN
    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(rest.address().port(), device.port, dir.path()))
        .unwrap();
    let mut notifications = session.subscribe();
    connect_ready(&session, &mut notifications, &mut device).await;

    let payload: Vec<u8> = (0..300u16).map(|i| (i % 251) as u8).collect();
    let (endpoint, server) = serve_bytewise(thumbnail_frame("SAM-S0700", "jpeg", &payload)).await;

    // WHEN
    session.request_thumbnail("SAM-S0700").unwrap();
    let request = device.next_request().await;
    assert_eq!(request["request"], "get_thumbnail");
    assert_eq!(request["conn_info"]["id"], session.session_id());

    device.send_service(json!({
        "event": "thumbnail",
        "conn_info": json!({ "ip": endpoint.ip, "port": endpoint.port.to_string() }).to_string(),
    }));

    // THEN
    let FrameNotification::ThumbnailReady { content_id, path } =
        next_matching(&mut notifications, |n| {
            matches!(n, FrameNotification::ThumbnailReady { .. })
        })
        .await
    else {
        unreachable!()
    };
    assert_eq!(content_id, "SAM-S0700");
    assert_eq!(path, dir.path().join("SAM-S0700.jpg"));
    assert_eq!(std::fs::read(&path).unwrap(), payload);
    server.await.unwrap();
}

/// **VALUE**: Verifies an unreachable thumbnail endpoint is reported, not fatal.
#[tokio::test]
async fn given_unreachable_thumbnail_endpoint_when_fetched_then_transfer_failed() {
    // GIVEN
    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(rest.address().port(), device.port, dir.path()))
        .unwrap();
    let mut notifications = session.subscribe();
    connect_ready(&session, &mut notifications, &mut device).await;

    let port = closed_port().await;

    // WHEN
    device.send_service(json!({
        "event": "thumbnail",
        "conn_info": { "ip": "127.0.0.1", "port": port },
    }));

    // THEN
    let notification = next_matching(&mut notifications, |n| {
        matches!(n, FrameNotification::TransferFailed { .. })
    })
    .await;
    assert!(matches!(
        notification,
        FrameNotification::TransferFailed {
            direction: TransferDirection::Download,
            ..
        }
    ));
    assert!(session.snapshot().await.is_connected());
}

/// **VALUE**: Verifies an upload is held until `ready_to_use`, then pushed as one frame.
///
/// **WHY THIS MATTERS**: The TV only accepts the bytes on the endpoint it opens after
/// `send_image`; pushing earlier or with the wrong key loses the image.
///
/// **BUG THIS CATCHES**: Would catch a wrong `file_size`, a missing key in the header,
/// or the payload being pushed twice.
#[tokio::test]
async fn given_pending_upload_when_ready_to_use_then_frame_pushed_with_key() {
    // GIVEN
    let rest = mock_discovery(1).await;
    let mut device = FakeDevice::start().await;
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(rest.address().port(), device.port, dir.path()))
        .unwrap();
    let mut notifications = session.subscribe();
    connect_ready(&session, &mut notifications, &mut device).await;

    let image = dir.path().join("upload.jpg");
    let payload = vec![0xFFu8, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4, 5];
    std::fs::write(&image, &payload).unwrap();

    // WHEN: The file is announced
    session.upload_image_file(&image, "none").await.unwrap();
    let request = device.next_request().await;
    assert_eq!(request["request"], "send_image");
    assert_eq!(request["file_size"], payload.len());
    assert_eq!(request["matte_id"], "none");
    wait_for_snapshot(&session, |s| s.upload_pending).await;

    // AND: The device opens the transfer socket
    let (endpoint, upload) = capture_upload().await;
    device.send_service(json!({
        "event": "ready_to_use",
        "conn_info": json!({ "ip": endpoint.ip, "port": endpoint.port, "key": "k-123" }).to_string(),
    }));

    // THEN
    let received = upload.await.unwrap();
    let mut assembler = FrameAssembler::<UploadHeader>::new();
    assembler.extend(&received);
    let frame = assembler.try_decode().unwrap().unwrap();
    assert_eq!(frame.header.sec_key, "k-123");
    assert_eq!(frame.header.file_length, payload.len() as u64);
    assert_eq!(frame.header.num, 0);
    assert_eq!(frame.header.total, 1);
    assert_eq!(frame.payload, payload);

    let snapshot = wait_for_snapshot(&session, |s| !s.upload_pending).await;
    assert!(snapshot.is_connected());
}

/// **VALUE**: Verifies a missing upload file is reported to the caller.
#[tokio::test]
async fn given_missing_file_when_upload_image_file_then_io_error() {
    let dir = TempDir::new().unwrap();
    let session = FrameSession::new(test_config(1, 1, dir.path())).unwrap();

    let result = session
        .upload_image_file(dir.path().join("missing.jpg"), "none")
        .await;

    assert!(matches!(
        result,
        Err(frame_core::error::session::SessionError::Io { .. })
    ));
}
