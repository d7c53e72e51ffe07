use crate::helpers::{serve_bytewise, thumbnail_frame};

use frame_core::error::transfer::TransferError;
use frame_core::transfer::fetch_thumbnail;

use std::time::Duration;

use tempfile::TempDir;

const CONNECT: Duration = Duration::from_secs(2);
const READ: Duration = Duration::from_secs(2);

/// **VALUE**: Verifies a thumbnail trickling in one byte per write is reassembled.
///
/// **WHY THIS MATTERS**: Real devices send thumbnails across many TCP segments.
#[tokio::test]
async fn given_bytewise_stream_when_fetched_then_exact_payload_saved() {
    // GIVEN
    let dir = TempDir::new().unwrap();
    let payload = b"\xFF\xD8 thumbnail bytes \xFF\xD9".to_vec();
    let (endpoint, server) = serve_bytewise(thumbnail_frame("MY_F0001", "jpg", &payload)).await;

    // WHEN
    let thumbnail = fetch_thumbnail(&endpoint, &dir.path().join("thumbs"), CONNECT, READ)
        .await
        .unwrap();

    // THEN: Directory created on demand
    assert_eq!(thumbnail.content_id, "MY_F0001");
    assert_eq!(thumbnail.size, payload.len());
    assert_eq!(thumbnail.path, dir.path().join("thumbs").join("MY_F0001.jpg"));
    assert_eq!(std::fs::read(&thumbnail.path).unwrap(), payload);
    server.await.unwrap();
}

/// **VALUE**: Verifies a connection closed mid-frame is a truncation error.
///
/// **BUG THIS CATCHES**: Would catch a short file being written as if complete.
#[tokio::test]
async fn given_connection_closed_early_when_fetched_then_truncated() {
    let dir = TempDir::new().unwrap();
    let mut frame = thumbnail_frame("MY_F0001", "jpg", &[7u8; 64]);
    frame.truncate(frame.len() - 10);
    let (endpoint, _server) = serve_bytewise(frame).await;

    let result = fetch_thumbnail(&endpoint, dir.path(), CONNECT, READ).await;

    assert!(
        matches!(result, Err(TransferError::Truncated { .. })),
        "{result:?}"
    );
    assert!(!dir.path().join("MY_F0001.jpg").exists());
}

/// **VALUE**: Verifies a file id that would escape the thumbnail directory is refused.
///
/// **BUG THIS CATCHES**: Would catch a malicious or corrupt `fileID` like `../x`
/// writing outside the thumbnail directory.
#[tokio::test]
async fn given_path_traversal_file_id_when_fetched_then_header_error() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("thumbs");
    let (endpoint, _server) = serve_bytewise(thumbnail_frame("../escape", "jpg", b"x")).await;

    let result = fetch_thumbnail(&endpoint, &target, CONNECT, READ).await;

    assert!(matches!(result, Err(TransferError::Header { .. })), "{result:?}");
    assert!(!dir.path().join("escape.jpg").exists());
}
