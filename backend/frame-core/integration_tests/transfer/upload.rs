use crate::helpers::capture_upload;

use frame_core::error::transfer::TransferError;
use frame_core::transfer::{
    FrameAssembler, TransferEndpoint, UploadHeader, UploadTicket, push_image,
};

use common::RedactedKey;

use std::time::Duration;

/// **VALUE**: Verifies the pushed bytes are exactly one frame with the ticket's key.
#[tokio::test]
async fn given_ticket_when_pushed_then_listener_receives_single_frame() {
    // GIVEN
    let (endpoint, upload) = capture_upload().await;
    let ticket = UploadTicket {
        endpoint,
        key: RedactedKey::new("one-time-key"),
    };
    let payload = vec![42u8; 4096];

    // WHEN
    let written = push_image(&ticket, &payload, Duration::from_secs(2))
        .await
        .unwrap();

    // THEN
    let received = upload.await.unwrap();
    assert_eq!(received.len(), written);

    let mut assembler = FrameAssembler::<UploadHeader>::new();
    assembler.extend(&received);
    let frame = assembler.try_decode().unwrap().unwrap();
    assert_eq!(frame.header.sec_key, "one-time-key");
    assert_eq!(frame.header.file_type, "jpg");
    assert_eq!(frame.header.version, "0.0.1");
    assert_eq!(frame.payload, payload);
}

/// **VALUE**: Verifies an endpoint with no port is rejected before connecting.
#[tokio::test]
async fn given_unusable_endpoint_when_pushed_then_endpoint_error() {
    let ticket = UploadTicket {
        endpoint: TransferEndpoint {
            ip: "127.0.0.1".to_string(),
            port: 0,
        },
        key: RedactedKey::new("k"),
    };

    let result = push_image(&ticket, b"x", Duration::from_secs(1)).await;

    assert!(matches!(result, Err(TransferError::Endpoint { .. })));
}
