// Unit tests for transfer framing

use crate::error::transfer::TransferError;
use crate::transfer::codec::{
    DownloadHeader, FrameAssembler, LENGTH_PREFIX_LEN, MAX_HEADER_LEN, MAX_PAYLOAD_LEN, UploadHeader,
    encode_frame,
};

use common::RedactedKey;

use serde_json::{Value, json};

fn download_frame(file_type: &str, payload: &[u8]) -> Vec<u8> {
    let header = json!({
        "fileName": "thumb",
        "fileType": file_type,
        "fileID": "SAM-S0700",
        "fileLength": payload.len(),
    });
    encode_frame(&header, payload).unwrap()
}

/// **VALUE**: Verifies the prefix is the big-endian length of the header JSON.
///
/// **BUG THIS CATCHES**: Would catch a little-endian prefix or a prefix that
/// counts the payload too. The TV would read garbage as the header.
#[test]
fn given_upload_header_when_framed_then_prefix_header_payload_layout() {
    // GIVEN
    let key = RedactedKey::new("sec-key-1");
    let header = UploadHeader::single_part(5, &key);

    // WHEN
    let frame = encode_frame(&header, b"hello").unwrap();

    // THEN
    let header_len = u32::from_be_bytes(frame[..4].try_into().unwrap()) as usize;
    assert_eq!(frame.len(), LENGTH_PREFIX_LEN + header_len + 5);
    assert_eq!(&frame[frame.len() - 5..], b"hello");

    let decoded: Value = serde_json::from_slice(&frame[4..4 + header_len]).unwrap();
    assert_eq!(decoded["num"], 0);
    assert_eq!(decoded["total"], 1);
    assert_eq!(decoded["fileLength"], 5);
    assert_eq!(decoded["fileType"], "jpg");
    assert_eq!(decoded["secKey"], "sec-key-1");
    assert_eq!(decoded["version"], "0.0.1");
}

/// **VALUE**: Verifies the upload header never prints its key.
#[test]
fn given_upload_header_when_debug_formatted_then_key_redacted() {
    let header = UploadHeader::single_part(1, &RedactedKey::new("super-secret"));

    let debug = format!("{header:?}");

    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("REDACTED"));
}

/// **VALUE**: Verifies a frame delivered one byte at a time is only yielded once complete.
///
/// **WHY THIS MATTERS**: TCP gives no message boundaries; the TV's thumbnails
/// routinely arrive across many reads.
///
/// **BUG THIS CATCHES**: Would catch an assembler that decodes the header too
/// early, yields a short payload, or yields the frame twice.
#[test]
fn given_frame_split_into_single_bytes_when_assembled_then_yields_once_at_end() {
    // GIVEN
    let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    let frame = download_frame("jpeg", &payload);
    let mut assembler = FrameAssembler::<DownloadHeader>::new();

    // WHEN: Feeding every byte but the last
    for byte in &frame[..frame.len() - 1] {
        assembler.extend(&[*byte]);
        assert!(assembler.try_decode().unwrap().is_none());
    }
    assert_eq!(assembler.expected_len(), Some(frame.len()));

    // THEN: The last byte completes the frame
    assembler.extend(&frame[frame.len() - 1..]);
    let decoded = assembler.try_decode().unwrap().unwrap();
    assert_eq!(decoded.payload, payload);
    assert_eq!(decoded.header.file_id, "SAM-S0700");
    assert_eq!(decoded.header.extension(), "jpg");

    assert!(assembler.try_decode().unwrap().is_none());
}

/// **VALUE**: Verifies trailing bytes past the declared length are not part of the payload.
#[test]
fn given_extra_bytes_after_frame_when_assembled_then_payload_is_exact() {
    let mut bytes = download_frame("png", b"abc");
    bytes.extend_from_slice(b"trailing");
    let mut assembler = FrameAssembler::<DownloadHeader>::new();

    assembler.extend(&bytes);
    let decoded = assembler.try_decode().unwrap().unwrap();

    assert_eq!(decoded.payload, b"abc");
    assert_eq!(decoded.header.extension(), "png");
}

/// **VALUE**: Verifies string-typed numeric fields are accepted in download headers.
#[test]
fn given_string_file_length_when_assembled_then_decoded() {
    let header = json!({ "fileType": "jpg", "fileID": 42, "fileLength": "2" });
    let mut assembler = FrameAssembler::<DownloadHeader>::new();

    assembler.extend(&encode_frame(&header, b"ok").unwrap());
    let decoded = assembler.try_decode().unwrap().unwrap();

    assert_eq!(decoded.header.file_id, "42");
    assert_eq!(decoded.payload, b"ok");
}

/// **VALUE**: Verifies an absurd header length fails fast.
///
/// **BUG THIS CATCHES**: Would catch the assembler waiting forever (until the read
/// timeout) for gigabytes of header that will never come.
#[test]
fn given_oversized_header_length_when_decoded_then_header_error() {
    let mut assembler = FrameAssembler::<DownloadHeader>::new();
    assembler.extend(&((MAX_HEADER_LEN as u32) + 1).to_be_bytes());

    let result = assembler.try_decode();

    assert!(matches!(result, Err(TransferError::Header { .. })));
}

/// **VALUE**: Verifies a header that is not the expected JSON is an error.
#[test]
fn given_garbage_header_when_decoded_then_header_error() {
    let garbage = b"{nope";
    let mut bytes = (garbage.len() as u32).to_be_bytes().to_vec();
    bytes.extend_from_slice(garbage);
    let mut assembler = FrameAssembler::<DownloadHeader>::new();
    assembler.extend(&bytes);

    assert!(matches!(
        assembler.try_decode(),
        Err(TransferError::Header { .. })
    ));
}

/// **VALUE**: Verifies a device declaring a `fileLength` near `u64::MAX` gets a header
/// error instead of crashing the download task.
///
/// **WHY THIS MATTERS**: The length comes straight off the wire. A panic in the
/// download task means the caller never hears that the thumbnail failed.
///
/// **BUG THIS CATCHES**: Would catch unchecked `as usize` casts or unchecked additions
/// when computing where the frame ends.
#[test]
fn given_max_file_length_when_decoded_then_header_error_not_panic() {
    // GIVEN: A header claiming u64::MAX payload bytes, with only three present
    let header = json!({
        "fileID": "x",
        "fileType": "jpg",
        "fileName": "t",
        "fileLength": u64::MAX,
    });
    let mut assembler = FrameAssembler::<DownloadHeader>::new();
    assembler.extend(&encode_frame(&header, b"abc").unwrap());

    // WHEN
    let result = assembler.try_decode();

    // THEN
    assert!(matches!(result, Err(TransferError::Header { .. })));
    assert_eq!(assembler.expected_len(), None);
}

/// **VALUE**: Verifies payloads above the receive cap are refused as soon as the
/// header is read.
///
/// **BUG THIS CATCHES**: Would catch the assembler buffering without bound while
/// waiting for a payload it could never hold.
#[test]
fn given_file_length_over_cap_when_decoded_then_header_error() {
    // GIVEN
    let header = json!({
        "fileID": "big",
        "fileType": "jpg",
        "fileLength": MAX_PAYLOAD_LEN + 1,
    });
    let mut assembler = FrameAssembler::<DownloadHeader>::new();
    assembler.extend(&encode_frame(&header, b"").unwrap());

    // WHEN / THEN
    assert!(matches!(
        assembler.try_decode(),
        Err(TransferError::Header { .. })
    ));
}

/// **VALUE**: Verifies a payload exactly at the cap is still accepted as a header.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one that rejects the largest legal frame.
#[test]
fn given_file_length_at_cap_when_header_decoded_then_waits_for_payload() {
    // GIVEN
    let header = json!({
        "fileID": "big",
        "fileType": "jpg",
        "fileLength": MAX_PAYLOAD_LEN,
    });
    let frame = encode_frame(&header, b"").unwrap();
    let mut assembler = FrameAssembler::<DownloadHeader>::new();
    assembler.extend(&frame);

    // WHEN
    let result = assembler.try_decode().unwrap();

    // THEN: Header accepted, payload still missing
    assert!(result.is_none());
    assert_eq!(
        assembler.expected_len(),
        Some(frame.len() + MAX_PAYLOAD_LEN as usize)
    );
}
