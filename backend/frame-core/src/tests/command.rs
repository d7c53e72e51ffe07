// Unit tests for outbound request encoding

use crate::channel::command::{ArtCommand, encode_command, image_date};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

const SESSION_ID: &str = "0f8a1c52-3f7e-4a8e-9d51-7f2b6a0c1e90";

/// Decode the outer envelope and the JSON text nested in `params.data`.
fn decode(frame: &str) -> (Value, Value) {
    let outer: Value = serde_json::from_str(frame).unwrap();
    let data = outer["params"]["data"].as_str().unwrap().to_string();
    (outer, serde_json::from_str(&data).unwrap())
}

/// **VALUE**: Verifies the transport envelope around every request.
///
/// **WHY THIS MATTERS**: The TV silently ignores frames whose envelope is off by
/// one key; there is no error reply to debug from.
///
/// **BUG THIS CATCHES**: Would catch `data` being sent as an object instead of
/// JSON text, or a missing session id.
#[test]
fn given_request_when_encoded_then_wrapped_in_channel_emit_with_session_id() {
    // GIVEN / WHEN
    let frame = encode_command(&ArtCommand::GetDeviceInfo, SESSION_ID).unwrap();

    // THEN
    let (outer, data) = decode(&frame);
    assert_eq!(outer["method"], "ms.channel.emit");
    assert_eq!(outer["params"]["event"], "art_app_request");
    assert_eq!(outer["params"]["to"], "host");
    assert!(outer["params"]["data"].is_string());
    assert_eq!(data, json!({ "request": "get_device_info", "id": SESSION_ID }));
}

/// **VALUE**: Verifies parameters travel next to the request name.
#[test]
fn given_parameterized_requests_when_encoded_then_fields_match_wire_names() {
    let (_, data) = decode(
        &encode_command(&ArtCommand::SetArtModeStatus { value: false }, SESSION_ID).unwrap(),
    );
    assert_eq!(data["request"], "set_artmode_status");
    assert_eq!(data["value"], "off");

    let (_, data) = decode(&encode_command(&ArtCommand::content_list(), SESSION_ID).unwrap());
    assert_eq!(data["request"], "get_content_list");
    assert_eq!(data["category"], "None");

    let (_, data) = decode(
        &encode_command(&ArtCommand::select_image("MY_F0001", None), SESSION_ID).unwrap(),
    );
    assert_eq!(data["request"], "select_image");
    assert_eq!(data["content_id"], "MY_F0001");
    assert_eq!(data["category_id"], "");
    assert_eq!(data["show"], true);

    let (_, data) = decode(&encode_command(&ArtCommand::delete_image("MY_F0002"), SESSION_ID).unwrap());
    assert_eq!(data["request"], "delete_image_list");
    assert_eq!(data["content_id_list"], json!([{ "content_id": "MY_F0002" }]));
}

/// **VALUE**: Verifies transfer requests carry socket-mode connection info.
///
/// **BUG THIS CATCHES**: Would catch the connection info using a different id
/// than the one stamped on the envelope, which the TV rejects.
#[test]
fn given_transfer_requests_when_encoded_then_conn_info_uses_session_id() {
    let (_, thumbnail) =
        decode(&encode_command(&ArtCommand::thumbnail("SAM-S0700", SESSION_ID), SESSION_ID).unwrap());
    assert_eq!(thumbnail["request"], "get_thumbnail");
    assert_eq!(thumbnail["content_id"], "SAM-S0700");
    assert_eq!(thumbnail["conn_info"]["d2d_mode"], "socket");
    assert_eq!(thumbnail["conn_info"]["id"], SESSION_ID);
    assert!(thumbnail["conn_info"]["connection_id"].is_u64());

    let (_, upload) = decode(
        &encode_command(&ArtCommand::send_image(2048, "shadowbox_polar", SESSION_ID), SESSION_ID)
            .unwrap(),
    );
    assert_eq!(upload["request"], "send_image");
    assert_eq!(upload["file_type"], "jpg");
    assert_eq!(upload["file_size"], 2048);
    assert_eq!(upload["matte_id"], "shadowbox_polar");
    assert_eq!(upload["conn_info"]["id"], SESSION_ID);
}

/// **VALUE**: Verifies the `image_date` format the TV expects.
#[test]
fn given_timestamp_when_formatted_then_colon_separated_date_and_time() {
    // 2024-02-29T13:05:09Z
    let when = UNIX_EPOCH + Duration::from_secs(1_709_211_909);

    assert_eq!(image_date(when), "2024:02:29 13:05:09");
    assert_eq!(image_date(SystemTime::now()).len(), "YYYY:MM:DD hh:mm:ss".len());
}
