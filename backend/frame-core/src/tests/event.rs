// Unit tests for inbound frame decoding
// Both levels: transport envelope and nested art-app document

use crate::channel::event::{ArtEvent, ChannelEvent};
use crate::transfer::TransferEndpoint;

use serde_json::{Value, json};

/// Build a `d2d_service_message` frame whose nested document is JSON text.
fn service_message(data: Value) -> String {
    json!({ "event": "d2d_service_message", "data": data.to_string() }).to_string()
}

fn art_event(data: Value) -> ArtEvent {
    match ChannelEvent::parse(&service_message(data)).unwrap() {
        ChannelEvent::ServiceMessage(event) => event,
        other => panic!("expected a service message, got {other:?}"),
    }
}

/// **VALUE**: Verifies the transport-level tags.
#[test]
fn given_transport_frames_when_parsed_then_mapped_to_channel_events() {
    assert_eq!(
        ChannelEvent::parse(r#"{"event":"ms.channel.connect","data":{}}"#).unwrap(),
        ChannelEvent::Connect
    );
    assert_eq!(
        ChannelEvent::parse(r#"{"event":"ms.channel.ready","data":{}}"#).unwrap(),
        ChannelEvent::Ready
    );
    assert_eq!(
        ChannelEvent::parse(r#"{"event":"ms.channel.unauthorized"}"#).unwrap(),
        ChannelEvent::Unauthorized
    );
    assert_eq!(
        ChannelEvent::parse(r#"{"event":"ms.error","data":{"message":"bad channel"}}"#).unwrap(),
        ChannelEvent::Error {
            message: "bad channel".to_string()
        }
    );
}

/// **VALUE**: Verifies unknown transport tags pass through instead of failing.
///
/// **BUG THIS CATCHES**: Would catch a new firmware event (e.g. `ms.channel.clientConnect`)
/// being treated as malformed.
#[test]
fn given_unknown_transport_tag_when_parsed_then_other_with_data() {
    let event =
        ChannelEvent::parse(r#"{"event":"ms.channel.clientConnect","data":{"id":"x"}}"#).unwrap();

    assert_eq!(
        event,
        ChannelEvent::Other {
            event: "ms.channel.clientConnect".to_string(),
            data: json!({ "id": "x" }),
        }
    );
}

/// **VALUE**: Verifies malformed text is rejected at either level.
///
/// **WHY THIS MATTERS**: The session drops these with a warning; they must not
/// be mistaken for valid events.
#[test]
fn given_malformed_frames_when_parsed_then_error() {
    assert!(ChannelEvent::parse("not json").is_err());
    assert!(ChannelEvent::parse(r#"{"event":"d2d_service_message","data":"{oops"}"#).is_err());
    assert!(ChannelEvent::parse(r#"{"event":"d2d_service_message","data":"[1,2]"}"#).is_err());
}

/// **VALUE**: Verifies both art-mode reports decode to on/off.
#[test]
fn given_art_mode_events_when_parsed_then_on_off_decoded() {
    assert_eq!(
        art_event(json!({ "event": "artmode_status", "value": "off" })),
        ArtEvent::ArtModeStatus { on: false }
    );
    assert_eq!(
        art_event(json!({ "event": "art_mode_changed", "status": "on" })),
        ArtEvent::ArtModeChanged { on: true }
    );
    assert_eq!(
        art_event(json!({ "event": "favorite_changed", "content_id": "SAM-1", "status": "on" })),
        ArtEvent::FavoriteChanged {
            content_id: "SAM-1".to_string(),
            on: true
        }
    );
}

/// **VALUE**: Verifies the reply envelope keys are stripped from device info.
///
/// **BUG THIS CATCHES**: Would catch `event`/`id` overwriting real device fields in
/// the cache after a merge.
#[test]
fn given_device_info_event_when_parsed_then_envelope_keys_removed() {
    let event = art_event(json!({
        "event": "get_device_info",
        "id": "session",
        "target_client_id": "client",
        "FrameTVSupport": "true",
        "name": "Frame",
    }));

    let ArtEvent::DeviceInfo(fields) = event else {
        panic!("expected device info");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["name"], "Frame");
    assert!(!fields.contains_key("event"));
    assert!(!fields.contains_key("id"));
    assert!(!fields.contains_key("target_client_id"));
}

/// **VALUE**: Verifies nested lists are accepted as JSON text or structured JSON.
///
/// **WHY THIS MATTERS**: Firmware versions disagree about which form they send.
#[test]
fn given_nested_lists_as_text_or_json_when_parsed_then_same_result() {
    let items = json!([{ "content_id": "MY_F0001" }, { "content_id": "MY_F0002" }]);

    let as_text = art_event(json!({ "event": "content_list", "content_list": items.to_string() }));
    let as_json = art_event(json!({ "event": "content_list", "content_list": items }));

    assert_eq!(as_text, as_json);
    let ArtEvent::ContentList(list) = as_text else {
        panic!("expected content list");
    };
    assert_eq!(list.len(), 2);

    assert_eq!(
        art_event(json!({
            "event": "matte_list",
            "matte_type_list": "[{\"matte_type\":\"none\"}]",
            "matte_color_list": [{ "color": "polar" }],
        })),
        ArtEvent::MatteList {
            types: vec![json!({ "matte_type": "none" })],
            colors: vec![json!({ "color": "polar" })],
        }
    );
}

/// **VALUE**: Verifies transfer endpoints decode with string or numeric ports.
#[test]
fn given_transfer_events_when_parsed_then_endpoints_extracted() {
    assert_eq!(
        art_event(json!({
            "event": "thumbnail",
            "conn_info": "{\"ip\":\"192.168.1.20\",\"port\":\"35000\"}",
        })),
        ArtEvent::Thumbnail(TransferEndpoint {
            ip: "192.168.1.20".to_string(),
            port: 35000,
        })
    );

    let ArtEvent::ReadyToUse(ticket) = art_event(json!({
        "event": "ready_to_use",
        "conn_info": { "ip": "192.168.1.20", "port": 35001, "key": "abc123" },
    })) else {
        panic!("expected ready_to_use");
    };
    assert_eq!(ticket.endpoint.port, 35001);
    assert_eq!(ticket.key.expose(), "abc123");
}

/// **VALUE**: Verifies a transfer event without connection info is an error.
#[test]
fn given_thumbnail_without_conn_info_when_parsed_then_error() {
    let frame = service_message(json!({ "event": "thumbnail" }));

    assert!(ChannelEvent::parse(&frame).is_err());
}

/// **VALUE**: Verifies deleted ids and device errors unwrap their nested text.
#[test]
fn given_deletion_and_error_events_when_parsed_then_nested_documents_decoded() {
    assert_eq!(
        art_event(json!({
            "event": "image_list_deleted",
            "content_id_list": "[{\"content_id\":\"MY_F0001\"},{\"content_id\":\"MY_F0002\"}]",
        })),
        ArtEvent::ImagesDeleted(vec!["MY_F0001".to_string(), "MY_F0002".to_string()])
    );

    assert_eq!(
        art_event(json!({
            "event": "error",
            "error_code": -1,
            "request_data": "{\"request\":\"select_image\"}",
        })),
        ArtEvent::Error {
            error_code: "-1".to_string(),
            request: json!({ "request": "select_image" }),
        }
    );
}

/// **VALUE**: Verifies unknown art-app tags are carried through with their fields.
///
/// **BUG THIS CATCHES**: Would catch an unknown tag being reported as an error
/// (which the session would log as a malformed frame).
#[test]
fn given_unknown_art_tag_when_parsed_then_other_keeps_fields() {
    let event = art_event(json!({ "event": "slideshow_status", "value": "off" }));

    let ArtEvent::Other { event, data } = event else {
        panic!("expected Other");
    };
    assert_eq!(event, "slideshow_status");
    assert_eq!(data["value"], "off");
}

/// **VALUE**: Verifies structured (non-text) service message data is accepted too.
#[test]
fn given_structured_service_data_when_parsed_then_decoded() {
    let frame = json!({
        "event": "d2d_service_message",
        "data": { "event": "api_version", "version": "4.3.4.0" },
    })
    .to_string();

    assert_eq!(
        ChannelEvent::parse(&frame).unwrap(),
        ChannelEvent::ServiceMessage(ArtEvent::ApiVersion {
            version: "4.3.4.0".to_string()
        })
    );
}

/// **VALUE**: Verifies the standby push is recognized.
///
/// **WHY THIS MATTERS**: The session answers standby with a wake packet so the
/// frame stays reachable. If the tag falls through to `Other`, nothing wakes it.
///
/// **BUG THIS CATCHES**: Would catch a typo in the `go_to_standby` tag.
#[test]
fn given_go_to_standby_when_parsed_then_standby_event() {
    // GIVEN / WHEN
    let event = art_event(json!({ "event": "go_to_standby", "id": "abc" }));

    // THEN
    assert_eq!(event, ArtEvent::GoToStandby);
    assert_eq!(event.tag(), "go_to_standby");
}

/// **VALUE**: Verifies image-added keeps an empty category distinct from a real one.
///
/// **BUG THIS CATCHES**: Would catch a missing `category_id` being decoded as
/// something other than empty, which decides whether the image gets selected.
#[test]
fn given_image_added_with_and_without_category_when_parsed_then_category_kept() {
    assert_eq!(
        art_event(json!({ "event": "image_added", "content_id": "MY_F0001" })),
        ArtEvent::ImageAdded {
            content_id: "MY_F0001".to_string(),
            category_id: String::new(),
        }
    );
    assert_eq!(
        art_event(json!({ "event": "image_added", "content_id": "SAM-1", "category_id": "MY-C0004" })),
        ArtEvent::ImageAdded {
            content_id: "SAM-1".to_string(),
            category_id: "MY-C0004".to_string(),
        }
    );
}
