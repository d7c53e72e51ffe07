// Unit tests for discovery body merging and the device-info cache

use crate::discovery::{DeviceInfo, merge_device_info};
use crate::error::discovery::DiscoveryError;

use serde_json::{Map, json};

/// **VALUE**: Verifies the REST body is flattened into one mapping.
///
/// **WHY THIS MATTERS**: Everything downstream (frame name, FrameTV support
/// check, later merges) reads this flat mapping.
///
/// **BUG THIS CATCHES**: Would catch `isSupport` being stored as a raw string
/// instead of a re-parsed object.
#[test]
fn given_discovery_body_when_merged_then_device_fields_plus_version_and_support() {
    // GIVEN
    let body = json!({
        "device": { "name": "Living Room Frame", "FrameTVSupport": "true", "id": "uuid:1" },
        "version": "2.0.25",
        "isSupport": "{\"remote\":\"true\",\"DMP_available\":\"false\"}",
    });

    // WHEN
    let info = merge_device_info(body).unwrap();

    // THEN
    assert_eq!(info.name(), Some("Living Room Frame"));
    assert!(info.has_frame_tv_support());
    assert_eq!(info.get("version"), Some(&json!("2.0.25")));
    assert_eq!(
        info.get("support"),
        Some(&json!({ "remote": "true", "DMP_available": "false" }))
    );
    assert_eq!(info.get("id"), Some(&json!("uuid:1")));
}

/// **VALUE**: Verifies a broken or missing `isSupport` degrades to an empty object.
///
/// **BUG THIS CATCHES**: Would catch discovery failing outright on firmware that
/// ships a malformed support document.
#[test]
fn given_unparseable_is_support_when_merged_then_support_is_empty_object() {
    let info = merge_device_info(json!({
        "device": { "name": "Frame" },
        "isSupport": "{not json",
    }))
    .unwrap();

    assert_eq!(info.get("support"), Some(&json!({})));
    assert_eq!(info.get("version"), Some(&json!("")));
}

/// **VALUE**: Verifies a non-object body is a payload error.
#[test]
fn given_non_object_body_when_merged_then_payload_error() {
    let result = merge_device_info(json!(["not", "an", "object"]));

    assert!(matches!(result, Err(DiscoveryError::Payload { .. })));
}

/// **VALUE**: Verifies cache merges add and overwrite but never remove fields.
///
/// **WHY THIS MATTERS**: `get_device_info` events carry a subset of fields; the
/// REST-only fields must survive them.
#[test]
fn given_cached_info_when_update_merged_then_fields_are_added_or_overwritten() {
    // GIVEN
    let mut info = merge_device_info(json!({
        "device": { "name": "Old Name", "model": "QE55LS03" },
        "version": "1",
    }))
    .unwrap();

    // WHEN
    let mut update = Map::new();
    update.insert("name".to_string(), json!("New Name"));
    update.insert("firmware".to_string(), json!("T-KSM2"));
    info.merge(update);

    // THEN
    assert_eq!(info.name(), Some("New Name"));
    assert_eq!(info.get("model"), Some(&json!("QE55LS03")));
    assert_eq!(info.get("firmware"), Some(&json!("T-KSM2")));
    assert_eq!(info.get("version"), Some(&json!("1")));
}

/// **VALUE**: Verifies FrameTV support is only reported for an explicit "true".
#[test]
fn given_support_flag_variants_when_checked_then_only_true_counts() {
    let with = |value| {
        let mut fields = Map::new();
        fields.insert("FrameTVSupport".to_string(), value);
        DeviceInfo::new(fields)
    };

    assert!(with(json!("true")).has_frame_tv_support());
    assert!(with(json!(true)).has_frame_tv_support());
    assert!(!with(json!("false")).has_frame_tv_support());
    assert!(!with(json!(null)).has_frame_tv_support());
    assert!(!DeviceInfo::default().has_frame_tv_support());
}
