use frame_core::error::CoreError;
use frame_core::error::channel::ChannelError;
use frame_core::error::discovery::DiscoveryError;
use frame_core::error::transfer::TransferError;
use frame_core::error::wake::WakeError;

use std::io::{Error as IoError, ErrorKind};

/// **VALUE**: Verifies constructor helpers record the caller's location in Display.
///
/// **WHY THIS MATTERS**: Errors surface as notification text; the location is the only
/// pointer back to the code that produced them.
///
/// **BUG THIS CATCHES**: Would catch a helper losing `#[track_caller]` and reporting
/// its own line instead of the caller's.
#[test]
fn given_helper_constructed_errors_when_formatted_then_include_caller_location() {
    let line = line!() + 1;
    let err = DiscoveryError::payload("body is not an object");

    let text = err.to_string();
    assert!(text.contains("Payload Error"));
    assert!(text.contains("body is not an object"));
    assert!(text.contains("location.rs"), "{text}");
    assert!(text.contains(&format!(":{line}:")), "{text}");

    let text = TransferError::header("bad header").to_string();
    assert!(text.starts_with("Header Error: bad header ["), "{text}");
    assert!(text.contains("location.rs"));

    let text = ChannelError::not_open("channel closed").to_string();
    assert!(text.contains("Not Open Error"));
    assert!(text.contains("location.rs"));
}

/// **VALUE**: Verifies `From` conversions also capture a location.
#[test]
fn given_converted_errors_when_formatted_then_include_location() {
    let wake = WakeError::from(IoError::new(ErrorKind::PermissionDenied, "broadcast denied"));
    let text = wake.to_string();
    assert!(text.contains("broadcast denied"));
    assert!(text.contains("location.rs"), "{text}");

    let parse = ChannelError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
    assert!(parse.to_string().contains("Envelope Error"));
}

/// **VALUE**: Verifies the umbrella error is transparent.
#[test]
fn given_core_error_when_formatted_then_shows_inner_message() {
    let inner = DiscoveryError::http(500, "boom");
    let expected = inner.to_string();

    let core: CoreError = inner.into();

    assert_eq!(core.to_string(), expected);
    assert!(expected.contains("500"));
}
