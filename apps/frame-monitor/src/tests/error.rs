// Unit tests for error module
// Tests conversions from engine errors and location reporting

use crate::error::MonitorError;

use frame_core::error::CoreError;
use frame_core::error::config::ConfigError;
use frame_core::error::session::SessionError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that the Display output carries the message and where it happened.
///
/// **WHY THIS MATTERS**: The monitor prints startup errors straight to stderr. Without
/// the location, a failed start can't be traced back to the call site.
///
/// **BUG THIS CATCHES**: Would catch if the `#[error(...)]` format drops `{location}`
/// or the variant prefix.
#[test]
fn given_monitor_error_when_displayed_then_includes_message_and_location() {
    // GIVEN: A monitor error
    let err = MonitorError::monitor("no config dir");

    // WHEN: Formatting it
    let text = err.to_string();

    // THEN: Prefix, message and this file appear
    assert!(text.starts_with("Monitor Error: no config dir"), "{text}");
    assert!(text.contains("error.rs"), "Location should name the caller: {text}");
}

/// **VALUE**: Tests that config errors keep their own variant.
///
/// **WHY THIS MATTERS**: A bad config.json is the most common startup failure; it
/// should read as a config problem, not a generic engine failure.
///
/// **BUG THIS CATCHES**: Would catch if `From<ConfigError>` maps to `Core`.
#[test]
fn given_config_error_when_converted_then_config_variant() {
    // GIVEN: A validation error from the engine config
    let config_err = ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: String::from("client_name cannot be empty"),
    };

    // WHEN: Converting
    let err = MonitorError::from(config_err);

    // THEN: Config variant with the reason in the message
    match err {
        MonitorError::Config { message, .. } => {
            assert!(message.contains("client_name cannot be empty"), "{message}");
        }
        other => panic!("Expected Config, got {other:?}"),
    }
}

/// **VALUE**: Tests that a config error wrapped in `CoreError` is unwrapped.
///
/// **WHY THIS MATTERS**: `FrameSession::new` validates config and returns it as
/// `CoreError::Config`. The monitor should report it the same as a direct config error.
///
/// **BUG THIS CATCHES**: Would catch if the `CoreError::Config` arm is removed.
#[test]
fn given_core_config_error_when_converted_then_config_variant() {
    // GIVEN: A CoreError wrapping a config error
    let core_err = CoreError::from(ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: String::from("rest_port cannot be 0"),
    });

    // WHEN: Converting
    let err = MonitorError::from(core_err);

    // THEN: Config variant
    assert!(matches!(err, MonitorError::Config { .. }), "{err:?}");
}

/// **VALUE**: Tests that a closed session maps to the Core variant.
///
/// **WHY THIS MATTERS**: Commands sent after the actor stopped must surface as an
/// engine failure so the monitor exits instead of silently continuing.
///
/// **BUG THIS CATCHES**: Would catch if `From<SessionError>` loses the message.
#[test]
fn given_session_error_when_converted_then_core_variant() {
    // GIVEN: A closed-session error
    let session_err = SessionError::closed("session actor stopped");

    // WHEN: Converting
    let err = MonitorError::from(session_err);

    // THEN: Core variant carrying the message
    match err {
        MonitorError::Core { message, .. } => assert!(message.contains("session actor stopped"), "{message}"),
        other => panic!("Expected Core, got {other:?}"),
    }
}
