use crate::RedactedKey;

/// **VALUE**: Verifies the security key never appears in Debug or Display output.
///
/// **WHY THIS MATTERS**: Upload events are logged at debug level. The per-upload key the
/// device issues must not end up in a log file.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug or a Display that forwards the value.
#[test]
fn given_key_when_formatted_then_value_is_redacted() {
    // GIVEN: A key with a recognisable value
    let key = RedactedKey::new("super-secret-key");

    // WHEN: Formatting with Debug and Display
    let debug = format!("{key:?}");
    let display = format!("{key}");

    // THEN: Neither contains the secret
    assert!(!debug.contains("super-secret-key"));
    assert!(!display.contains("super-secret-key"));
    assert_eq!(key.expose(), "super-secret-key");
    assert_eq!(key.len(), 16);
}

/// **VALUE**: Verifies serde serialization is refused.
///
/// **WHY THIS MATTERS**: Headers are serialized with serde_json. Accidentally deriving a
/// header with a `RedactedKey` field must fail loudly instead of silently writing the key
/// somewhere unexpected.
///
/// **BUG THIS CATCHES**: Would catch if the custom Serialize impl is replaced by a derive.
#[test]
fn given_key_when_serialized_then_returns_error() {
    // GIVEN: A key
    let key = RedactedKey::new("abc");

    // WHEN: Serializing it
    let result = serde_json::to_string(&key);

    // THEN: Serialization fails
    assert!(result.is_err(), "RedactedKey must not serialize");
}
