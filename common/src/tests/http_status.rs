use crate::HttpStatusCode;

/// **VALUE**: Verifies the status ranges discovery relies on.
///
/// **WHY THIS MATTERS**: Discovery decides success with `is_success` and picks the
/// error message from the client/server split. A wrong boundary would treat a
/// redirect or an error page as device info.
///
/// **BUG THIS CATCHES**: Would catch off-by-one range bounds (e.g. 300 as success).
#[test]
fn given_status_codes_when_categorized_then_ranges_match() {
    // GIVEN / WHEN / THEN
    assert!(HttpStatusCode(200).is_success());
    assert!(HttpStatusCode(299).is_success());
    assert!(!HttpStatusCode(300).is_success());
    assert!(!HttpStatusCode(199).is_success());

    assert!(HttpStatusCode(404).is_client_error());
    assert!(!HttpStatusCode(404).is_server_error());
    assert!(HttpStatusCode(503).is_server_error());
    assert!(!HttpStatusCode(600).is_server_error());
}

/// **VALUE**: Verifies Display prints the bare number.
#[test]
fn given_status_code_when_displayed_then_number_only() {
    assert_eq!(HttpStatusCode::from(503).to_string(), "503");
}
