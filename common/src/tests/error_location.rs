use crate::ErrorLocation;
use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column.
///
/// **WHY THIS MATTERS**: Every error enum in the engine embeds an `ErrorLocation`. If it
/// records the wrong position, a failed discovery or a broken transfer frame can't be
/// traced back to the code that reported it.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` stops being propagated or
/// the line/column capture breaks.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN/WHEN: Creating ErrorLocation on a known line
    let expected_line = line!() + 1;
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should point at this file and line
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert_eq!(location.line, expected_line, "Should capture correct line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the `[file:line:column]` Display format.
///
/// **WHY THIS MATTERS**: All error messages end with this suffix; log scraping and humans
/// both rely on it.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops the brackets or one of
/// the three components.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation::caller();

    // WHEN: Formatting as string
    let formatted = format!("{location}");

    // THEN: Should produce "[file:line:column]"
    assert!(formatted.starts_with('['), "Should start with '['");
    assert!(formatted.ends_with(']'), "Should end with ']'");
    assert_eq!(formatted.matches(':').count(), 2, "Should have file:line:column");
    assert!(formatted.contains(&location.line.to_string()));
}
