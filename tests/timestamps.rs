use cthread::{normalize_timestamp, parse_create_time, TimestampPolicy, INVALID_TIME, UNKNOWN_TIME};

#[test]
fn renders_epoch_seconds_in_utc_plus_eight() {
    assert_eq!(normalize_timestamp(0, TimestampPolicy::Strict), "1970-01-01 08:00:00");
    assert_eq!(normalize_timestamp(1_700_000_000, TimestampPolicy::Strict), "2023-11-15 06:13:20");
    // day rollover happens at 16:00 UTC
    assert_eq!(normalize_timestamp(1_704_038_400, TimestampPolicy::Strict), "2024-01-01 00:00:00");
}

#[test]
fn negative_and_oversized_values_are_invalid() {
    assert_eq!(normalize_timestamp(-5, TimestampPolicy::Strict), INVALID_TIME);
    assert_eq!(normalize_timestamp(2_000_000_000_000, TimestampPolicy::Strict), INVALID_TIME);
    assert_eq!(normalize_timestamp(-5, TimestampPolicy::AcceptMillis), INVALID_TIME);
    assert_eq!(normalize_timestamp(2_000_000_000_000_000, TimestampPolicy::AcceptMillis), INVALID_TIME);
}

/// Under the default bound the millisecond branch never runs: a millisecond
/// value is rejected as invalid instead of being divided by 1000.
#[test]
fn strict_policy_never_reaches_millisecond_branch() {
    let ms = 1_700_000_000_000;
    assert_eq!(normalize_timestamp(ms, TimestampPolicy::Strict), INVALID_TIME);
}

#[test]
fn accept_millis_policy_divides_large_values() {
    assert_eq!(
        normalize_timestamp(2_000_000_000_000, TimestampPolicy::AcceptMillis),
        "2033-05-18 11:33:20"
    );
    assert_eq!(
        normalize_timestamp(1_700_000_000_123, TimestampPolicy::AcceptMillis),
        "2023-11-15 06:13:20"
    );
    // seconds are unaffected
    assert_eq!(normalize_timestamp(1_700_000_000, TimestampPolicy::AcceptMillis), "2023-11-15 06:13:20");
}

/// Exactly 10^12 seconds passes the bound but is past year 9999.
#[test]
fn unrepresentable_date_reports_unknown_time_with_detail() {
    let s = normalize_timestamp(1_000_000_000_000, TimestampPolicy::Strict);
    assert!(s.starts_with(UNKNOWN_TIME), "got {s}");
    assert!(s.len() > UNKNOWN_TIME.len() + 3, "detail missing: {s}");
}

#[test]
fn parses_raw_create_time_cells() {
    assert_eq!(parse_create_time("1700000000"), Some(1_700_000_000));
    assert_eq!(parse_create_time(" 1700000000 "), Some(1_700_000_000));
    assert_eq!(parse_create_time("1700000000.9"), Some(1_700_000_000));
    assert_eq!(parse_create_time("1.7e9"), Some(1_700_000_000));
    assert_eq!(parse_create_time("-5"), Some(-5));
    assert_eq!(parse_create_time(""), None);
    assert_eq!(parse_create_time("yesterday"), None);
    assert_eq!(parse_create_time("NaN"), None);
}

#[test]
fn parses_display_form_back_to_epoch_seconds() {
    assert_eq!(parse_create_time("2023-11-15 06:13:20"), Some(1_700_000_000));
    assert_eq!(parse_create_time(INVALID_TIME), None);
}
