//! Epoch timestamp normalization into the fixed display zone (Asia/Shanghai, UTC+08:00).

use time::format_description::FormatItem;
use time::macros::{format_description, offset};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const INVALID_TIME: &str = "invalid time";
pub const UNKNOWN_TIME: &str = "unknown time";

/// Upper bound of the default validity window.
pub const MAX_SECONDS: i64 = 1_000_000_000_000;
/// Upper bound when millisecond values are admitted.
pub const MAX_MILLIS: i64 = 1_000_000_000_000_000;

/// China Standard Time. The zone has had no DST since 1991, so a fixed offset is used.
const DISPLAY_OFFSET: UtcOffset = offset!(+8);
const DISPLAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// How raw `create_time` values are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// Values outside `0..=10^12` are invalid; everything else is epoch seconds.
    /// The millisecond conversion never applies under this bound.
    #[default]
    Strict,
    /// Admit `0..=10^15`; values above `10^12` are milliseconds.
    AcceptMillis,
}

/// Render `ts` as `YYYY-MM-DD HH:MM:SS` in UTC+08:00.
///
/// Returns [`INVALID_TIME`] for out-of-range input and `unknown time (<detail>)`
/// when the value is in range but cannot be represented as a calendar date.
pub fn normalize_timestamp(ts: i64, policy: TimestampPolicy) -> String {
    let upper = match policy {
        TimestampPolicy::Strict => MAX_SECONDS,
        TimestampPolicy::AcceptMillis => MAX_MILLIS,
    };
    if ts < 0 || ts > upper {
        return INVALID_TIME.to_string();
    }
    let secs = if ts > MAX_SECONDS { ts / 1000 } else { ts };

    match OffsetDateTime::from_unix_timestamp(secs) {
        Ok(dt) => match dt.to_offset(DISPLAY_OFFSET).format(DISPLAY_FORMAT) {
            Ok(s) => s,
            Err(e) => format!("{UNKNOWN_TIME} ({e})"),
        },
        Err(e) => format!("{UNKNOWN_TIME} ({e})"),
    }
}

/// Parse a raw `create_time` cell into epoch seconds.
///
/// Accepts integers, finite floats (truncated toward zero) and the display form
/// produced by [`normalize_timestamp`], so exported files can be loaded again.
pub fn parse_create_time(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            return Some(f.trunc() as i64);
        }
        return None;
    }
    let local = PrimitiveDateTime::parse(s, DISPLAY_FORMAT).ok()?;
    Some(local.assume_offset(DISPLAY_OFFSET).unix_timestamp())
}
