//! ISO-8601 timestamps in the collector's wire format.

use chrono::{DateTime, SecondsFormat, Utc};

/// Render `ts` as RFC 3339 with millisecond precision and a `Z` suffix,
/// e.g. `2026-02-08T12:00:00.000Z`.
#[must_use]
pub fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current wall-clock time in wire format.
#[must_use]
pub fn now_iso8601() -> String {
    iso8601(Utc::now())
}
