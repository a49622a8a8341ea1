use chrono::{DateTime, Utc};

/// Wall-clock time for save indicators, e.g. "14:02:51".
#[must_use]
pub fn format_clock_time(value: DateTime<Utc>) -> String {
    value.format("%H:%M:%S").to_string()
}
