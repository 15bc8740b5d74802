//! Timestamp utilities
//!
//! All persisted timestamps are local-time ISO-8601 strings. Records are
//! ordered by comparing these strings, so the format must stay fixed-width.

use chrono::{DateTime, Local, SecondsFormat};
use std::time::SystemTime;

/// Current local time as an ISO-8601 string with microsecond precision
pub fn now_iso() -> String {
    format_iso(Local::now())
}

/// Format a local timestamp the way sidecar files store it
pub fn format_iso(timestamp: DateTime<Local>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Format a filesystem modification time
pub fn system_time_iso(time: SystemTime) -> String {
    format_iso(DateTime::<Local>::from(time))
}

/// Whole-second compact stamp used for generated scene names (`YYYYmmdd_HHMMSS`)
pub fn compact_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}
