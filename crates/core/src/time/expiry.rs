use crate::domain::Timeframe;
use chrono::{DateTime, Local};
use serde::Serializer;

/// Local 12-hour clock with date, e.g. `03:45 PM 01/27/2026`.
pub const DISPLAY_FORMAT: &str = "%I:%M %p %m/%d/%Y";

pub fn expiration_at(timeframe: Timeframe, now: DateTime<Local>) -> DateTime<Local> {
    now + timeframe.expiration_offset()
}

pub fn format_display(ts: &DateTime<Local>) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

pub fn serialize_display<S: Serializer>(ts: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_display(ts))
}
