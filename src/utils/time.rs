use time::OffsetDateTime;
use time::macros::format_description;

/// The current wall-clock time, in the local offset when it can be determined.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Format a timestamp as `YYYY-MM-DD_HH_MM`.
pub fn session_stamp(datetime: OffsetDateTime) -> String {
    // Every component of the layout is always representable.
    datetime
        .format(format_description!("[year]-[month]-[day]_[hour]_[minute]"))
        .unwrap_or_else(|_| datetime.unix_timestamp().to_string())
}
