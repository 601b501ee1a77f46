//! Relative and clock-time expressions used by reminders and due dates.

use std::sync::OnceLock;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use regex::Regex;

/// Hours added when an expression cannot be understood.
pub const DEFAULT_OFFSET_HOURS: i64 = 1;

fn relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^in\s+(\d+|an?)\s+(minutes?|mins?|hours?|hrs?|days?)$")
            .expect("relative time pattern is valid")
    })
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?$")
            .expect("clock time pattern is valid")
    })
}

/// Parse `expr` relative to `now`, or `None` if it is not a time expression.
///
/// Accepts `in N minutes|hours|days` (and `in an hour`), and clock times in
/// 12-hour (`5 pm`, `5:30 PM`) or 24-hour (`17:30`, `17`) form. A clock time
/// at or before `now` refers to the next day.
pub fn try_parse_time(expr: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let lowered = expr.trim().to_lowercase();
    let expr = lowered.strip_prefix("at ").unwrap_or(lowered.as_str()).trim();

    if let Some(caps) = relative_re().captures(expr) {
        let amount = match &caps[1] {
            "a" | "an" => 1,
            n => n.parse::<i64>().ok()?,
        };
        let unit = &caps[2];
        let offset = if unit.starts_with('m') {
            Duration::try_minutes(amount)?
        } else if unit.starts_with('h') {
            Duration::try_hours(amount)?
        } else {
            Duration::try_days(amount)?
        };
        return now.checked_add_signed(offset);
    }

    let caps = clock_re().captures(expr)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;

    match caps.get(3).map(|m| m.as_str()) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            let pm = meridiem.starts_with('p');
            hour %= 12;
            if pm {
                hour += 12;
            }
        }
        None if hour > 23 => return None,
        None => {}
    }

    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let mut at = now.date().and_time(time);
    if at <= now {
        at += Duration::days(1);
    }
    Some(at)
}

/// Parse `expr`, falling back to one hour from `now`.
pub fn parse_time(expr: &str, now: NaiveDateTime) -> NaiveDateTime {
    try_parse_time(expr, now).unwrap_or(now + Duration::hours(DEFAULT_OFFSET_HOURS))
}
