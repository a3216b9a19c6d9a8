//! Difference between two dates/times

use chrono::{Local, LocalResult, NaiveDateTime, TimeDelta, TimeZone};

use crate::error::{ToolError, ToolResult};

pub const DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

const SECONDS_PER_DAY: i64 = 86_400;

pub fn parse_date(input: &str) -> ToolResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| ToolError::InvalidDate {
        input: input.to_string(),
    })
}

/// Signed delta from a first to a second date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateDelta {
    /// Elapsed seconds, with both dates read as wall-clock time in a zone.
    /// Differs from `calendar_seconds` by the offset change across a
    /// daylight saving transition.
    pub seconds: i64,
    /// Seconds between the two dates as written
    pub calendar_seconds: i64,
}

impl DateDelta {
    /// Delta with both dates taken as local time
    pub fn between(first: NaiveDateTime, second: NaiveDateTime) -> Self {
        Self::between_in(&Local, first, second)
    }

    pub fn between_in<Tz: TimeZone>(tz: &Tz, first: NaiveDateTime, second: NaiveDateTime) -> Self {
        Self {
            seconds: instant(tz, second) - instant(tz, first),
            calendar_seconds: (second - first).num_seconds(),
        }
    }

    /// Whole days, rounded toward negative infinity
    pub fn days(&self) -> i64 {
        self.calendar_seconds.div_euclid(SECONDS_PER_DAY)
    }

    pub fn weeks_and_days(&self) -> (i64, i64) {
        let days = self.days();
        (days.div_euclid(7), days.rem_euclid(7))
    }

    /// `[N day(s), ]H:MM:SS`, where the clock part is always positive
    pub fn clock(&self) -> String {
        let days = self.days();
        let rem = self.calendar_seconds.rem_euclid(SECONDS_PER_DAY);
        let clock = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
        if days == 0 {
            clock
        } else {
            let plural = if days.abs() == 1 { "" } else { "s" };
            format!("{} day{}, {}", days, plural, clock)
        }
    }

    pub fn report(&self) -> String {
        let (weeks, days) = self.weeks_and_days();
        format!(
            "{} seconds\n{} hours.\n{} weeks and {} days.",
            self.seconds,
            self.clock(),
            weeks,
            days
        )
    }
}

/// Unix timestamp of a wall-clock time in `tz`. A repeated hour resolves to
/// its first occurrence; a skipped hour keeps the offset in force before it.
fn instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> i64 {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.timestamp(),
        LocalResult::None => {
            let hour = TimeDelta::hours(1);
            tz.from_local_datetime(&(naive - hour))
                .earliest()
                .map(|t| (t + hour).timestamp())
                .unwrap_or_else(|| naive.and_utc().timestamp())
        }
    }
}
