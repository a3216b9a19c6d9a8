//! PRTime conversion
//!
//! PRTime is a signed 64-bit count of microseconds since midnight
//! 1 January 1970 UTC, as used in Mozilla profiles.

use chrono::{DateTime, Local, NaiveDateTime, Timelike, Utc};

use crate::error::{ToolError, ToolResult};

pub const PRTIME_CSV_HEADER: &str = "prtime, localtime, utctime";

/// A PRTime value and its UTC instant, if representable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrTime {
    pub prtime: i64,
    pub utc: Option<DateTime<Utc>>,
}

impl PrTime {
    pub fn local(&self) -> Option<DateTime<Local>> {
        self.utc.map(|utc| utc.with_timezone(&Local))
    }

    /// `prtime, localtime, utctime`
    pub fn csv_line(&self) -> String {
        let local = self
            .local()
            .map(|dt| format_naive(dt.naive_local()))
            .unwrap_or_else(|| "invalid".to_string());
        let utc = self
            .utc
            .map(|dt| format_naive(dt.naive_utc()))
            .unwrap_or_else(|| "invalid".to_string());
        format!("{}, {}, {}", self.prtime, local, utc)
    }
}

pub fn convert_prtime(prtime: i64) -> PrTime {
    PrTime {
        prtime,
        utc: DateTime::<Utc>::from_timestamp_micros(prtime),
    }
}

pub fn parse_prtime(input: &str) -> ToolResult<i64> {
    input.trim().parse::<i64>().map_err(|_| ToolError::InvalidPrtime {
        input: input.trim().to_string(),
    })
}

/// Seconds precision unless there is a sub-second part
fn format_naive(dt: NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}
