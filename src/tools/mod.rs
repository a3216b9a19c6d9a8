//! Standalone converters that do not walk a directory tree

pub mod deltadate;
pub mod luhn;
pub mod prtime;

pub use deltadate::{parse_date, DateDelta, DATE_FORMAT};
pub use luhn::luhn_is_valid;
pub use prtime::{convert_prtime, parse_prtime, PrTime, PRTIME_CSV_HEADER};
