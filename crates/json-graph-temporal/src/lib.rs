//! Temporal scalar codecs for json-graph.
//!
//! - [`StrftimeFormat`]: validated strftime patterns for dates, times and
//!   datetimes, parsed and rendered through `chrono`.
//! - [`Duration`]: ISO 8601 durations as a signed nanosecond count with
//!   overflow-checked parsing.

mod duration;
mod error;
mod strftime;

pub use duration::{
    Duration, DAYS_PER_MONTH, DAYS_PER_WEEK, DAYS_PER_YEAR, NANOS_PER_DAY, NANOS_PER_HOUR,
    NANOS_PER_MINUTE, NANOS_PER_SECOND,
};
pub use error::{DurationError, FormatError, TemporalError};
pub use strftime::{
    tokenize, StrftimeFormat, TemporalKind, Token, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT,
    DEFAULT_TIME_FORMAT,
};
