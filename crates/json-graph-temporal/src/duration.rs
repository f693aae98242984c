//! ISO 8601 durations as a signed count of nanoseconds.
//!
//! Grammar: `[+-]?P(nY)?(nM)?(nW)?(nD)?(T(nH)?(nM)?(s(.f)?S)?)?` where every
//! `n` may carry a decimal fraction and the seconds fraction `f` holds at most
//! nine digits.
//!
//! Calendar units are converted with fixed lengths:
//!
//! - a year is 365.2425 days (the mean Gregorian year),
//! - a month is 30.436875 days (exactly 1/12 of a year),
//! - a week is 7 days and a day is 24 hours.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::DurationError;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
pub const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
pub const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

pub const DAYS_PER_YEAR: f64 = 365.2425;
pub const DAYS_PER_MONTH: f64 = 30.436875;
pub const DAYS_PER_WEEK: f64 = 7.0;

const HOURS_PER_DAY: f64 = 24.0;
const NANOS_PER_MINUTE_F: f64 = 6e10;
const NANOS_PER_HOUR_F: f64 = 3.6e12;

/// 2^63, the first `f64` above `i64::MAX`.
const I64_BOUND_F: f64 = 9_223_372_036_854_775_808.0;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<sign>\+|-)?P",
        r"((?P<years>(0|[1-9][0-9]*)(\.[0-9]+)?)Y)?",
        r"((?P<months>(0|[1-9][0-9]*)(\.[0-9]+)?)M)?",
        r"((?P<weeks>(0|[1-9][0-9]*)(\.[0-9]+)?)W)?",
        r"((?P<days>(0|[1-9][0-9]*)(\.[0-9]+)?)D)?",
        r"(T",
        r"((?P<hours>(0|[1-9][0-9]*)(\.[0-9]+)?)H)?",
        r"((?P<minutes>(0|[1-9][0-9]*)(\.[0-9]+)?)M)?",
        r"(((?P<seconds>0|[1-9][0-9]*)(\.(?P<fraction>[0-9]+))?)S)?",
        r")?$",
    ))
    .expect("duration grammar is a valid regex")
});

/// Signed duration with nanosecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    nanos: i64,
}

impl Duration {
    pub const ZERO: Duration = Duration { nanos: 0 };

    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    pub const fn as_nanos(&self) -> i64 {
        self.nanos
    }

    pub const fn is_negative(&self) -> bool {
        self.nanos < 0
    }

    /// Convert to an unsigned `std::time::Duration`; `None` for negative values.
    pub fn to_std(&self) -> Option<std::time::Duration> {
        u64::try_from(self.nanos)
            .ok()
            .map(std::time::Duration::from_nanos)
    }

    /// Parse the textual form; see the module docs for the grammar.
    pub fn parse(text: &str) -> Result<Self, DurationError> {
        let caps = DURATION_RE
            .captures(text)
            .ok_or_else(|| DurationError::Syntax(text.to_string()))?;

        let fraction = match caps.name("fraction") {
            None => 0,
            Some(m) => {
                let digits = m.as_str();
                if digits.len() > 9 {
                    return Err(DurationError::PrecisionLoss(text.to_string()));
                }
                let count: i64 = digits
                    .parse()
                    .map_err(|_| DurationError::Syntax(text.to_string()))?;
                count * 10_i64.pow(9 - digits.len() as u32)
            }
        };

        let seconds: i64 = match caps.name("seconds") {
            None => 0,
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| DurationError::Overflow(text.to_string()))?,
        };

        let overflow = || DurationError::Overflow(text.to_string());

        if seconds > i64::MAX / NANOS_PER_SECOND {
            return Err(overflow());
        }
        let mut sum = fraction
            .checked_add(seconds * NANOS_PER_SECOND)
            .ok_or_else(overflow)?;

        let minutes = unit(&caps, "minutes", text)?;
        let hours = unit(&caps, "hours", text)?;
        let days = unit(&caps, "days", text)?;
        let weeks = unit(&caps, "weeks", text)?;
        let months = unit(&caps, "months", text)?;
        let years = unit(&caps, "years", text)?;

        let magnitudes = [
            minutes * NANOS_PER_MINUTE_F,
            hours * NANOS_PER_HOUR_F,
            days * HOURS_PER_DAY * NANOS_PER_HOUR_F,
            weeks * DAYS_PER_WEEK * HOURS_PER_DAY * NANOS_PER_HOUR_F,
            months * DAYS_PER_MONTH * HOURS_PER_DAY * NANOS_PER_HOUR_F,
            years * DAYS_PER_YEAR * HOURS_PER_DAY * NANOS_PER_HOUR_F,
        ];
        for magnitude in magnitudes {
            sum = add_magnitude(sum, magnitude).ok_or_else(overflow)?;
        }

        // `sum` lies in 0..=i64::MAX, which negates without overflow.
        if caps.name("sign").is_some_and(|m| m.as_str() == "-") {
            sum = -sum;
        }

        Ok(Self { nanos: sum })
    }
}

fn unit(caps: &Captures<'_>, name: &str, text: &str) -> Result<f64, DurationError> {
    match caps.name(name) {
        None => Ok(0.0),
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| DurationError::Syntax(text.to_string())),
    }
}

/// Add a non-negative float magnitude to a non-negative sum, `None` on overflow.
fn add_magnitude(sum: i64, magnitude: f64) -> Option<i64> {
    debug_assert!(sum >= 0);
    debug_assert!(magnitude >= 0.0);
    if magnitude >= I64_BOUND_F {
        return None;
    }
    sum.checked_add(magnitude as i64)
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `unsigned_abs` keeps `i64::MIN` representable.
        let magnitude = self.nanos.unsigned_abs();

        let days = magnitude / NANOS_PER_DAY as u64;
        let mut rest = magnitude % NANOS_PER_DAY as u64;
        let hours = rest / NANOS_PER_HOUR as u64;
        rest %= NANOS_PER_HOUR as u64;
        let minutes = rest / NANOS_PER_MINUTE as u64;
        rest %= NANOS_PER_MINUTE as u64;
        let seconds = rest / NANOS_PER_SECOND as u64;
        let nanos = rest % NANOS_PER_SECOND as u64;

        if self.nanos < 0 {
            f.write_str("-")?;
        }
        f.write_str("P")?;

        if days > 0 {
            write!(f, "{days}D")?;
        }

        if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 {
            f.write_str("T")?;
            if hours > 0 {
                write!(f, "{hours}H")?;
            }
            if minutes > 0 {
                write!(f, "{minutes}M")?;
            }
            if nanos == 0 {
                if seconds > 0 {
                    write!(f, "{seconds}S")?;
                }
            } else {
                let digits = format!("{nanos:09}");
                write!(f, "{seconds}.{}S", digits.trim_end_matches('0'))?;
            }
        }

        Ok(())
    }
}
