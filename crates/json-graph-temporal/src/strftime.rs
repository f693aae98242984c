//! Strftime patterns for dates, times of day and datetimes.
//!
//! Only a portable subset of the strftime directives is accepted so that a
//! pattern means the same thing on every consumer of the serialized tree.
//! A UTC offset (`%z`) is accepted in datetime patterns only; time zone names
//! (`%Z`) are not supported.
//!
//! Parsing follows strptime: fields the pattern does not mention take their
//! defaults (year 1900, January, the 1st, midnight), and a 12-hour clock
//! without a meridian reads as AM.

use std::fmt::{self, Write};

use chrono::format::{parse, ParseResult, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{FormatError, TemporalError};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const DATE_DIRECTIVES: &[char] = &['a', 'A', 'b', 'B', 'd', 'e', 'm', 'y', 'Y', '%'];
const TIME_DIRECTIVES: &[char] = &['H', 'I', 'l', 'M', 'P', 'p', 'S', '%'];
const OFFSET_DIRECTIVES: &[char] = &['z'];

const DEFAULT_YEAR: i64 = 1900;

/// Which temporal value a pattern describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Time,
    Datetime,
}

impl fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
        })
    }
}

/// A lexed piece of a strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    /// Directive letter without the leading `%`; `%%` is `Directive('%')`.
    Directive(char),
}

/// Split a pattern into literal text and directives.
///
/// A `%` must be followed by an ASCII letter or another `%`.
pub fn tokenize(pattern: &str) -> Result<Vec<Token>, FormatError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = pattern.char_indices();
    while let Some((pos, c)) = chars.next() {
        if c != '%' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some((_, d)) if d.is_ascii_alphabetic() || d == '%' => {
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                tokens.push(Token::Directive(d));
            }
            _ => return Err(FormatError::Dangling(pos)),
        }
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(tokens)
}

fn is_supported(directive: char) -> bool {
    DATE_DIRECTIVES.contains(&directive)
        || TIME_DIRECTIVES.contains(&directive)
        || OFFSET_DIRECTIVES.contains(&directive)
}

/// Distinct directive letters of a pattern, `%%` excluded.
fn directives_of(tokens: &[Token]) -> Vec<char> {
    let mut directives = Vec::new();
    for token in tokens {
        if let Token::Directive(d) = token {
            if *d != '%' && !directives.contains(d) {
                directives.push(*d);
            }
        }
    }
    directives
}

/// A strftime pattern validated for one [`TemporalKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrftimeFormat {
    kind: TemporalKind,
    pattern: String,
    directives: Vec<char>,
}

impl StrftimeFormat {
    pub fn new(kind: TemporalKind, pattern: impl Into<String>) -> Result<Self, FormatError> {
        let pattern = pattern.into();
        let tokens = tokenize(&pattern)?;

        let mut unsupported: Vec<String> = Vec::new();
        for token in &tokens {
            if let Token::Directive(d) = token {
                let directive = format!("%{d}");
                if !is_supported(*d) && !unsupported.contains(&directive) {
                    unsupported.push(directive);
                }
            }
        }
        if !unsupported.is_empty() {
            return Err(FormatError::UnsupportedDirectives(unsupported.join(", ")));
        }

        let allowed = match kind {
            TemporalKind::Date => Some(DATE_DIRECTIVES),
            TemporalKind::Time => Some(TIME_DIRECTIVES),
            TemporalKind::Datetime => None,
        };
        if let Some(allowed) = allowed {
            if tokens.is_empty() {
                return Err(FormatError::Empty);
            }
            for token in &tokens {
                if let Token::Directive(d) = token {
                    if !allowed.contains(d) {
                        return Err(FormatError::UnexpectedDirective {
                            directive: format!("%{d}"),
                            kind,
                        });
                    }
                }
            }
        }

        Ok(Self {
            kind,
            directives: directives_of(&tokens),
            pattern,
        })
    }

    pub fn date(pattern: impl Into<String>) -> Result<Self, FormatError> {
        Self::new(TemporalKind::Date, pattern)
    }

    pub fn time(pattern: impl Into<String>) -> Result<Self, FormatError> {
        Self::new(TemporalKind::Time, pattern)
    }

    pub fn datetime(pattern: impl Into<String>) -> Result<Self, FormatError> {
        Self::new(TemporalKind::Datetime, pattern)
    }

    /// The ISO 8601 pattern used when a schema does not name one.
    pub fn default_for(kind: TemporalKind) -> Self {
        let pattern = match kind {
            TemporalKind::Date => DEFAULT_DATE_FORMAT,
            TemporalKind::Time => DEFAULT_TIME_FORMAT,
            TemporalKind::Datetime => DEFAULT_DATETIME_FORMAT,
        };
        Self {
            kind,
            pattern: pattern.to_string(),
            directives: tokenize(pattern)
                .map(|tokens| directives_of(&tokens))
                .unwrap_or_default(),
        }
    }

    pub fn kind(&self) -> TemporalKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern carries a UTC offset (`%z`).
    pub fn has_offset(&self) -> bool {
        self.has(&['z'])
    }

    fn has(&self, any_of: &[char]) -> bool {
        any_of.iter().any(|d| self.directives.contains(d))
    }

    fn mismatch(&self, text: &str) -> TemporalError {
        TemporalError {
            pattern: self.pattern.clone(),
            text: text.to_string(),
        }
    }

    /// Read `text` into chrono's field bag and fill in what the pattern
    /// leaves out. The pattern has to consume the whole string.
    fn parsed(&self, text: &str) -> ParseResult<Parsed> {
        let mut parsed = Parsed::new();
        parse(&mut parsed, text, StrftimeItems::new(&self.pattern))?;

        if !self.has(&['Y', 'y']) {
            parsed.set_year(DEFAULT_YEAR)?;
        }
        if !self.has(&['m', 'b', 'B']) {
            parsed.set_month(1)?;
        }
        if !self.has(&['d', 'e']) {
            parsed.set_day(1)?;
        }

        let twelve_hour = self.has(&['I', 'l']);
        let meridian = self.has(&['p', 'P']);
        if twelve_hour && !meridian {
            parsed.set_ampm(false)?;
        }
        if !twelve_hour && !self.has(&['H']) {
            if meridian {
                parsed.set_hour12(12)?;
            } else {
                parsed.set_hour(0)?;
            }
        }
        if !self.has(&['M']) {
            parsed.set_minute(0)?;
        }
        if !self.has(&['S']) {
            parsed.set_second(0)?;
        }
        if !self.has_offset() {
            parsed.set_offset(0)?;
        }
        Ok(parsed)
    }

    pub fn parse_date(&self, text: &str) -> Result<NaiveDate, TemporalError> {
        self.parsed(text)
            .and_then(|p| p.to_naive_date())
            .map_err(|_| self.mismatch(text))
    }

    pub fn parse_time(&self, text: &str) -> Result<NaiveTime, TemporalError> {
        self.parsed(text)
            .and_then(|p| p.to_naive_time())
            .map_err(|_| self.mismatch(text))
    }

    /// Parse a datetime as written, dropping any offset in the text.
    pub fn parse_datetime(&self, text: &str) -> Result<NaiveDateTime, TemporalError> {
        self.parsed(text)
            .and_then(|p| p.to_naive_datetime_with_offset(0))
            .map_err(|_| self.mismatch(text))
    }

    /// Parse a datetime together with its UTC offset; a pattern without
    /// `%z` reads as UTC.
    pub fn parse_offset_datetime(
        &self,
        text: &str,
    ) -> Result<DateTime<FixedOffset>, TemporalError> {
        self.parsed(text)
            .and_then(|p| p.to_datetime())
            .map_err(|_| self.mismatch(text))
    }

    pub fn format_date(&self, value: &NaiveDate) -> Result<String, FormatError> {
        self.render(value.format(&self.pattern))
    }

    pub fn format_time(&self, value: &NaiveTime) -> Result<String, FormatError> {
        self.render(value.format(&self.pattern))
    }

    pub fn format_datetime(&self, value: &NaiveDateTime) -> Result<String, FormatError> {
        self.render(value.format(&self.pattern))
    }

    pub fn format_offset_datetime(
        &self,
        value: &DateTime<FixedOffset>,
    ) -> Result<String, FormatError> {
        self.render(value.format(&self.pattern))
    }

    // Rendering goes through `write!` so that a directive the value cannot
    // supply surfaces as an error instead of a panic in `to_string`.
    fn render(&self, display: impl fmt::Display) -> Result<String, FormatError> {
        if self.pattern.is_empty() {
            return Ok(String::new());
        }
        let mut out = String::new();
        write!(out, "{display}").map_err(|_| FormatError::Render {
            kind: self.kind,
            pattern: self.pattern.clone(),
        })?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_mixes_text_and_directives() {
        assert_eq!(
            tokenize("%Y-%m-%d %%").unwrap(),
            vec![
                Token::Directive('Y'),
                Token::Text("-".into()),
                Token::Directive('m'),
                Token::Text("-".into()),
                Token::Directive('d'),
                Token::Text(" ".into()),
                Token::Directive('%'),
            ]
        );
        assert_eq!(tokenize("").unwrap(), Vec::<Token>::new());
    }

    #[test]
    fn tokenize_rejects_dangling_percent() {
        assert_eq!(tokenize("%Y-%"), Err(FormatError::Dangling(3)));
        assert_eq!(tokenize("%1"), Err(FormatError::Dangling(0)));
    }

    #[test]
    fn unsupported_directives_are_listed_once() {
        let err = StrftimeFormat::datetime("%j %Q %j").unwrap_err();
        assert_eq!(err, FormatError::UnsupportedDirectives("%j, %Q".into()));
        assert!(StrftimeFormat::datetime("%Z").is_err());
        assert!(StrftimeFormat::datetime("%z").unwrap().has_offset());
        assert_eq!(
            StrftimeFormat::time("%H%z"),
            Err(FormatError::UnexpectedDirective {
                directive: "%z".into(),
                kind: TemporalKind::Time
            })
        );
    }

    #[test]
    fn date_rejects_time_directives() {
        let err = StrftimeFormat::date("%Y-%m-%d %H").unwrap_err();
        assert_eq!(
            err,
            FormatError::UnexpectedDirective {
                directive: "%H".into(),
                kind: TemporalKind::Date
            }
        );
        assert!(StrftimeFormat::time("%H:%M %Y").is_err());
    }

    #[test]
    fn empty_pattern_only_for_datetime() {
        assert_eq!(StrftimeFormat::date(""), Err(FormatError::Empty));
        assert_eq!(StrftimeFormat::time(""), Err(FormatError::Empty));
        let dt = StrftimeFormat::datetime("").unwrap();
        let value = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(dt.format_datetime(&value).unwrap(), "");
        let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(dt.parse_datetime("").unwrap(), epoch);
        assert!(dt.parse_datetime("x").is_err());
    }

    #[test]
    fn directives_are_collected_once() {
        let fmt = StrftimeFormat::datetime("%H:%M %H %% %z").unwrap();
        assert_eq!(fmt.directives, vec!['H', 'M', 'z']);
        let default = StrftimeFormat::default_for(TemporalKind::Time);
        assert_eq!(default.directives, vec!['H', 'M', 'S']);
    }

    #[test]
    fn default_formats() {
        let date = StrftimeFormat::default_for(TemporalKind::Date);
        assert_eq!(date.pattern(), "%Y-%m-%d");
        let parsed = date.parse_date("2016-07-03").unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2016, 7, 3).unwrap());
        assert_eq!(date.format_date(&parsed).unwrap(), "2016-07-03");
    }

    #[test]
    fn parse_requires_whole_string() {
        let date = StrftimeFormat::date("%Y-%m-%d").unwrap();
        let err = date.parse_date("2016-07-03 garbage").unwrap_err();
        assert_eq!(err.pattern, "%Y-%m-%d");
        assert_eq!(err.text, "2016-07-03 garbage");
        assert_eq!(
            err.to_string(),
            "expected to strptime %Y-%m-%d, but got: 2016-07-03 garbage"
        );
    }
}
