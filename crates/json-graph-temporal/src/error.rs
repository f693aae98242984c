//! Error types of the temporal codecs.

use thiserror::Error;

use crate::strftime::TemporalKind;

/// Failure to parse an ISO 8601 duration into nanoseconds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("failed to match the duration: {0}")]
    Syntax(String),
    #[error("converting the duration to nanoseconds results in loss of precision: {0}")]
    PrecisionLoss(String),
    #[error("duration overflows as nanoseconds: {0}")]
    Overflow(String),
}

/// Invalid strftime pattern.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported directive(s): {0}")]
    UnsupportedDirectives(String),
    #[error("unexpected directive {directive:?} in a {kind} format")]
    UnexpectedDirective {
        directive: String,
        kind: TemporalKind,
    },
    #[error("unexpected empty format")]
    Empty,
    #[error("dangling '%' at byte {0}")]
    Dangling(usize),
    #[error("failed to render a {kind} with the format {pattern:?}")]
    Render { kind: TemporalKind, pattern: String },
}

/// Text that does not match a strftime pattern in its entirety.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("expected to strptime {pattern}, but got: {text}")]
pub struct TemporalError {
    pub pattern: String,
    pub text: String,
}
