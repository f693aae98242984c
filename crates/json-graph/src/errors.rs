//! Error types: the bounded collector filled while loading, and the fatal
//! conditions that abort a load or a serialization.

use std::fmt;

use json_graph_temporal::{DurationError, FormatError};
use thiserror::Error;

use crate::node::NodeKind;

/// Default capacity of the collector used by [`crate::parse_graph`].
pub const DEFAULT_MAX_ERRORS: usize = 64;

/// Array size bound that an array violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeLimit {
    Minimum(usize),
    Maximum(usize),
}

impl fmt::Display for SizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimum(n) => write!(f, "minimum size {n}"),
            Self::Maximum(n) => write!(f, "maximum size {n}"),
        }
    }
}

/// A problem found in the input tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Property is missing: {0}")]
    MissingProperty(String),

    /// `expected` reads as a noun phrase: "an object", "a string", ...
    #[error("Expected {expected}, but got: {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: NodeKind,
    },

    #[error("Expected to match {pattern}, but got: {actual}")]
    PatternMismatch { pattern: String, actual: String },

    /// A registry key rejected by the class's ID pattern.
    #[error("Expected ID to match {pattern}, but got: {id}")]
    IdPatternMismatch { pattern: String, id: String },

    #[error("Reference to an instance of class {class} not found: {id}")]
    ReferenceNotFound { class: String, id: String },

    #[error("Expected to strptime {pattern}, but got: {actual}")]
    TemporalParseFailure { pattern: String, actual: String },

    #[error("Expected a valid IANA time zone, but got: {0}")]
    InvalidTimeZone(String),

    #[error("failed to match the duration: {0}")]
    DurationSyntaxError(String),

    #[error("converting the duration to nanoseconds results in loss of precision: {0}")]
    DurationPrecisionLoss(String),

    #[error("duration overflows as nanoseconds: {0}")]
    DurationOverflow(String),

    /// `bound` is the violated comparison, e.g. `">= 0"` or `"< 10"`.
    #[error("Expected {bound}, but got: {actual}")]
    RangeViolation { bound: String, actual: String },

    #[error("Expected an array of {limit}, but got: {actual}")]
    SizeViolation { limit: SizeLimit, actual: usize },
}

impl From<DurationError> for ErrorKind {
    fn from(err: DurationError) -> Self {
        match err {
            DurationError::Syntax(text) => Self::DurationSyntaxError(text),
            DurationError::PrecisionLoss(text) => Self::DurationPrecisionLoss(text),
            DurationError::Overflow(text) => Self::DurationOverflow(text),
        }
    }
}

/// One collected error located by its structural path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub path: String,
    pub kind: ErrorKind,
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// Ordered, capacity-bounded list of errors.
///
/// Additions beyond the capacity are dropped silently: the cap bounds the
/// cost of reporting on adversarial input, not the number of problems in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Errors {
    cap: usize,
    entries: Vec<ErrorEntry>,
}

impl Errors {
    /// A collector holding at most `cap` entries (at least one).
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, path: impl Into<String>, kind: ErrorKind) {
        if self.is_full() {
            return;
        }
        self.entries.push(ErrorEntry {
            path: path.into(),
            kind,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorEntry> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<ErrorEntry> {
        self.entries
    }
}

impl Default for Errors {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS)
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a ErrorEntry;
    type IntoIter = std::slice::Iter<'a, ErrorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

/// Misuse of the loader by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("expected an empty error collector, but it already holds {0} error(s)")]
    NonEmptyErrors(usize),
}

/// A graph that cannot be serialized because it violates its own invariants.
///
/// Graphs produced by a successful load never trigger these; they signal a
/// graph modified inconsistently after loading or built by hand.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphCorruption {
    #[error("graph has {actual} registries, but the schema defines {expected} classes")]
    RegistryCount { expected: usize, actual: usize },

    #[error("Expected the class instance of {class} to have the ID {key}, but got: {id}")]
    IdMismatch {
        class: String,
        key: String,
        id: String,
    },

    #[error("{path}: reference to a missing instance #{index} of class {class}")]
    DanglingReference {
        path: String,
        class: String,
        index: usize,
    },

    #[error("{path}: value does not match the type {expected}")]
    UnexpectedValue {
        path: String,
        expected: &'static str,
    },

    #[error("{path}: required property is not set: {name}")]
    MissingProperty { path: String, name: String },

    #[error("{path}: {source}")]
    Render {
        path: String,
        #[source]
        source: FormatError,
    },
}
