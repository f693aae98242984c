//! Schema construction errors.

use std::fmt;

use thiserror::Error;

/// One problem found in a schema, located by a reference path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{ref_}: {message}")]
pub struct SchemaError {
    pub ref_: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(ref_: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ref_: ref_.into(),
            message: message.into(),
        }
    }
}

/// All problems found while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaErrors(pub Vec<SchemaError>);

impl SchemaErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SchemaError> {
        self.0.iter()
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

impl From<Vec<SchemaError>> for SchemaErrors {
    fn from(errors: Vec<SchemaError>) -> Self {
        Self(errors)
    }
}
