// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for dictionary parsing and data-object access.

use std::fmt;
use thiserror::Error;

/// Result type for dictionary parsing
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by include resolvers
pub type ResolveError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Position of a construct in a dictionary source (1-based line)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source_name: String,
    pub line: usize,
}

impl Location {
    pub fn new(source_name: impl Into<String>, line: usize) -> Self {
        Self {
            source_name: source_name.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_name, self.line)
    }
}

/// Errors that abort a dictionary parse
#[derive(Error, Debug)]
pub enum Error {
    /// Line does not match any shape expected in the current parser state
    #[error("{location}: syntax error: {message}")]
    Syntax { location: Location, message: String },

    /// Unterminated object, conflicting bounds, short extensible group, ...
    #[error("{location}: structural error: {message}")]
    Structural { location: Location, message: String },

    /// Duplicate object name or remove-object naming an absent object
    #[error("{location}: reference error: {message}")]
    Reference { location: Location, message: String },

    /// Included fragment could not be resolved
    #[error("{location}: cannot include '{name}': {cause}")]
    IncludeResolution {
        location: Location,
        name: String,
        #[source]
        cause: ResolveError,
    },
}

impl Error {
    pub fn syntax(location: Location, message: impl Into<String>) -> Self {
        Error::Syntax {
            location,
            message: message.into(),
        }
    }

    pub fn structural(location: Location, message: impl Into<String>) -> Self {
        Error::Structural {
            location,
            message: message.into(),
        }
    }

    pub fn reference(location: Location, message: impl Into<String>) -> Self {
        Error::Reference {
            location,
            message: message.into(),
        }
    }

    pub fn include(location: Location, name: impl Into<String>, cause: ResolveError) -> Self {
        Error::IncludeResolution {
            location,
            name: name.into(),
            cause,
        }
    }

    /// Where in the dictionary sources the failure was detected
    pub fn location(&self) -> &Location {
        match self {
            Error::Syntax { location, .. }
            | Error::Structural { location, .. }
            | Error::Reference { location, .. }
            | Error::IncludeResolution { location, .. } => location,
        }
    }
}

/// Errors raised by the generic data-object accessors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("field index {index} is out of range for object '{object}'")]
    OutOfRange { object: String, index: usize },

    #[error("field '{field}' is not numeric")]
    NotNumeric { field: String },

    #[error("value '{value}' for field '{field}' is not a number")]
    InvalidNumber { field: String, value: String },

    #[error("value {value} for field '{field}' is below its minimum {bound}")]
    BelowMinimum {
        field: String,
        value: f64,
        bound: String,
    },

    #[error("value {value} for field '{field}' is above its maximum {bound}")]
    AboveMaximum {
        field: String,
        value: f64,
        bound: String,
    },

    #[error("value '{value}' is not a valid key for field '{field}'")]
    InvalidKey { field: String, value: String },

    #[error("field '{field}' is not {kind}")]
    NotAutomatic { field: String, kind: &'static str },

    #[error("object '{object}' is not extensible")]
    NotExtensible { object: String },

    #[error("extensible group for object '{object}' takes {expected} values, got {actual}")]
    GroupSize {
        object: String,
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_carries_location() {
        let err = Error::syntax(Location::new("Energy+.idd", 42), "expected field marker");
        assert_eq!(
            err.to_string(),
            "Energy+.idd:42: syntax error: expected field marker"
        );
        assert_eq!(err.location().line, 42);
    }

    #[test]
    fn test_include_error_keeps_cause() {
        let cause: ResolveError = "no such fragment".into();
        let err = Error::include(Location::new("main.idd", 3), "extra.idd", cause);
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("no such fragment"));
        assert!(err.to_string().contains("cannot include 'extra.idd'"));
    }
}
