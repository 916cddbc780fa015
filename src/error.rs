//! Error types for the evaluator
//!
//! Every abrupt `Throw` completion travels through the `Err` arm of a
//! `Result<_, JsError>`. Native error kinds carry only a message; they are
//! materialized into script-visible Error objects when a `catch` clause
//! observes them.

use serde::Serialize;
use thiserror::Error;

use crate::value::JsValue;

/// Source location information for error messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The native error kinds an evaluator can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Type,
    Reference,
    Range,
}

impl ErrorKind {
    /// Name of the matching global constructor (`TypeError`, ...)
    pub fn constructor_name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Range => "RangeError",
        }
    }
}

/// Main error type for the evaluator
#[derive(Debug, Error)]
pub enum JsError {
    #[error("SyntaxError: {message} at {location}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("ReferenceError: {message}")]
    ReferenceError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// An arbitrary script value passed to `throw`
    #[error("Uncaught {}", .value.describe())]
    Thrown { value: JsValue },

    /// Broken interpreter invariant. Never catchable by script code.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JsError {
    pub fn syntax_error(message: impl Into<String>, line: u32, column: u32) -> Self {
        JsError::SyntaxError {
            message: message.into(),
            location: SourceLocation {
                line,
                column,
                length: 1,
            },
        }
    }

    /// Syntax error raised at run time (declaration collisions) where only
    /// a span is known
    pub fn syntax_error_at(message: impl Into<String>, span: crate::lexer::Span) -> Self {
        JsError::SyntaxError {
            message: message.into(),
            location: SourceLocation {
                line: span.line,
                column: span.column,
                length: u32::try_from(span.end.saturating_sub(span.start)).unwrap_or(u32::MAX),
            },
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
        }
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        JsError::ReferenceError {
            message: message.into(),
        }
    }

    /// `ReferenceError: x is not defined`
    pub fn not_defined(name: &str) -> Self {
        JsError::ReferenceError {
            message: format!("{} is not defined", name),
        }
    }

    /// `ReferenceError` for a read inside the temporal dead zone
    pub fn uninitialized(name: &str) -> Self {
        JsError::ReferenceError {
            message: format!("Cannot access '{}' before initialization", name),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    /// A string result would exceed `MAX_STRING_LENGTH`
    pub fn invalid_string_length() -> Self {
        JsError::range_error("Invalid string length")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown { value }
    }

    /// Native kind of this error, if it is not a thrown script value
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            JsError::SyntaxError { .. } => Some(ErrorKind::Syntax),
            JsError::TypeError { .. } => Some(ErrorKind::Type),
            JsError::ReferenceError { .. } => Some(ErrorKind::Reference),
            JsError::RangeError { .. } => Some(ErrorKind::Range),
            JsError::Thrown { .. } | JsError::Internal(_) => None,
        }
    }

    /// Message without the kind prefix
    pub fn message(&self) -> String {
        match self {
            JsError::SyntaxError { message, .. }
            | JsError::TypeError { message }
            | JsError::ReferenceError { message }
            | JsError::RangeError { message }
            | JsError::Internal(message) => message.clone(),
            JsError::Thrown { value } => value.describe(),
        }
    }

    /// Whether a script `catch` clause may observe this error
    pub fn is_catchable(&self) -> bool {
        !matches!(self, JsError::Internal(_))
    }
}
