//! Core error types for todoform.
//!
//! [`TodoformError`] covers request, lookup, validation, configuration and
//! serialization failures. [`ValidationError`] is the one error class the
//! form layer expects and converts into a typed result; every other
//! variant is an unexpected failure and is propagated to the caller.

use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// The category of a single validation failure.
///
/// Serialized as the short snake-case tag returned by [`ErrorKind::as_str`],
/// so an error map rendered to JSON carries e.g. `"kind": "required"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required value was missing or empty.
    Required,
    /// The value could not be cast to the field's type.
    TypeError,
    /// Below a minimum length or value.
    Min,
    /// Above a maximum length or value.
    Max,
    /// A number that must be an integer was not.
    Integer,
    /// A string did not match the field's pattern.
    Matches,
    /// The value was not among the allowed values.
    OneOf,
    /// A named custom test failed.
    Custom(String),
}

impl ErrorKind {
    /// Returns the tag for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::TypeError => "type_error",
            Self::Min => "min",
            Self::Max => "max",
            Self::Integer => "integer",
            Self::Matches => "matches",
            Self::OneOf => "one_of",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A validation failure raised by the schema engine.
///
/// A leaf error describes one violated rule on one field path. When the
/// engine collects every violation instead of stopping at the first, it
/// raises an aggregate error whose [`inner`](ValidationError::inner) list
/// holds the leaves.
///
/// # Examples
///
/// ```
/// use todoform_core::error::{ErrorKind, ValidationError};
///
/// let leaf = ValidationError::new("title is a required field", ErrorKind::Required)
///     .with_path("title");
/// let err = ValidationError::aggregate(vec![leaf]);
/// assert_eq!(err.inner.len(), 1);
/// assert_eq!(err.to_string(), "title is a required field");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// The field path this error belongs to, if any.
    pub path: Option<String>,
    /// The category of the failure.
    pub kind: ErrorKind,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
    /// Per-field sub-errors of an aggregate error.
    pub inner: Vec<Self>,
}

impl ValidationError {
    /// Creates a new leaf `ValidationError` with a message and kind.
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            path: None,
            kind,
            params: HashMap::new(),
            inner: Vec::new(),
        }
    }

    /// Creates an aggregate error from a list of leaf errors.
    ///
    /// A single leaf keeps its own message; several produce
    /// `"<n> errors occurred"`.
    pub fn aggregate(inner: Vec<Self>) -> Self {
        let (message, kind, path) = match inner.as_slice() {
            [only] => (only.message.clone(), only.kind.clone(), only.path.clone()),
            many => (
                format!("{} errors occurred", many.len()),
                ErrorKind::Custom("aggregate".to_string()),
                None,
            ),
        };
        Self {
            message,
            path,
            kind,
            params: HashMap::new(),
            inner,
        }
    }

    /// Sets the field path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns the leaf errors: `inner` for an aggregate, `self` otherwise.
    pub fn leaves(&self) -> Vec<&Self> {
        if self.inner.is_empty() {
            vec![self]
        } else {
            self.inner.iter().collect()
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for todoform.
///
/// Each variant maps to an HTTP status code via [`TodoformError::status_code`],
/// which the todo actions use when turning an error into a failed response.
#[derive(Error, Debug)]
pub enum TodoformError {
    // ── Request errors ───────────────────────────────────────────────

    /// HTTP 400 Bad Request (malformed submission, oversized upload).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Store errors ─────────────────────────────────────────────────

    /// A lookup by key found no record.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    /// The schema itself is broken or a schema test failed unexpectedly.
    #[error("Schema error: {0}")]
    SchemaError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TodoformError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `ValidationError` -> 400
    /// - `NotFound`, `DoesNotExist` -> 404
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) => 400,
            Self::NotFound(_) | Self::DoesNotExist(_) => 404,
            Self::InternalServerError(_)
            | Self::SchemaError(_)
            | Self::ConfigurationError(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }
}

impl From<ValidationError> for TodoformError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

impl From<serde_json::Error> for TodoformError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, TodoformError>`.
pub type TodoformResult<T> = Result<T, TodoformError>;
