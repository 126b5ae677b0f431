//! Typed error handling for the resolution engine
//!
//! Failures are split by where they can occur in the query lifecycle:
//!
//! - [`ValidationError`]: the query was rejected before execution (parse
//!   failure, missing operation, depth bound exceeded). Always fatal to the
//!   whole query and surfaced as the sole error entry.
//! - [`FieldError`]: a resolver (or a batch dispatch it was waiting on)
//!   failed during execution. Scoped to one field path; siblings keep
//!   resolving.
//! - [`DispatchError`]: a bulk fetch for one loader window failed. Cloneable
//!   so every waiter of that window receives the same failure.
//!
//! Every failure ends up as an [`ErrorEntry`] in the response's `errors`
//! list; nothing is silently dropped.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// One step of a response path: an object field name or a list index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl Serialize for PathSegment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathSegment::Field(name) => serializer.serialize_str(name),
            PathSegment::Index(idx) => serializer.serialize_u64(*idx as u64),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Structured error object carried in the response's `errors` list.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    /// Human-readable error message
    pub message: String,

    /// Response path of the failing field, when the error is field-scoped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Error code for programmatic handling
    pub code: &'static str,
}

// =============================================================================
// Validation errors
// =============================================================================

/// Errors that reject a query before any resolver runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The query text could not be parsed
    Parse { message: String },

    /// The document holds no executable operation
    NoOperation,

    /// The operation kind is not executable by this engine
    UnsupportedOperation { kind: String },

    /// A fragment spread names a fragment the document does not define,
    /// or fragments form a cycle
    InvalidFragment { name: String },

    /// The selection tree nests deeper than the configured bound
    DepthExceeded { depth: usize, max_depth: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Parse { message } => {
                write!(f, "Failed to parse query: {}", message)
            }
            ValidationError::NoOperation => {
                write!(f, "No operation found in query")
            }
            ValidationError::UnsupportedOperation { kind } => {
                write!(f, "{} operations are not supported", kind)
            }
            ValidationError::InvalidFragment { name } => {
                write!(f, "Invalid fragment spread: {}", name)
            }
            ValidationError::DepthExceeded { depth, max_depth } => {
                write!(
                    f,
                    "Query depth {} exceeds the maximum allowed depth of {}",
                    depth, max_depth
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::Parse { .. } => "GRAPHQL_PARSE_FAILED",
            ValidationError::NoOperation => "NO_OPERATION",
            ValidationError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            ValidationError::InvalidFragment { .. } => "INVALID_FRAGMENT",
            ValidationError::DepthExceeded { .. } => "DEPTH_LIMIT_EXCEEDED",
        }
    }

    /// Convert to the sole error entry of a rejected query (no path: the
    /// failure concerns the document, not a field).
    pub fn into_entry(self) -> ErrorEntry {
        ErrorEntry {
            message: self.to_string(),
            path: None,
            code: self.error_code(),
        }
    }
}

// =============================================================================
// Dispatch errors
// =============================================================================

/// Failure of one loader window's bulk fetch.
///
/// Every `load` future pending in the failed window resolves with a clone of
/// the same `DispatchError`; the message is shared rather than copied.
#[derive(Debug, Clone)]
pub struct DispatchError {
    pub key_space: &'static str,
    message: Arc<String>,
}

impl DispatchError {
    pub fn new(key_space: &'static str, source: &anyhow::Error) -> Self {
        Self {
            key_space,
            message: Arc::new(source.to_string()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Batch fetch for '{}' failed: {}",
            self.key_space, self.message
        )
    }
}

impl std::error::Error for DispatchError {}

// =============================================================================
// Field errors
// =============================================================================

/// A failure scoped to one field of the response tree.
///
/// The engine converts these into `null` at the field's position plus an
/// [`ErrorEntry`] carrying the path; resolution of unrelated subtrees
/// continues.
#[derive(Debug, Clone)]
pub struct FieldError {
    pub message: String,
    pub code: &'static str,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: "RESOLVER_FAILED",
        }
    }

    pub fn unknown_field(type_name: &str, field_name: &str) -> Self {
        Self {
            message: format!("Cannot query field '{}' on type '{}'", field_name, type_name),
            code: "UNKNOWN_FIELD",
        }
    }

    pub fn at(self, path: Vec<PathSegment>) -> ErrorEntry {
        ErrorEntry {
            message: self.message,
            path: Some(path),
            code: self.code,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FieldError {}

impl From<anyhow::Error> for FieldError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<DispatchError>() {
            Ok(dispatch) => FieldError::from(dispatch),
            Err(other) => FieldError::new(other.to_string()),
        }
    }
}

impl From<DispatchError> for FieldError {
    fn from(err: DispatchError) -> Self {
        Self {
            message: err.to_string(),
            code: "BATCH_DISPATCH_FAILED",
        }
    }
}
