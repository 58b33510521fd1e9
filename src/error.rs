//! Error taxonomy and the boundary mapper.
//!
//! Every failure leaving the engine is reduced to an [`ErrorInfo`]
//! (`{code, message}`) by [`to_error_result`]. The mapping is total:
//! handler-supplied [`SchemaError`]s pass through, [`ParseError`]s map by the
//! pass that produced them, anything else becomes `ERR_NOT_SPECIFIED` without
//! leaking its text.

use crate::schema::Kind;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ERR_INVALID_PARAMS: &str = "ERR_INVALID_PARAMS";
pub const ERR_INVALID_QUERY: &str = "ERR_INVALID_QUERY";
pub const ERR_INVALID_BODY: &str = "ERR_INVALID_BODY";
pub const ERR_VALIDATION_FAILED: &str = "ERR_VALIDATION_FAILED";
pub const ERR_MISSING_REQUIRED: &str = "ERR_MISSING_REQUIRED";
pub const ERR_INVALID_JSON: &str = "ERR_INVALID_JSON";
pub const ERR_NOT_SPECIFIED: &str = "ERR_NOT_SPECIFIED";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";

const INVALID_JSON_MESSAGE: &str = "Request body contains invalid JSON";
const UNKNOWN_MESSAGE: &str = "An unknown exception occurred";

/// Assignment pass that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Params,
    Query,
    Body,
}

impl Stage {
    fn code(self) -> &'static str {
        match self {
            Stage::Params => ERR_INVALID_PARAMS,
            Stage::Query => ERR_INVALID_QUERY,
            Stage::Body => ERR_INVALID_BODY,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Stage::Params => "param",
            Stage::Query => "query parameter",
            Stage::Body => "body field",
        }
    }
}

/// Structured failure of [`crate::parser::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Field absent, no default, and marked required
    MissingRequired { stage: Stage, field: String },
    /// Raw value cannot convert to the declared kind
    InvalidConversion {
        stage: Stage,
        field: String,
        value: String,
        expected: Kind,
    },
    /// Body bytes are not a JSON document
    InvalidJson { reason: String },
    /// Constraint rule violated after assignment
    ValidationFailed { field: String, rule: String },
}

impl ParseError {
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::MissingRequired { .. } => ERR_MISSING_REQUIRED,
            ParseError::InvalidConversion { stage, .. } => stage.code(),
            ParseError::InvalidJson { .. } => ERR_INVALID_JSON,
            ParseError::ValidationFailed { .. } => ERR_VALIDATION_FAILED,
        }
    }

    /// Caller-facing message. JSON decoder detail is never included.
    pub fn message(&self) -> String {
        match self {
            ParseError::InvalidJson { .. } => INVALID_JSON_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRequired { stage, field } => {
                write!(f, "required {} '{}' is missing", stage.noun(), field)
            }
            ParseError::InvalidConversion {
                stage,
                field,
                value,
                expected,
            } => write!(
                f,
                "invalid value '{}' for {} '{}': expected {}",
                value,
                stage.noun(),
                field,
                expected
            ),
            ParseError::InvalidJson { reason } => write!(f, "invalid JSON body: {}", reason),
            ParseError::ValidationFailed { field, rule } => write!(
                f,
                "Field validation for '{}' failed on the '{}' rule",
                field, rule
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Handler-supplied error carried to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub code: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(UNAUTHORIZED, message)
    }

    pub fn user_not_found() -> Self {
        Self::new("ERR_USER_NOT_FOUND", "User not found")
    }

    pub fn invalid_request() -> Self {
        Self::new("ERR_INVALID_REQUEST", "Invalid request")
    }

    pub fn forbidden() -> Self {
        Self::new("ERR_FORBIDDEN", "Access forbidden")
    }

    pub fn unauthorized_access() -> Self {
        Self::new("ERR_UNAUTHORIZED", "Unauthorized access")
    }

    pub fn internal() -> Self {
        Self::new("ERR_INTERNAL", "Internal server error")
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for SchemaError {}

/// The uniform `{code, message}` error shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl From<&SchemaError> for ErrorInfo {
    fn from(err: &SchemaError) -> Self {
        Self {
            code: err.code.clone(),
            message: err.message.clone(),
        }
    }
}

impl From<&ParseError> for ErrorInfo {
    fn from(err: &ParseError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.message(),
        }
    }
}

/// Map any error to its `{code, message}` pair.
pub fn to_error_result(err: &anyhow::Error) -> ErrorInfo {
    if let Some(user) = err.downcast_ref::<SchemaError>() {
        return user.into();
    }
    if let Some(parse) = err.downcast_ref::<ParseError>() {
        return parse.into();
    }
    ErrorInfo {
        code: ERR_NOT_SPECIFIED.to_string(),
        message: UNKNOWN_MESSAGE.to_string(),
    }
}
