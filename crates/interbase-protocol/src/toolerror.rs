//! Structured error contract for Demarch tool handlers.
//!
//! Tool handlers return [`ToolError`] instead of flat error strings so
//! agents can distinguish transient from permanent failures and make
//! informed retry decisions. The [`ToolError::wire`] output is the
//! cross-language interoperability contract: field order, enum tokens,
//! and the omit-empty rule for `data` must match the other SDKs exactly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Failure classification for tool handlers.
///
/// A closed set; the wire tokens are the serialized names below and
/// never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Resource doesn't exist.
    NotFound,
    /// Concurrent modification conflict.
    Conflict,
    /// Invalid input or arguments.
    Validation,
    /// Access denied.
    Permission,
    /// Temporary failure, safe to retry.
    Transient,
    /// Unexpected internal error.
    Internal,
}

impl ErrorKind {
    /// Wire token for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Validation => "VALIDATION",
            Self::Permission => "PERMISSION",
            Self::Transient => "TRANSIENT",
            Self::Internal => "INTERNAL",
        }
    }

    /// Default retry hint for this kind. Only transient failures are
    /// recoverable unless the producer overrides the flag.
    pub const fn default_recoverable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error for tool handlers.
///
/// Carries enough context for agents to make retry and fallback
/// decisions. Field declaration order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("[{kind}] {message}")]
pub struct ToolError {
    /// Failure classification.
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Whether the caller may retry.
    pub recoverable: bool,
    /// Optional structured context, omitted from the wire when empty.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl ToolError {
    /// Create an error of the given kind. `recoverable` starts from the
    /// kind's default and can be overridden with [`Self::with_recoverable`].
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recoverable: kind.default_recoverable(),
            data: Map::new(),
        }
    }

    /// Shorthand for [`ErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shorthand for [`ErrorKind::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Shorthand for [`ErrorKind::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Shorthand for [`ErrorKind::Permission`].
    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permission, message)
    }

    /// Shorthand for [`ErrorKind::Transient`].
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    /// Shorthand for [`ErrorKind::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Override the recoverable flag. Returns self for chaining.
    #[must_use]
    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Merge a key/value pair into the data map. Last write wins per
    /// key. Returns self for chaining.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Serialize to the compact JSON wire form.
    ///
    /// Field order is `type, message, recoverable, data`, with `data`
    /// omitted entirely when empty. Every SDK must produce this exact
    /// shape.
    pub fn wire(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"type":"{}","message":"{}","recoverable":{}}}"#,
                self.kind, self.message, self.recoverable
            )
        })
    }

    /// Convert any boxed error into a `ToolError`. If the box already
    /// holds one, that exact instance is returned; otherwise the error's
    /// display text is wrapped as [`ErrorKind::Internal`].
    pub fn wrap(err: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        match err.downcast::<Self>() {
            Ok(tool_error) => *tool_error,
            Err(other) => Self::internal(other.to_string()),
        }
    }

    /// Extract a `ToolError` from an error reference. Returns `None` for
    /// any other error type; no coercion happens here.
    pub fn from_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a Self> {
        err.downcast_ref::<Self>()
    }
}
