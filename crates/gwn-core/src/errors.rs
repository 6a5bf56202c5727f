//! Structured error types shared across the gwn crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`NestError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, field names, bounds, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the sampling and prior crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum NestError {
    /// A checkpoint artifact exists but cannot be decoded into a run state.
    #[error("storage corruption: {0}")]
    Corruption(ErrorInfo),
    /// Reading, writing or removing an artifact failed.
    #[error("storage error: {0}")]
    Storage(ErrorInfo),
    /// Unknown coordinate or cosmology name.
    #[error("coordinate error: {0}")]
    Coordinate(ErrorInfo),
    /// Prior bounds are not a valid increasing range.
    #[error("bounds error: {0}")]
    Bounds(ErrorInfo),
    /// Numerical inversion, integration or tabulation failed.
    #[error("numeric error: {0}")]
    Numeric(ErrorInfo),
    /// The external sampler or result assembly reported a failure.
    #[error("sampler error: {0}")]
    Sampler(ErrorInfo),
    /// Invalid run configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl NestError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            NestError::Corruption(info)
            | NestError::Storage(info)
            | NestError::Coordinate(info)
            | NestError::Bounds(info)
            | NestError::Numeric(info)
            | NestError::Sampler(info)
            | NestError::Config(info) => info,
        }
    }

    /// Returns true when the error signals an unreadable checkpoint artifact.
    pub fn is_corruption(&self) -> bool {
        matches!(self, NestError::Corruption(_))
    }
}
