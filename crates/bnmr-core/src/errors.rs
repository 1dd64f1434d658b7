//! Structured error types shared across BNMR crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`BnmrError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (run ids, channel names, sizes, etc.).
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

/// Canonical error type for the asymmetry pipeline.
///
/// Recoverable data problems are not errors; they travel as
/// [`DataWarning`](crate::warnings::DataWarning) values next to the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum BnmrError {
    /// Caller supplied an option, rebin factor or channel list that cannot be honoured.
    #[error("invalid input: {0}")]
    InvalidInput(ErrorInfo),
    /// The run lacks data required for the requested calculation.
    #[error("data error: {0}")]
    Data(ErrorInfo),
    /// Runs being combined disagree on mode, area, timing or shape.
    #[error("consistency error: {0}")]
    Consistency(ErrorInfo),
    /// Configuration or serialized payload could not be decoded.
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

impl BnmrError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            BnmrError::InvalidInput(info)
            | BnmrError::Data(info)
            | BnmrError::Consistency(info)
            | BnmrError::Config(info) => info,
        }
    }

    /// Shorthand for an [`BnmrError::InvalidInput`] with no context.
    pub fn invalid_input(code: &str, message: impl Into<String>) -> Self {
        BnmrError::InvalidInput(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`BnmrError::Data`] with no context.
    pub fn data(code: &str, message: impl Into<String>) -> Self {
        BnmrError::Data(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`BnmrError::Consistency`] with no context.
    pub fn consistency(code: &str, message: impl Into<String>) -> Self {
        BnmrError::Consistency(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`BnmrError::Config`] with no context.
    pub fn config(code: &str, message: impl Into<String>) -> Self {
        BnmrError::Config(ErrorInfo::new(code, message))
    }

    /// Rewrites the payload while keeping the error family.
    pub fn map_info(self, f: impl FnOnce(ErrorInfo) -> ErrorInfo) -> Self {
        match self {
            BnmrError::InvalidInput(info) => BnmrError::InvalidInput(f(info)),
            BnmrError::Data(info) => BnmrError::Data(f(info)),
            BnmrError::Consistency(info) => BnmrError::Consistency(f(info)),
            BnmrError::Config(info) => BnmrError::Config(f(info)),
        }
    }
}
