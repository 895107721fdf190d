//! Error taxonomy of the generator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Diagnostic carried by every [`RangeError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Kebab-case code, stable across releases.
    pub code: String,
    /// One-line description.
    pub message: String,
    /// Offending values keyed by name (node ids, sizes, limits, paths).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested fix, shown after the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Diagnostic with no context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records `key = value`.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Attaches a suggested fix.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " {{{key}={value}")?;
            for (key, value) in pairs {
                write!(f, ", {key}={value}")?;
            }
            write!(f, "}}")?;
        }
        match &self.hint {
            Some(hint) => write!(f, " (hint: {hint})"),
            None => Ok(()),
        }
    }
}

/// Every failure the generator reports.
///
/// A structural dead end (pool exhausted, bins saturated) is not an error and
/// never surfaces here; phases report it through their own outcome enums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum RangeError {
    /// Invalid user supplied parameters. No output is produced.
    #[error("configuration error: {0}")]
    Configuration(ErrorInfo),
    /// Storage could not grow. Fatal, there is no partial output.
    #[error("resource exhaustion: {0}")]
    Resource(ErrorInfo),
    /// The emitted document disagrees with the bookkeeping that produced it.
    #[error("invariant violation: {0}")]
    Invariant(ErrorInfo),
    /// Serialization of reports and summaries.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl RangeError {
    /// Diagnostic of any variant.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            RangeError::Configuration(info)
            | RangeError::Resource(info)
            | RangeError::Invariant(info)
            | RangeError::Serde(info) => info,
        }
    }

    /// [`RangeError::Invariant`] without context.
    pub fn invariant(code: impl Into<String>, message: impl Into<String>) -> Self {
        RangeError::Invariant(ErrorInfo::new(code, message))
    }

    /// Whether the caller can fix the error by changing its input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, RangeError::Configuration(_))
    }
}
