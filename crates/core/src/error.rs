//! Service Error Types
//!
//! Failures reported by the remote analysis execution service. Kept free of
//! any HTTP client types so the core crate stays transport-agnostic; the
//! application crate maps its client errors into these variants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured field errors carried by a rejected form (HTTP 422)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrors {
    #[serde(default)]
    pub general: Vec<String>,
    #[serde(default)]
    pub by_key: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.general.is_empty() && self.by_key.values().all(Vec::is_empty)
    }

    /// The headline message: the first general error, if any.
    pub fn summary(&self) -> Option<String> {
        self.general.first().cloned()
    }

    /// Every message, general errors first, then per-key errors prefixed
    /// with their key.
    pub fn messages(&self) -> Vec<String> {
        let by_key = self
            .by_key
            .iter()
            .flat_map(|(key, errors)| errors.iter().map(move |e| format!("{}: {}", key, e)));
        self.general.iter().cloned().chain(by_key).collect()
    }
}

/// Error type for calls to the analysis execution service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The service rejected the submitted parameters
    #[error("Validation failed: {}", .0.messages().join("; "))]
    Validation(ValidationErrors),

    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type alias for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }

    /// Message suitable for an alert or an inline panel error.
    ///
    /// HTTP failures show the response body when there is one, matching what
    /// the service intends the user to read.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Http { status, body } if body.trim().is_empty() => {
                format!("The server responded with status {}", status)
            }
            ServiceError::Http { body, .. } => body.clone(),
            ServiceError::Validation(errors) => errors
                .summary()
                .unwrap_or_else(|| errors.messages().join("\n")),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
