//! Error types for kyrofacet.
//!
//! All errors are strongly typed using thiserror. Registry and selection
//! mutations never fail; errors only arise around entity loading,
//! configuration and filter construction.

use std::error::Error as StdError;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Failure reported by an entity source.
///
/// This is the only domain error. It is cloned verbatim into the state of
/// every registered group, so it is cheap to clone and keeps the underlying
/// cause behind an `Arc`.
#[derive(Debug, Clone, Error)]
#[error("Entity load failed: {message}")]
pub struct EntityLoadError {
    message: String,
    #[source]
    cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl EntityLoadError {
    /// Creates a load error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates a load error wrapping the collaborator's own error.
    #[must_use]
    pub fn with_cause(
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for EntityLoadError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Serialize for EntityLoadError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.message)
    }
}

/// Errors raised while reading a [`StoreConfig`](crate::config::StoreConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },
}

/// Top-level error type for kyrofacet.
#[derive(Debug, Error)]
pub enum FacetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid filter pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
    },

    #[error("An entity load is already in flight")]
    LoadInFlight,

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Channel disconnected: {path}")]
    Disconnected {
        path: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl FacetError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if waiting again could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::LoadInFlight)
    }
}

/// Result type alias for kyrofacet operations.
pub type FacetResult<T> = Result<T, FacetError>;
