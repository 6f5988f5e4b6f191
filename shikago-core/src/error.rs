//! Error types for Shikago operations.
//!
//! All errors are explicit and typed. Storage and validation errors are
//! returned to the immediate caller and never retried inside the broker.

use thiserror::Error;

/// The result type for Shikago operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Shikago operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid configuration or strategy parameters.
    #[error("configuration error: {message}")]
    Configuration {
        /// What was wrong.
        message: String,
    },

    /// A backing-store create, append or close failed.
    #[error("storage error during {operation}: {message}")]
    Storage {
        /// The operation that failed.
        operation: &'static str,
        /// Error description.
        message: String,
    },

    /// A malformed or out-of-range request.
    #[error("validation error: {message}")]
    Validation {
        /// Why the request was rejected.
        message: String,
    },

    /// The topic has not been created on this node.
    #[error("the topic {topic} does not exist on this node")]
    UnknownTopic {
        /// The topic name as requested.
        topic: String,
    },

    /// The operation is not available for this partition kind.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// The operation that was attempted.
        operation: &'static str,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a storage error from any displayable cause.
    pub fn storage<E: std::fmt::Display>(operation: &'static str, err: E) -> Self {
        Self::Storage {
            operation,
            message: err.to_string(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
