//! Relation error types.

use thiserror::Error;

/// Result type for relation operations
pub type RelationResult<T> = Result<T, RelationError>;

/// Errors raised by backend relations and filter parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelationError {
    /// Filter value could not be parsed into predicates
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Backend failed to realize or mutate the view
    #[error("backend failure: {0}")]
    Backend(String),
}

impl RelationError {
    /// Create an invalid filter error
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
