//! Pipeline error types.
//!
//! Failures are explicit `Result` values threaded through the fold; a
//! station aborts its line by returning one, never by unwinding.

use thiserror::Error;

use crate::relation::RelationError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised by stations and line edits
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Input failed a schema, cross-field, or document-level rule
    #[error("validation failed: {message}")]
    Validation {
        /// Human-readable description of the failure
        message: String,
        /// The offending field, when one can be named
        field: Option<String>,
    },

    /// A structural edit targeted a label no station carries.
    ///
    /// This is a construction-time configuration error, not a runtime
    /// data error.
    #[error("no station labeled '{label}'")]
    UnknownStation {
        /// The label that was not found
        label: String,
    },

    /// The backend failed during commit or dereference
    #[error("backend failure: {0}")]
    Backend(String),
}

impl PipelineError {
    /// Create a validation error with no field attribution
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error naming the offending field
    pub fn validation_for(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an unknown station error
    pub fn unknown_station(label: impl Into<String>) -> Self {
        Self::UnknownStation {
            label: label.into(),
        }
    }

    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Returns true if this is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns the offending field for validation failures, if known
    pub fn offending_field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<RelationError> for PipelineError {
    fn from(err: RelationError) -> Self {
        match err {
            // A malformed filter is bad caller input, not a backend fault
            RelationError::InvalidFilter(msg) => Self::validation(format!("invalid filter: {}", msg)),
            RelationError::Backend(msg) => Self::Backend(msg),
        }
    }
}
