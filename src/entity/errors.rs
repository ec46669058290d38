//! Entity construction error types.

use thiserror::Error;

use crate::pipeline::PipelineError;

/// Result type for entity construction
pub type EntityResult<T> = Result<T, EntityError>;

/// Errors raised while building an entity descriptor
#[derive(Debug, Clone, Error)]
pub enum EntityError {
    /// The collection factory failed to produce a backend relation
    #[error("backend init failed for '{name}': {reason}")]
    BackendInit {
        /// Entity name being built
        name: String,
        /// Factory failure description
        reason: String,
    },

    /// A line override failed (e.g. it targeted an unknown station)
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
