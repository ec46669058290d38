//! Backend relation abstraction.
//!
//! A [`Relation`] is a chainable view over a document collection:
//! narrowing with [`Relation::select`] returns a new view and leaves
//! the original untouched, so predicates can be refined progressively
//! before the view is realized with [`Relation::dereference`]. All
//! mutable state lives behind this trait; the pipeline engine itself
//! holds none.

use std::sync::Arc;

use serde_json::Value;

pub mod errors;
pub mod memory;
pub mod predicate;

pub use errors::{RelationError, RelationResult};
pub use memory::MemoryRelation;
pub use predicate::{matches_all, parse_filter, FilterOp, Predicate};

/// A shareable handle to a backend relation view
pub type RelationHandle = Arc<dyn Relation>;

/// Capability set implemented by storage backends
pub trait Relation: Send + Sync {
    /// Returns a new view narrowed by the given predicates.
    ///
    /// Must not mutate the receiver; the returned view composes the
    /// receiver's predicates with the new ones.
    fn select(&self, predicates: &[Predicate]) -> RelationHandle;

    /// Appends documents to the collection and returns the post-insert view.
    fn insert(&self, documents: &[Value]) -> RelationResult<RelationHandle>;

    /// Shallow-merges `patch` into every document matching the view plus
    /// `predicates`, returning the post-update view.
    fn update(&self, predicates: &[Predicate], patch: &Value) -> RelationResult<RelationHandle>;

    /// Realizes the view as a JSON array of matching documents.
    ///
    /// An empty view dereferences to an empty array, never an error.
    fn dereference(&self) -> RelationResult<Value>;
}
