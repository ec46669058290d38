//! Execution environment.
//!
//! Context shared read-only by every station of one line execution:
//! the owning relation handle plus whatever collection-level data the
//! bound verb requires (the matching-document snapshot for update, the
//! projection instruction for fetch).

use std::fmt;

use serde_json::Value;

use crate::relation::RelationHandle;

/// Context carried through a line execution
#[derive(Clone)]
pub struct Environment {
    relation: RelationHandle,
    filter: Option<Value>,
    old_documents: Vec<Value>,
    fields: Option<Vec<String>>,
}

impl Environment {
    /// Creates an environment bound to the given relation
    pub fn new(relation: RelationHandle) -> Self {
        Self {
            relation,
            filter: None,
            old_documents: Vec::new(),
            fields: None,
        }
    }

    /// Binds the predicate supplied by an update/destroy facade call
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Binds the documents matching the filter at bind time
    pub fn with_old_documents(mut self, documents: Vec<Value>) -> Self {
        self.old_documents = documents;
        self
    }

    /// Binds a field-projection instruction
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Returns the backend relation handle
    pub fn relation(&self) -> &RelationHandle {
        &self.relation
    }

    /// Returns the bound filter, if any
    pub fn filter(&self) -> Option<&Value> {
        self.filter.as_ref()
    }

    /// Returns the documents that matched the filter when the
    /// operation was bound ("old docs", update verb)
    pub fn old_documents(&self) -> &[Value] {
        &self.old_documents
    }

    /// Returns the projection fields, if any
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("filter", &self.filter)
            .field("old_documents", &self.old_documents.len())
            .field("fields", &self.fields)
            .finish()
    }
}
