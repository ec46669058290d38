//! Entity configuration surface.
//!
//! Configuration is an explicit typed structure: every recognized key
//! is a field, so unknown keys are unrepresentable rather than
//! silently ignored. Line customization happens once, here, through
//! the per-verb override functions; entities are immutable afterward.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::pipeline::{AssemblyLine, PipelineResult};
use crate::relation::{MemoryRelation, RelationHandle};
use crate::schema::PropertyDef;

/// Produces the backend relation for an entity
pub type CollectionFactory =
    Box<dyn Fn(&EntityConfig) -> Result<RelationHandle, String> + Send + Sync>;

/// Predicate evaluated against a whole candidate document
pub type DocumentRule = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Caller-supplied edit applied to a default line at construction
pub type LineOverride = Box<dyn Fn(AssemblyLine) -> PipelineResult<AssemblyLine> + Send + Sync>;

/// Configuration record for one entity
pub struct EntityConfig {
    pub(crate) name: String,
    pub(crate) collection: CollectionFactory,
    pub(crate) properties: HashMap<String, PropertyDef>,
    pub(crate) document_rule: Option<DocumentRule>,
    pub(crate) insert_line: Option<LineOverride>,
    pub(crate) update_line: Option<LineOverride>,
    pub(crate) fetch_line: Option<LineOverride>,
    pub(crate) destroy_line: Option<LineOverride>,
}

impl EntityConfig {
    /// Creates a configuration from the required keys: the logical
    /// collection name, the backend factory, and the property schema.
    pub fn new(
        name: impl Into<String>,
        collection: CollectionFactory,
        properties: HashMap<String, PropertyDef>,
    ) -> Self {
        Self {
            name: name.into(),
            collection,
            properties,
            document_rule: None,
            insert_line: None,
            update_line: None,
            fetch_line: None,
            destroy_line: None,
        }
    }

    /// Sets the whole-document rule checked on insert and update
    pub fn with_document_rule(
        mut self,
        rule: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.document_rule = Some(Arc::new(rule));
        self
    }

    /// Sets the insert line override
    pub fn with_insert_line(
        mut self,
        edit: impl Fn(AssemblyLine) -> PipelineResult<AssemblyLine> + Send + Sync + 'static,
    ) -> Self {
        self.insert_line = Some(Box::new(edit));
        self
    }

    /// Sets the update line override
    pub fn with_update_line(
        mut self,
        edit: impl Fn(AssemblyLine) -> PipelineResult<AssemblyLine> + Send + Sync + 'static,
    ) -> Self {
        self.update_line = Some(Box::new(edit));
        self
    }

    /// Sets the fetch line override
    pub fn with_fetch_line(
        mut self,
        edit: impl Fn(AssemblyLine) -> PipelineResult<AssemblyLine> + Send + Sync + 'static,
    ) -> Self {
        self.fetch_line = Some(Box::new(edit));
        self
    }

    /// Sets the destroy line override
    pub fn with_destroy_line(
        mut self,
        edit: impl Fn(AssemblyLine) -> PipelineResult<AssemblyLine> + Send + Sync + 'static,
    ) -> Self {
        self.destroy_line = Some(Box::new(edit));
        self
    }

    /// Returns the logical collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the caller-supplied property schema
    pub fn properties(&self) -> &HashMap<String, PropertyDef> {
        &self.properties
    }
}

/// Stock factory producing a fresh in-memory relation
pub fn memory_collection() -> CollectionFactory {
    Box::new(|_config| Ok(MemoryRelation::new()))
}
