//! Entity descriptor and CRUD facade.
//!
//! An entity is built once from its configuration and frozen: the
//! facade methods only read it. Every facade call binds the matching
//! line and an environment into an unforced [`Deferred`]; nothing
//! touches the backend until the caller forces the result.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::observe::{Logger, Severity};
use crate::pipeline::{AssemblyLine, Deferred, Environment, PipelineResult};
use crate::relation::{parse_filter, Predicate, Relation, RelationHandle};
use crate::schema::{default_properties, merge_properties, PropertyDef, VALID_TO_FIELD};

use super::config::EntityConfig;
use super::errors::{EntityError, EntityResult};
use super::stations;

/// CRUD verbs, each backed by one assembly line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Insert,
    Update,
    Fetch,
    Destroy,
}

impl Verb {
    /// Returns the verb name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Insert => "insert",
            Verb::Update => "update",
            Verb::Fetch => "fetch",
            Verb::Destroy => "destroy",
        }
    }
}

struct Lines {
    insert: AssemblyLine,
    update: AssemblyLine,
    fetch: AssemblyLine,
    destroy: AssemblyLine,
}

/// A named collection binding: property schema, backend relation, and
/// one frozen assembly line per CRUD verb
pub struct Entity {
    name: String,
    relation: RelationHandle,
    properties: Arc<HashMap<String, PropertyDef>>,
    lines: Lines,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity").field("name", &self.name).finish()
    }
}

impl Entity {
    /// Builds an entity from its configuration.
    ///
    /// Obtains the backend relation from the collection factory,
    /// merges the property schema over the system defaults, builds the
    /// four default lines, applies the caller's per-verb overrides,
    /// and freezes the result.
    pub fn build(config: EntityConfig) -> EntityResult<Self> {
        let relation = (config.collection)(&config).map_err(|reason| EntityError::BackendInit {
            name: config.name.clone(),
            reason,
        })?;

        let properties = Arc::new(merge_properties(
            default_properties(),
            config.properties.clone(),
        ));

        let mut insert = stations::insert_line(&properties, config.document_rule.clone());
        let mut update = stations::update_line(&properties, config.document_rule.clone());
        let mut fetch = stations::fetch_line();
        let mut destroy = stations::destroy_line();

        if let Some(edit) = &config.insert_line {
            insert = edit(insert)?;
        }
        if let Some(edit) = &config.update_line {
            update = edit(update)?;
        }
        if let Some(edit) = &config.fetch_line {
            fetch = edit(fetch)?;
        }
        if let Some(edit) = &config.destroy_line {
            destroy = edit(destroy)?;
        }

        let counts = [
            insert.len().to_string(),
            update.len().to_string(),
            fetch.len().to_string(),
            destroy.len().to_string(),
        ];
        Logger::log(
            Severity::Info,
            "entity_ready",
            &[
                ("entity", config.name.as_str()),
                ("insert_stations", &counts[0]),
                ("update_stations", &counts[1]),
                ("fetch_stations", &counts[2]),
                ("destroy_stations", &counts[3]),
            ],
        );

        Ok(Self {
            name: config.name,
            relation,
            properties,
            lines: Lines {
                insert,
                update,
                fetch,
                destroy,
            },
        })
    }

    /// Returns the entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the backend relation handle
    pub fn relation(&self) -> &RelationHandle {
        &self.relation
    }

    /// Returns the merged property schema
    pub fn properties(&self) -> &HashMap<String, PropertyDef> {
        &self.properties
    }

    /// Returns the frozen line for a verb
    pub fn line(&self, verb: Verb) -> &AssemblyLine {
        match verb {
            Verb::Insert => &self.lines.insert,
            Verb::Update => &self.lines.update,
            Verb::Fetch => &self.lines.fetch,
            Verb::Destroy => &self.lines.destroy,
        }
    }

    /// Binds the fetch line to a filter (`None` = match-all)
    pub fn select(&self, filter: Option<Value>) -> Deferred {
        Deferred::new(
            self.lines.fetch.clone(),
            Environment::new(Arc::clone(&self.relation)),
            filter.unwrap_or(Value::Null),
        )
    }

    /// Like select, with a field projection applied to the results
    pub fn project(&self, filter: Option<Value>, fields: Vec<String>) -> Deferred {
        Deferred::new(
            self.lines.fetch.clone(),
            Environment::new(Arc::clone(&self.relation)).with_fields(fields),
            filter.unwrap_or(Value::Null),
        )
    }

    /// Binds the insert line to a document or an array of documents.
    ///
    /// With no documents, forcing re-dereferences the current state
    /// without inserting, which is useful for introspecting the bound
    /// line itself.
    pub fn insert(&self, documents: Option<Value>) -> Deferred {
        Deferred::new(
            self.lines.insert.clone(),
            Environment::new(Arc::clone(&self.relation)),
            documents.unwrap_or(Value::Null),
        )
    }

    /// Binds the update line to a filter and a record.
    ///
    /// The environment carries the live documents matching the filter
    /// at bind time, so update stations can compare old and new
    /// values. Snapshotting is the one bind-time backend read; if it
    /// fails, the returned handle is already forced to that failure.
    pub fn update(&self, filter: Option<Value>, record: Value) -> Deferred {
        let filter = filter.unwrap_or_else(|| Value::Object(Map::new()));
        let environment =
            Environment::new(Arc::clone(&self.relation)).with_filter(filter.clone());

        match self.matching_documents(&filter) {
            Ok(old) => Deferred::new(
                self.lines.update.clone(),
                environment.with_old_documents(old),
                record,
            ),
            Err(error) => {
                Deferred::from_failure(self.lines.update.clone(), environment, record, error)
            }
        }
    }

    /// Binds the destroy line to a filter (soft delete)
    pub fn destroy(&self, filter: Option<Value>) -> Deferred {
        Deferred::new(
            self.lines.destroy.clone(),
            Environment::new(Arc::clone(&self.relation)),
            filter.unwrap_or(Value::Null),
        )
    }

    // Snapshot of the live documents matching the filter at bind time.
    fn matching_documents(&self, filter: &Value) -> PipelineResult<Vec<Value>> {
        let mut predicates = parse_filter(filter)?;
        if !predicates.iter().any(|p| p.field == VALID_TO_FIELD) {
            predicates.push(Predicate::absent(VALID_TO_FIELD));
        }
        match self.relation.select(&predicates).dereference()? {
            Value::Array(docs) => Ok(docs),
            Value::Null => Ok(Vec::new()),
            single => Ok(vec![single]),
        }
    }
}
