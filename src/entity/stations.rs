//! Standard stations and the default per-verb lines.
//!
//! Default line order per verb:
//! - insert:  defaults → validate → document-rule → commit
//! - update:  merge → validate → document-rule → commit
//! - fetch:   normalize → exclude-retired → select → project
//! - destroy: normalize → retire
//!
//! Validating and defaulting stations precede the committing station;
//! the engine performs no rollback, so overrides that add effectful
//! stations must keep them after validation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::pipeline::{AssemblyLine, PipelineError, PipelineResult, Station};
use crate::relation::memory::shallow_merge;
use crate::relation::{parse_filter, Predicate, Relation};
use crate::schema::validator::json_type_name;
use crate::schema::{apply_defaults, validate_document, PropertyDef, ID_FIELD, VALID_TO_FIELD};

use super::config::DocumentRule;

/// Station labels used by the default lines; structural edits target
/// these.
pub mod labels {
    /// Fills defaulted properties and generates missing ids (insert)
    pub const DEFAULTS: &str = "defaults";
    /// Validates each candidate document against the property schema
    pub const VALIDATE: &str = "validate";
    /// Runs the configured whole-document rule (pass-through when none)
    pub const DOCUMENT_RULE: &str = "document-rule";
    /// Writes to the backend (insert/update)
    pub const COMMIT: &str = "commit";
    /// Merges the update record over each old document (update)
    pub const MERGE: &str = "merge";
    /// Normalizes the filter seed (fetch/destroy)
    pub const NORMALIZE: &str = "normalize";
    /// Hides soft-deleted documents from fetches
    pub const EXCLUDE_RETIRED: &str = "exclude-retired";
    /// Narrows the relation and realizes the view (fetch)
    pub const SELECT: &str = "select";
    /// Applies the bound field projection (fetch)
    pub const PROJECT: &str = "project";
    /// Stamps the validity-end marker (destroy)
    pub const RETIRE: &str = "retire";
}

/// Default insert line for an entity
pub(crate) fn insert_line(
    properties: &Arc<HashMap<String, PropertyDef>>,
    rule: Option<DocumentRule>,
) -> AssemblyLine {
    AssemblyLine::new(vec![
        defaults_station(Arc::clone(properties)),
        validate_station(Arc::clone(properties)),
        document_rule_station(rule),
        insert_commit_station(),
    ])
}

/// Default update line for an entity
pub(crate) fn update_line(
    properties: &Arc<HashMap<String, PropertyDef>>,
    rule: Option<DocumentRule>,
) -> AssemblyLine {
    AssemblyLine::new(vec![
        merge_station(),
        validate_station(Arc::clone(properties)),
        document_rule_station(rule),
        update_commit_station(),
    ])
}

/// Default fetch line for an entity
pub(crate) fn fetch_line() -> AssemblyLine {
    AssemblyLine::new(vec![
        normalize_station(),
        exclude_retired_station(),
        select_station(),
        project_station(),
    ])
}

/// Default destroy line for an entity
pub(crate) fn destroy_line() -> AssemblyLine {
    AssemblyLine::new(vec![normalize_station(), retire_station()])
}

/// Applies a per-document transform across a single object or an
/// array of them. A null value passes through untouched: it is the
/// "no documents" seed of the introspection path.
fn each_document(
    value: Value,
    apply: &dyn Fn(Value) -> PipelineResult<Value>,
) -> PipelineResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Array(docs) => {
            let mut out = Vec::with_capacity(docs.len());
            for doc in docs {
                out.push(apply(doc)?);
            }
            Ok(Value::Array(out))
        }
        doc => apply(doc),
    }
}

fn defaults_station(properties: Arc<HashMap<String, PropertyDef>>) -> Station {
    Station::new(labels::DEFAULTS, move |_env, value| {
        each_document(value, &|doc| Ok(ensure_id(apply_defaults(&properties, doc))))
    })
}

fn ensure_id(document: Value) -> Value {
    match document {
        Value::Object(mut map) => {
            if !map.contains_key(ID_FIELD) {
                map.insert(
                    ID_FIELD.to_string(),
                    Value::String(Uuid::new_v4().to_string()),
                );
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn validate_station(properties: Arc<HashMap<String, PropertyDef>>) -> Station {
    Station::new(labels::VALIDATE, move |_env, value| {
        each_document(value, &|doc| {
            validate_document(&properties, &doc)
                .map_err(|violation| {
                    PipelineError::validation_for(violation.field.clone(), violation.to_string())
                })?;
            Ok(doc)
        })
    })
}

fn document_rule_station(rule: Option<DocumentRule>) -> Station {
    Station::new(labels::DOCUMENT_RULE, move |_env, value| {
        let rule = match &rule {
            Some(rule) => rule,
            None => return Ok(value),
        };
        each_document(value, &|doc| {
            (rule.as_ref())(&doc).map_err(PipelineError::validation)?;
            Ok(doc)
        })
    })
}

fn insert_commit_station() -> Station {
    Station::new(labels::COMMIT, |env, value| match value {
        // Absent seed: re-deref the current view without inserting
        Value::Null => Ok(env.relation().dereference()?),
        Value::Array(docs) => {
            env.relation().insert(&docs)?;
            Ok(Value::Array(docs))
        }
        doc => {
            env.relation().insert(std::slice::from_ref(&doc))?;
            Ok(doc)
        }
    })
}

fn merge_station() -> Station {
    Station::new(labels::MERGE, |env, value| {
        if !value.is_object() {
            return Err(PipelineError::validation(format!(
                "update record must be an object, got {}",
                json_type_name(&value)
            )));
        }
        let merged: Vec<Value> = env
            .old_documents()
            .iter()
            .map(|old| shallow_merge(old, &value))
            .collect();
        Ok(Value::Array(merged))
    })
}

fn update_commit_station() -> Station {
    Station::new(labels::COMMIT, |env, value| {
        let docs = match &value {
            Value::Array(docs) => docs,
            other => {
                return Err(PipelineError::validation(format!(
                    "update candidates must be an array, got {}",
                    json_type_name(other)
                )))
            }
        };
        for doc in docs {
            let id = doc.get(ID_FIELD).and_then(Value::as_str).ok_or_else(|| {
                PipelineError::validation_for(ID_FIELD, "cannot update a document without an id")
            })?;
            let key = [Predicate::eq(ID_FIELD, Value::String(id.to_string()))];
            env.relation().update(&key, doc)?;
        }
        Ok(value)
    })
}

fn normalize_station() -> Station {
    Station::new(labels::NORMALIZE, |_env, value| match value {
        Value::Null => Ok(Value::Object(Map::new())),
        obj @ Value::Object(_) => Ok(obj),
        other => Err(PipelineError::validation(format!(
            "filter must be an object, got {}",
            json_type_name(&other)
        ))),
    })
}

fn exclude_retired_station() -> Station {
    Station::new(labels::EXCLUDE_RETIRED, |_env, value| match value {
        Value::Object(mut map) => {
            // An explicit _valid_to filter disables the live-rows predicate
            if !map.contains_key(VALID_TO_FIELD) {
                map.insert(VALID_TO_FIELD.to_string(), json!({"$absent": true}));
            }
            Ok(Value::Object(map))
        }
        other => Ok(other),
    })
}

fn select_station() -> Station {
    Station::new(labels::SELECT, |env, value| {
        let predicates = parse_filter(&value)?;
        Ok(env.relation().select(&predicates).dereference()?)
    })
}

fn project_station() -> Station {
    Station::new(labels::PROJECT, |env, value| {
        let fields = match env.fields() {
            Some(fields) => fields,
            None => return Ok(value),
        };
        match value {
            Value::Array(docs) => Ok(Value::Array(
                docs.into_iter()
                    .map(|doc| project_document(doc, fields))
                    .collect(),
            )),
            doc => Ok(project_document(doc, fields)),
        }
    })
}

fn project_document(document: Value, fields: &[String]) -> Value {
    match document {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| fields.iter().any(|field| field == key))
                .collect(),
        ),
        other => other,
    }
}

fn retire_station() -> Station {
    Station::new(labels::RETIRE, |env, value| {
        let predicates = parse_filter(&value)?;
        let mut patch = Map::new();
        patch.insert(
            VALID_TO_FIELD.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        env.relation().update(&predicates, &Value::Object(patch))?;
        Ok(env.relation().select(&predicates).dereference()?)
    })
}
