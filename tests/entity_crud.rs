//! Entity CRUD scenarios
//!
//! End-to-end facade behavior:
//! - Inserts are identity-preserving for valid documents
//! - Validation runs before any commit
//! - Destroy is a soft delete (validity marker, no physical removal)
//! - Deferred results execute their line at most once

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use conveyor::entity::{memory_collection, CollectionFactory, Entity, EntityConfig};
use conveyor::pipeline::PipelineError;
use conveyor::relation::{
    MemoryRelation, Predicate, Relation, RelationHandle, RelationResult,
};
use conveyor::schema::PropertyDef;

// =============================================================================
// Helper Functions
// =============================================================================

fn book_properties() -> HashMap<String, PropertyDef> {
    let mut properties = HashMap::new();
    properties.insert("title".to_string(), PropertyDef::required_string());
    properties.insert("pages".to_string(), PropertyDef::optional_int());
    properties.insert(
        "status".to_string(),
        PropertyDef::optional_string().with_default(json!("draft")),
    );
    properties
}

fn books() -> Entity {
    Entity::build(EntityConfig::new(
        "books",
        memory_collection(),
        book_properties(),
    ))
    .unwrap()
}

// =============================================================================
// Insert
// =============================================================================

/// A document satisfying schema and rule comes back unchanged.
#[test]
fn test_insert_returns_valid_document_unchanged() {
    let entity = books();
    let doc = json!({"_id": "b1", "title": "Dune", "status": "published"});

    let result = entity.insert(Some(doc.clone())).force().unwrap();
    assert_eq!(result, doc);
}

/// Missing required property fails validation and nothing reaches the
/// backend.
#[test]
fn test_invalid_insert_leaves_backend_unmodified() {
    let entity = books();

    let err = entity
        .insert(Some(json!({"_id": "b1"})))
        .force()
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation { .. }));
    assert_eq!(err.offending_field(), Some("title"));

    assert_eq!(entity.relation().dereference().unwrap(), json!([]));
}

/// Documents without an id get a generated one.
#[test]
fn test_insert_generates_missing_ids() {
    let entity = books();

    let result = entity
        .insert(Some(json!({"title": "Dune"})))
        .force()
        .unwrap();
    let id = result["_id"].as_str().unwrap();
    assert!(!id.is_empty());
}

/// Defaulted properties are filled in before commit.
#[test]
fn test_insert_applies_property_defaults() {
    let entity = books();

    let result = entity
        .insert(Some(json!({"_id": "b1", "title": "Dune"})))
        .force()
        .unwrap();
    assert_eq!(result["status"], json!("draft"));
}

/// Inserting with no documents re-dereferences current state without
/// writing, and the bound line is inspectable before forcing.
#[test]
fn test_insert_without_documents_rederefs_current_state() {
    let entity = books();
    entity
        .insert(Some(json!({"_id": "b1", "title": "Dune"})))
        .force()
        .unwrap();

    let deferred = entity.insert(None);
    assert_eq!(
        deferred.line().labels(),
        vec!["defaults", "validate", "document-rule", "commit"]
    );

    let rows = deferred.force().unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

// =============================================================================
// Select / Project
// =============================================================================

/// Inserting N valid documents then selecting match-all returns
/// exactly those N.
#[test]
fn test_select_returns_all_inserted_documents() {
    let entity = books();
    entity
        .insert(Some(json!([
            {"_id": "b1", "title": "Dune"},
            {"_id": "b2", "title": "Hyperion"},
            {"_id": "b3", "title": "Foundation"},
        ])))
        .force()
        .unwrap();

    let rows = entity.select(None).force().unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);

    let ids: Vec<&str> = rows.iter().map(|r| r["_id"].as_str().unwrap()).collect();
    assert!(ids.contains(&"b1"));
    assert!(ids.contains(&"b2"));
    assert!(ids.contains(&"b3"));
}

/// A predicate matching nothing forces to an empty array, never an
/// error.
#[test]
fn test_select_with_no_matches_is_empty_not_error() {
    let entity = books();

    let rows = entity
        .select(Some(json!({"title": "Nonexistent"})))
        .force()
        .unwrap();
    assert_eq!(rows, json!([]));
}

#[test]
fn test_select_filters_by_predicate() {
    let entity = books();
    entity
        .insert(Some(json!([
            {"_id": "b1", "title": "Dune", "pages": 412},
            {"_id": "b2", "title": "Hyperion", "pages": 482},
        ])))
        .force()
        .unwrap();

    let rows = entity
        .select(Some(json!({"pages": {"$gt": 450}})))
        .force()
        .unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], json!("Hyperion"));
}

#[test]
fn test_project_strips_to_requested_fields() {
    let entity = books();
    entity
        .insert(Some(json!({"_id": "b1", "title": "Dune", "pages": 412})))
        .force()
        .unwrap();

    let rows = entity
        .project(None, vec!["title".to_string()])
        .force()
        .unwrap();
    assert_eq!(rows, json!([{"title": "Dune"}]));
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_merges_record_into_matching_documents() {
    let entity = books();
    entity
        .insert(Some(json!([
            {"_id": "b1", "title": "Dune", "pages": 400},
            {"_id": "b2", "title": "Hyperion", "pages": 482},
        ])))
        .force()
        .unwrap();

    let updated = entity
        .update(Some(json!({"_id": "b1"})), json!({"pages": 412}))
        .force()
        .unwrap();
    let updated = updated.as_array().unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0]["pages"], json!(412));
    assert_eq!(updated[0]["title"], json!("Dune"));

    let rows = entity
        .select(Some(json!({"_id": "b1"})))
        .force()
        .unwrap();
    assert_eq!(rows[0]["pages"], json!(412));

    // The other document is untouched
    let rows = entity
        .select(Some(json!({"_id": "b2"})))
        .force()
        .unwrap();
    assert_eq!(rows[0]["pages"], json!(482));
}

/// An update whose filter matches nothing merges to nothing and writes
/// nothing.
#[test]
fn test_update_matching_nothing_is_a_noop() {
    let entity = books();

    let updated = entity
        .update(Some(json!({"_id": "zz"})), json!({"pages": 1}))
        .force()
        .unwrap();
    assert_eq!(updated, json!([]));
}

/// Merged candidates are validated: a record introducing an
/// undeclared field is rejected.
#[test]
fn test_update_rejects_undeclared_fields() {
    let entity = books();
    entity
        .insert(Some(json!({"_id": "b1", "title": "Dune"})))
        .force()
        .unwrap();

    let err = entity
        .update(Some(json!({"_id": "b1"})), json!({"sneaky": 1}))
        .force()
        .unwrap_err();
    assert!(err.is_validation());
}

/// A malformed filter surfaces when the handle is forced, not as an
/// eager panic or error at bind time.
#[test]
fn test_update_with_invalid_filter_fails_on_force() {
    let entity = books();

    let deferred = entity.update(Some(json!({"pages": {"$near": 1}})), json!({"pages": 2}));
    assert!(deferred.is_forced());
    assert!(deferred.force().unwrap_err().is_validation());
}

// =============================================================================
// Destroy (soft delete)
// =============================================================================

#[test]
fn test_destroy_is_a_soft_delete() {
    let entity = books();
    entity
        .insert(Some(json!([
            {"_id": "b1", "title": "Dune"},
            {"_id": "b2", "title": "Hyperion"},
        ])))
        .force()
        .unwrap();

    let retired = entity.destroy(Some(json!({"_id": "b1"}))).force().unwrap();
    let retired = retired.as_array().unwrap();
    assert_eq!(retired.len(), 1);
    assert!(retired[0]["_valid_to"].is_string());

    // Gone from fetches
    let rows = entity.select(None).force().unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["_id"], json!("b2"));

    // Still in the backend, marked
    let raw = entity.relation().dereference().unwrap();
    assert_eq!(raw.as_array().unwrap().len(), 2);

    // Reachable with an explicit marker filter
    let rows = entity
        .select(Some(json!({"_valid_to": {"$present": true}})))
        .force()
        .unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["_id"], json!("b1"));
}

#[test]
fn test_destroy_matching_nothing_is_empty() {
    let entity = books();
    let retired = entity.destroy(Some(json!({"_id": "zz"}))).force().unwrap();
    assert_eq!(retired, json!([]));
}

// =============================================================================
// Deferred caching
// =============================================================================

struct CountingRelation {
    inner: RelationHandle,
    selects: Arc<AtomicUsize>,
    inserts: Arc<AtomicUsize>,
    derefs: Arc<AtomicUsize>,
}

impl CountingRelation {
    fn wrap(&self, inner: RelationHandle) -> RelationHandle {
        Arc::new(CountingRelation {
            inner,
            selects: Arc::clone(&self.selects),
            inserts: Arc::clone(&self.inserts),
            derefs: Arc::clone(&self.derefs),
        })
    }
}

impl Relation for CountingRelation {
    fn select(&self, predicates: &[Predicate]) -> RelationHandle {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.wrap(self.inner.select(predicates))
    }

    fn insert(&self, documents: &[Value]) -> RelationResult<RelationHandle> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(self.wrap(self.inner.insert(documents)?))
    }

    fn update(&self, predicates: &[Predicate], patch: &Value) -> RelationResult<RelationHandle> {
        Ok(self.wrap(self.inner.update(predicates, patch)?))
    }

    fn dereference(&self) -> RelationResult<Value> {
        self.derefs.fetch_add(1, Ordering::SeqCst);
        self.inner.dereference()
    }
}

/// Forcing the same handle twice returns the cached outcome without a
/// second backend call.
#[test]
fn test_forcing_twice_hits_backend_once() {
    let selects = Arc::new(AtomicUsize::new(0));
    let inserts = Arc::new(AtomicUsize::new(0));
    let derefs = Arc::new(AtomicUsize::new(0));

    let factory: CollectionFactory = {
        let selects = Arc::clone(&selects);
        let inserts = Arc::clone(&inserts);
        let derefs = Arc::clone(&derefs);
        Box::new(move |_config| {
            Ok(Arc::new(CountingRelation {
                inner: MemoryRelation::new(),
                selects: Arc::clone(&selects),
                inserts: Arc::clone(&inserts),
                derefs: Arc::clone(&derefs),
            }))
        })
    };

    let entity = Entity::build(EntityConfig::new("books", factory, book_properties())).unwrap();

    let deferred = entity.insert(Some(json!({"_id": "b1", "title": "Dune"})));
    let first = deferred.force().unwrap();
    let second = deferred.force().unwrap();
    assert_eq!(first, second);
    assert_eq!(inserts.load(Ordering::SeqCst), 1);

    let deferred = entity.select(None);
    deferred.force().unwrap();
    let selects_after_first = selects.load(Ordering::SeqCst);
    let derefs_after_first = derefs.load(Ordering::SeqCst);

    deferred.force().unwrap();
    assert_eq!(selects.load(Ordering::SeqCst), selects_after_first);
    assert_eq!(derefs.load(Ordering::SeqCst), derefs_after_first);
}
