//! In-memory relation backend.
//!
//! A shared document store behind an `RwLock` plus a per-handle
//! predicate view. Narrowing clones the store handle and extends the
//! view; inserts and updates go through the shared store so every
//! handle observes them. Each backend instance is constructed
//! explicitly (per entity or per test); there is no process-wide
//! store.

use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::errors::{RelationError, RelationResult};
use super::predicate::{matches_all, Predicate};
use super::{Relation, RelationHandle};

/// In-memory document relation
pub struct MemoryRelation {
    store: Arc<RwLock<Vec<Value>>>,
    view: Vec<Predicate>,
}

impl MemoryRelation {
    /// Creates an empty relation with a fresh store
    pub fn new() -> RelationHandle {
        Arc::new(Self {
            store: Arc::new(RwLock::new(Vec::new())),
            view: Vec::new(),
        })
    }

    /// Creates a relation seeded with the given documents
    pub fn with_documents(documents: Vec<Value>) -> RelationHandle {
        Arc::new(Self {
            store: Arc::new(RwLock::new(documents)),
            view: Vec::new(),
        })
    }

    fn narrowed(&self, extra: &[Predicate]) -> Self {
        let mut view = self.view.clone();
        view.extend_from_slice(extra);
        Self {
            store: Arc::clone(&self.store),
            view,
        }
    }
}

impl Relation for MemoryRelation {
    fn select(&self, predicates: &[Predicate]) -> RelationHandle {
        Arc::new(self.narrowed(predicates))
    }

    fn insert(&self, documents: &[Value]) -> RelationResult<RelationHandle> {
        let mut store = self
            .store
            .write()
            .map_err(|_| RelationError::backend("store lock poisoned"))?;
        store.extend(documents.iter().cloned());
        drop(store);

        Ok(Arc::new(self.narrowed(&[])))
    }

    fn update(&self, predicates: &[Predicate], patch: &Value) -> RelationResult<RelationHandle> {
        let patch_obj = patch
            .as_object()
            .ok_or_else(|| RelationError::backend("update patch must be an object"))?;

        let mut store = self
            .store
            .write()
            .map_err(|_| RelationError::backend("store lock poisoned"))?;
        for doc in store.iter_mut() {
            if matches_all(doc, &self.view) && matches_all(doc, predicates) {
                if let Some(obj) = doc.as_object_mut() {
                    for (key, value) in patch_obj {
                        obj.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        drop(store);

        Ok(Arc::new(self.narrowed(&[])))
    }

    fn dereference(&self) -> RelationResult<Value> {
        let store = self
            .store
            .read()
            .map_err(|_| RelationError::backend("store lock poisoned"))?;
        let rows: Vec<Value> = store
            .iter()
            .filter(|doc| matches_all(doc, &self.view))
            .cloned()
            .collect();
        Ok(Value::Array(rows))
    }
}

/// Shallow merge: every key of `patch` overwrites the same key in `base`
pub(crate) fn shallow_merge(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_obj), Value::Object(patch_obj)) => {
            let mut merged = base_obj.clone();
            for (key, value) in patch_obj {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}
