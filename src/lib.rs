//! conveyor - a composable, inspectable CRUD pipeline engine
//!
//! Domain entities bind a property schema to a storage collection and
//! route every create/read/update/delete operation through an ordered
//! assembly line of named stations. Callers edit lines structurally
//! (insert before/after a label, replace, remove) at entity
//! construction time, and every facade call returns a deferred result
//! that executes its line exactly once when forced.

pub mod entity;
pub mod observe;
pub mod pipeline;
pub mod relation;
pub mod schema;
