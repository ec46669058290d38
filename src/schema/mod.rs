//! Property schema subsystem.
//!
//! Entities bind a flat field-to-descriptor schema; the standard
//! stations consume it for defaulting and validation. The engine
//! itself never interprets properties beyond handing them to those
//! stations.

pub mod properties;
pub mod validator;

pub use properties::{
    apply_defaults, default_properties, merge_properties, FieldType, PropertyDef, ID_FIELD,
    VALID_TO_FIELD,
};
pub use validator::{validate_document, PropertyViolation};
