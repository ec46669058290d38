//! Property (field) schema definitions.
//!
//! Supported scalar types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - bool: Boolean
//! - float: 64-bit floating point
//!
//! Every entity's caller-supplied properties are merged over the
//! system defaults; on a name collision the caller's definition wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Primary key field, generated when absent at insert
pub const ID_FIELD: &str = "_id";

/// Soft-delete validity-end marker, stamped by the destroy verb
pub const VALID_TO_FIELD: &str = "_valid_to";

/// Supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// Boolean
    Bool,
    /// 64-bit floating point
    Float,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::Float => "float",
        }
    }
}

/// A single property definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property data type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the property must be present
    pub required: bool,
    /// Value filled in by the defaults station when the property is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertyDef {
    /// Create a required string property
    pub fn required_string() -> Self {
        Self {
            field_type: FieldType::String,
            required: true,
            default: None,
        }
    }

    /// Create an optional string property
    pub fn optional_string() -> Self {
        Self {
            field_type: FieldType::String,
            required: false,
            default: None,
        }
    }

    /// Create a required int property
    pub fn required_int() -> Self {
        Self {
            field_type: FieldType::Int,
            required: true,
            default: None,
        }
    }

    /// Create an optional int property
    pub fn optional_int() -> Self {
        Self {
            field_type: FieldType::Int,
            required: false,
            default: None,
        }
    }

    /// Create a required bool property
    pub fn required_bool() -> Self {
        Self {
            field_type: FieldType::Bool,
            required: true,
            default: None,
        }
    }

    /// Create an optional bool property
    pub fn optional_bool() -> Self {
        Self {
            field_type: FieldType::Bool,
            required: false,
            default: None,
        }
    }

    /// Create a required float property
    pub fn required_float() -> Self {
        Self {
            field_type: FieldType::Float,
            required: true,
            default: None,
        }
    }

    /// Create an optional float property
    pub fn optional_float() -> Self {
        Self {
            field_type: FieldType::Float,
            required: false,
            default: None,
        }
    }

    /// Attaches a default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// System-wide default properties merged into every entity schema
pub fn default_properties() -> HashMap<String, PropertyDef> {
    let mut properties = HashMap::new();
    properties.insert(ID_FIELD.to_string(), PropertyDef::optional_string());
    properties.insert(VALID_TO_FIELD.to_string(), PropertyDef::optional_string());
    properties
}

/// Merges caller-supplied properties over a base set; the caller's
/// definition wins on a name collision.
pub fn merge_properties(
    mut base: HashMap<String, PropertyDef>,
    custom: HashMap<String, PropertyDef>,
) -> HashMap<String, PropertyDef> {
    base.extend(custom);
    base
}

/// Returns a new document with missing defaulted properties filled in.
///
/// Non-object documents pass through untouched; the validator rejects
/// them downstream.
pub fn apply_defaults(properties: &HashMap<String, PropertyDef>, document: Value) -> Value {
    let mut map = match document {
        Value::Object(map) => map,
        other => return other,
    };

    for (name, def) in properties {
        if let Some(default) = &def.default {
            map.entry(name.clone()).or_insert_with(|| default.clone());
        }
    }

    Value::Object(map)
}
