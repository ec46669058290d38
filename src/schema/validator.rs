//! Document validation against a property schema.
//!
//! Semantics:
//! - The document must be a JSON object
//! - All required properties are present
//! - No undeclared properties exist
//! - No null values
//! - Types match exactly; an int is acceptable where a float is
//!   expected, never the reverse
//!
//! The validator does not mutate documents and is deterministic for a
//! given document and schema.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use super::properties::{FieldType, PropertyDef};

/// A single validation failure, naming the offending field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyViolation {
    /// Offending field name (`$document` for whole-document failures)
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl PropertyViolation {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "property to be present", "missing")
    }

    pub fn undeclared(field: impl Into<String>) -> Self {
        Self::new(field, "no undeclared properties", "extra property present")
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-null value", "null")
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(field, expected, actual)
    }
}

impl fmt::Display for PropertyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Validates a document against a property schema
pub fn validate_document(
    properties: &HashMap<String, PropertyDef>,
    document: &Value,
) -> Result<(), PropertyViolation> {
    let obj = document.as_object().ok_or_else(|| {
        PropertyViolation::type_mismatch("$document", "object", json_type_name(document))
    })?;

    // No undeclared properties allowed
    for key in obj.keys() {
        if !properties.contains_key(key) {
            return Err(PropertyViolation::undeclared(key));
        }
    }

    for (name, def) in properties {
        match obj.get(name) {
            Some(Value::Null) => return Err(PropertyViolation::null_value(name)),
            Some(value) => check_type(name, value, &def.field_type)?,
            None => {
                if def.required {
                    return Err(PropertyViolation::missing(name));
                }
            }
        }
    }

    Ok(())
}

fn check_type(field: &str, value: &Value, expected: &FieldType) -> Result<(), PropertyViolation> {
    let ok = match expected {
        FieldType::String => value.is_string(),
        FieldType::Int => value.is_i64() || value.is_u64(),
        FieldType::Bool => value.is_boolean(),
        // Integers are acceptable floats
        FieldType::Float => value.is_number(),
    };

    if ok {
        Ok(())
    } else {
        Err(PropertyViolation::type_mismatch(
            field,
            expected.type_name(),
            json_type_name(value),
        ))
    }
}

/// Returns the JSON type name for error messages
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
