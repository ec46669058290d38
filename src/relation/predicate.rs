//! Predicate model for narrowing relation views.
//!
//! Filters arrive as JSON values of the shape
//! `{"field": {"$op": value}}`, with `{"field": value}` as an equality
//! shorthand. Matching is strict: no type coercion, and a missing or
//! null field never matches a value operator.

use std::cmp::Ordering;

use serde_json::Value;

use super::errors::{RelationError, RelationResult};

/// Filter operation types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Equality: field = value
    Eq(Value),
    /// Greater than: field > value
    Gt(Value),
    /// Greater than or equal: field >= value
    Gte(Value),
    /// Less than: field < value
    Lt(Value),
    /// Less than or equal: field <= value
    Lte(Value),
    /// Field is missing or null
    Absent,
    /// Field is present and non-null
    Present,
}

impl FilterOp {
    /// Returns the operator name used in JSON filters
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "$eq",
            FilterOp::Gt(_) => "$gt",
            FilterOp::Gte(_) => "$gte",
            FilterOp::Lt(_) => "$lt",
            FilterOp::Lte(_) => "$lte",
            FilterOp::Absent => "$absent",
            FilterOp::Present => "$present",
        }
    }
}

/// A single predicate (field + operation)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Field name
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Predicate {
    /// Create an equality predicate
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq(value),
        }
    }

    /// Create a greater-than predicate
    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Gt(value),
        }
    }

    /// Create a greater-than-or-equal predicate
    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Gte(value),
        }
    }

    /// Create a less-than predicate
    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Lt(value),
        }
    }

    /// Create a less-than-or-equal predicate
    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Lte(value),
        }
    }

    /// Create a field-absent predicate
    pub fn absent(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Absent,
        }
    }

    /// Create a field-present predicate
    pub fn present(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Present,
        }
    }

    /// Checks whether a document satisfies this predicate
    pub fn matches(&self, document: &Value) -> bool {
        let field_value = document.get(&self.field);

        match &self.op {
            FilterOp::Absent => matches!(field_value, None | Some(Value::Null)),
            FilterOp::Present => matches!(field_value, Some(v) if !v.is_null()),
            op => {
                // A missing or null field never matches a value operator
                let value = match field_value {
                    Some(v) if !v.is_null() => v,
                    _ => return false,
                };
                match op {
                    FilterOp::Eq(expected) => value == expected,
                    FilterOp::Gt(bound) => compare(value, bound) == Some(Ordering::Greater),
                    FilterOp::Gte(bound) => {
                        matches!(compare(value, bound), Some(Ordering::Greater | Ordering::Equal))
                    }
                    FilterOp::Lt(bound) => compare(value, bound) == Some(Ordering::Less),
                    FilterOp::Lte(bound) => {
                        matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal))
                    }
                    // Covered by the outer match
                    FilterOp::Absent | FilterOp::Present => false,
                }
            }
        }
    }
}

/// Checks whether a document satisfies all predicates (AND semantics)
pub fn matches_all(document: &Value, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|pred| pred.matches(document))
}

/// Ordered comparison for range operators.
///
/// Numbers compare as integers when both sides are integral, as floats
/// otherwise; strings compare lexicographically. Mixed types never
/// compare.
fn compare(actual: &Value, bound: &Value) -> Option<Ordering> {
    match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(ai), Some(bi)) = (a.as_i64(), b.as_i64()) {
                return Some(ai.cmp(&bi));
            }
            let af = a.as_f64()?;
            let bf = b.as_f64()?;
            af.partial_cmp(&bf)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Parses a JSON filter into predicates.
///
/// The filter must be an object; each entry is either an operator spec
/// (`{"$gte": 18}`) or a bare value treated as equality.
pub fn parse_filter(filter: &Value) -> RelationResult<Vec<Predicate>> {
    let obj = filter
        .as_object()
        .ok_or_else(|| RelationError::invalid_filter("filter must be an object"))?;

    let mut predicates = Vec::with_capacity(obj.len());
    for (field, spec) in obj {
        match spec {
            Value::Object(ops) => {
                for (op, operand) in ops {
                    predicates.push(parse_op(field, op, operand)?);
                }
            }
            value => predicates.push(Predicate::eq(field, value.clone())),
        }
    }
    Ok(predicates)
}

fn parse_op(field: &str, op: &str, operand: &Value) -> RelationResult<Predicate> {
    let op = match op {
        "$eq" => FilterOp::Eq(operand.clone()),
        "$gt" => FilterOp::Gt(operand.clone()),
        "$gte" => FilterOp::Gte(operand.clone()),
        "$lt" => FilterOp::Lt(operand.clone()),
        "$lte" => FilterOp::Lte(operand.clone()),
        "$absent" => match operand {
            Value::Bool(true) => FilterOp::Absent,
            Value::Bool(false) => FilterOp::Present,
            other => {
                return Err(RelationError::invalid_filter(format!(
                    "'$absent' expects a boolean, got {}",
                    other
                )))
            }
        },
        "$present" => match operand {
            Value::Bool(true) => FilterOp::Present,
            Value::Bool(false) => FilterOp::Absent,
            other => {
                return Err(RelationError::invalid_filter(format!(
                    "'$present' expects a boolean, got {}",
                    other
                )))
            }
        },
        other => {
            return Err(RelationError::invalid_filter(format!(
                "unrecognized operator '{}' for field '{}'",
                other, field
            )))
        }
    };

    Ok(Predicate {
        field: field.to_string(),
        op,
    })
}
