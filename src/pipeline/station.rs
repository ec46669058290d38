//! Station: a single named processing unit.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::environment::Environment;
use super::errors::PipelineResult;

/// A station's action: a pure transformation of the in-flight value
pub type StationAction = Arc<dyn Fn(&Environment, Value) -> PipelineResult<Value> + Send + Sync>;

/// A labeled processing unit in an assembly line.
///
/// Stations take the in-flight value by value and return a new one;
/// they never mutate the environment. A station rejects its input by
/// returning an error, which aborts the owning line's execution.
#[derive(Clone)]
pub struct Station {
    label: String,
    action: StationAction,
}

impl Station {
    /// Creates a station with the given label and action
    pub fn new(
        label: impl Into<String>,
        action: impl Fn(&Environment, Value) -> PipelineResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            action: Arc::new(action),
        }
    }

    /// Creates a neutral station that returns its input unchanged
    pub fn passthrough(label: impl Into<String>) -> Self {
        Self::new(label, |_env, value| Ok(value))
    }

    /// Returns the station label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Applies the station to the in-flight value
    pub fn apply(&self, environment: &Environment, value: Value) -> PipelineResult<Value> {
        (self.action)(environment, value)
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station").field("label", &self.label).finish()
    }
}
