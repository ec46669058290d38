//! Assembly line: an ordered station sequence with structural edits.
//!
//! Order is execution order. Edits are pure: each returns a new line
//! and leaves the receiver untouched, so lines can be shared between
//! entities without shared mutable pipeline state. Station actions are
//! behind `Arc` and are cheap to share.

use serde_json::Value;

use super::environment::Environment;
use super::errors::{PipelineError, PipelineResult};
use super::station::Station;

/// An ordered sequence of stations
#[derive(Debug, Clone, Default)]
pub struct AssemblyLine {
    stations: Vec<Station>,
}

impl AssemblyLine {
    /// Creates a line from the given stations, in execution order
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    /// Returns the current ordered station sequence
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Returns the station labels in execution order
    pub fn labels(&self) -> Vec<&str> {
        self.stations.iter().map(Station::label).collect()
    }

    /// Returns the number of stations
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Returns true if the line has no stations
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Inserts stations immediately before the station matching `label`,
    /// preserving the given order.
    pub fn insert_before(&self, label: &str, stations: Vec<Station>) -> PipelineResult<Self> {
        let index = self.position(label)?;
        Ok(self.spliced(index, 0, stations))
    }

    /// Inserts stations immediately after the station matching `label`,
    /// preserving the given order.
    pub fn insert_after(&self, label: &str, stations: Vec<Station>) -> PipelineResult<Self> {
        let index = self.position(label)?;
        Ok(self.spliced(index + 1, 0, stations))
    }

    /// Removes the station matching `label` and splices the replacements
    /// in at its position. An empty replacement is a pure removal.
    pub fn replace(&self, label: &str, stations: Vec<Station>) -> PipelineResult<Self> {
        let index = self.position(label)?;
        Ok(self.spliced(index, 1, stations))
    }

    /// Removes the station matching `label`
    pub fn remove(&self, label: &str) -> PipelineResult<Self> {
        self.replace(label, Vec::new())
    }

    /// Folds `seed` through each station in order.
    ///
    /// Every station receives the same environment; a station's output
    /// is the next station's input. The first error short-circuits the
    /// fold and becomes the outcome; later stations do not run, and no
    /// rollback of effects already applied is performed.
    pub fn execute(&self, environment: &Environment, seed: Value) -> PipelineResult<Value> {
        let mut value = seed;
        for station in &self.stations {
            value = station.apply(environment, value)?;
        }
        Ok(value)
    }

    // First match wins; duplicate labels are a caller error but must not crash.
    fn position(&self, label: &str) -> PipelineResult<usize> {
        self.stations
            .iter()
            .position(|station| station.label() == label)
            .ok_or_else(|| PipelineError::unknown_station(label))
    }

    fn spliced(&self, index: usize, removed: usize, replacements: Vec<Station>) -> Self {
        let mut stations = self.stations.clone();
        stations.splice(index..index + removed, replacements);
        Self { stations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::MemoryRelation;
    use serde_json::json;

    fn push_station(tag: &str) -> Station {
        let tag = tag.to_string();
        Station::new(tag.clone(), move |_env, value| {
            let mut seen = value.as_array().cloned().unwrap_or_default();
            seen.push(json!(tag));
            Ok(Value::Array(seen))
        })
    }

    fn env() -> Environment {
        Environment::new(MemoryRelation::new())
    }

    #[test]
    fn test_execute_folds_in_order() {
        let line = AssemblyLine::new(vec![push_station("a"), push_station("b"), push_station("c")]);
        let result = line.execute(&env(), json!([])).unwrap();
        assert_eq!(result, json!(["a", "b", "c"]));
    }

    #[test]
    fn test_execute_empty_line_returns_seed() {
        let line = AssemblyLine::default();
        assert_eq!(line.execute(&env(), json!(7)).unwrap(), json!(7));
    }

    #[test]
    fn test_execute_short_circuits_on_failure() {
        let line = AssemblyLine::new(vec![
            push_station("a"),
            Station::new("reject", |_env, _value| {
                Err(PipelineError::validation("rejected"))
            }),
            push_station("c"),
        ]);

        let err = line.execute(&env(), json!([])).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_insert_before_and_after() {
        let line = AssemblyLine::new(vec![push_station("a"), push_station("c")]);

        let edited = line.insert_before("c", vec![push_station("b")]).unwrap();
        assert_eq!(edited.labels(), vec!["a", "b", "c"]);

        let edited = line.insert_after("a", vec![push_station("b")]).unwrap();
        assert_eq!(edited.labels(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_many_preserves_given_order() {
        let line = AssemblyLine::new(vec![push_station("a"), push_station("d")]);

        let edited = line
            .insert_after("a", vec![push_station("b"), push_station("c")])
            .unwrap();
        assert_eq!(edited.labels(), vec!["a", "b", "c", "d"]);

        let result = edited.execute(&env(), json!([])).unwrap();
        assert_eq!(result, json!(["a", "b", "c", "d"]));
    }

    #[test]
    fn test_edits_are_pure() {
        let line = AssemblyLine::new(vec![push_station("a")]);
        let _edited = line.insert_after("a", vec![push_station("b")]).unwrap();

        // Receiver untouched
        assert_eq!(line.labels(), vec!["a"]);
    }

    #[test]
    fn test_replace_splices_at_position() {
        let line = AssemblyLine::new(vec![push_station("a"), push_station("b"), push_station("c")]);

        let edited = line
            .replace("b", vec![push_station("x"), push_station("y")])
            .unwrap();
        assert_eq!(edited.labels(), vec!["a", "x", "y", "c"]);
    }

    #[test]
    fn test_remove_deletes_exactly_one_station() {
        let line = AssemblyLine::new(vec![push_station("a"), push_station("b"), push_station("c")]);

        let edited = line.remove("b").unwrap();
        assert_eq!(edited.labels(), vec!["a", "c"]);
    }

    #[test]
    fn test_unknown_label_fails_every_edit() {
        let line = AssemblyLine::new(vec![push_station("a")]);

        for result in [
            line.insert_before("nope", vec![push_station("x")]),
            line.insert_after("nope", vec![push_station("x")]),
            line.replace("nope", vec![push_station("x")]),
            line.remove("nope"),
        ] {
            assert_eq!(
                result.unwrap_err(),
                PipelineError::unknown_station("nope")
            );
        }
    }

    #[test]
    fn test_duplicate_labels_first_match_wins() {
        let line = AssemblyLine::new(vec![push_station("a"), push_station("dup"), push_station("dup")]);

        let edited = line.remove("dup").unwrap();
        assert_eq!(edited.labels(), vec!["a", "dup"]);

        let edited = line.insert_before("dup", vec![push_station("x")]).unwrap();
        assert_eq!(edited.labels(), vec!["a", "x", "dup", "dup"]);
    }
}
