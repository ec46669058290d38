//! Deferred result: a one-shot lazy execution handle.
//!
//! Binding an operation (line + environment + seed) is separate from
//! running it; forcing is the single point where side effects occur.
//! The line executes at most once, guarded by a one-shot latch, so
//! repeated and concurrent forcing return the cached outcome without
//! touching the backend again.

use std::sync::OnceLock;

use serde_json::Value;

use crate::observe::{Logger, Severity};

use super::environment::Environment;
use super::errors::{PipelineError, PipelineResult};
use super::line::AssemblyLine;

/// A lazily realized pipeline execution
#[derive(Debug)]
pub struct Deferred {
    line: AssemblyLine,
    environment: Environment,
    seed: Value,
    outcome: OnceLock<PipelineResult<Value>>,
}

impl Deferred {
    /// Binds a line, environment, and seed value without executing
    pub fn new(line: AssemblyLine, environment: Environment, seed: Value) -> Self {
        Self {
            line,
            environment,
            seed,
            outcome: OnceLock::new(),
        }
    }

    /// Binds an operation that already failed (e.g. at snapshot time);
    /// forcing returns the failure without executing the line.
    pub(crate) fn from_failure(
        line: AssemblyLine,
        environment: Environment,
        seed: Value,
        error: PipelineError,
    ) -> Self {
        let deferred = Self::new(line, environment, seed);
        let _ = deferred.outcome.set(Err(error));
        deferred
    }

    /// Returns the bound line for introspection or editing
    pub fn line(&self) -> &AssemblyLine {
        &self.line
    }

    /// Returns the seed value the line will fold
    pub fn seed(&self) -> &Value {
        &self.seed
    }

    /// Returns true if an outcome has been cached
    pub fn is_forced(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Consumes the handle and rebinds it, unforced, with an edited line.
    ///
    /// This is how callers append stations to an already-bound
    /// operation before triggering backend I/O.
    pub fn with_line(
        self,
        edit: impl FnOnce(AssemblyLine) -> PipelineResult<AssemblyLine>,
    ) -> PipelineResult<Self> {
        Ok(Self::new(edit(self.line)?, self.environment, self.seed))
    }

    /// Executes the bound line exactly once and returns the outcome.
    ///
    /// The first call runs the fold and caches the result; every later
    /// call (including concurrent ones) returns the cached outcome
    /// without re-executing. A cached failure is returned on this and
    /// all subsequent calls.
    pub fn force(&self) -> PipelineResult<Value> {
        self.outcome
            .get_or_init(|| {
                let result = self.line.execute(&self.environment, self.seed.clone());
                if let Err(ref err) = result {
                    let message = err.to_string();
                    Logger::log_stderr(Severity::Error, "line_failed", &[("error", &message)]);
                }
                result
            })
            .clone()
    }
}
