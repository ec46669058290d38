//! Structured event logging.
//!
//! One log line = one JSON event, written synchronously and
//! unbuffered. Key order is deterministic: `event` first, `severity`
//! second, remaining fields sorted by key.

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace,
    /// Normal operations
    Info,
    /// Recoverable issues
    Warn,
    /// Operation failures
    Error,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured JSON-line event logger
pub struct Logger;

impl Logger {
    /// Logs an event to stdout
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::emit(&mut io::stdout(), &Self::render(severity, event, fields));
    }

    /// Logs an event to stderr (failures)
    pub fn log_stderr(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::emit(&mut io::stderr(), &Self::render(severity, event, fields));
    }

    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut line = String::with_capacity(128);
        line.push('{');
        Self::push_pair(&mut line, "event", event);
        line.push(',');
        Self::push_pair(&mut line, "severity", severity.as_str());

        let mut sorted: Vec<(&str, &str)> = fields.to_vec();
        sorted.sort_by_key(|(key, _)| *key);
        for (key, value) in sorted {
            line.push(',');
            Self::push_pair(&mut line, key, value);
        }

        line.push('}');
        line
    }

    // String serialization of a &str cannot fail
    fn push_pair(out: &mut String, key: &str, value: &str) {
        out.push_str(&serde_json::to_string(key).unwrap_or_default());
        out.push(':');
        out.push_str(&serde_json::to_string(value).unwrap_or_default());
    }

    fn emit<W: Write>(writer: &mut W, line: &str) {
        let _ = writeln!(writer, "{}", line);
        let _ = writer.flush();
    }
}
