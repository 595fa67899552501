//! Log sinks receiving formatted query logs.
//!
//! A sink is addressed by a level name (`"debug"`, `"info"`, ...). Names the
//! sink does not know are rejected with [`SinkError::UnknownLevel`], and that
//! error reaches the caller of the instrumented query.

use crate::error::SinkError;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

pub use tracing::Level;

/// Resolve a level name to a [`Level`].
///
/// Names are matched the way `tracing` parses them (case-insensitive), with
/// `"log"` accepted as an alias for `"info"`.
pub fn parse_level(name: &str) -> Result<Level, SinkError> {
    match name {
        "log" => Ok(Level::INFO),
        other => other
            .parse::<Level>()
            .map_err(|_| SinkError::unknown_level(other)),
    }
}

/// A logging backend.
pub trait LogSink: Send + Sync {
    /// Emit `message` with optional structured `properties` at the named level.
    fn log(&self, level: &str, message: &str, properties: Option<&Value>)
    -> Result<(), SinkError>;
}

/// Emits query logs as `tracing` events under the `exectime.query` target.
///
/// The structured properties are attached as a JSON-rendered `properties`
/// field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn log(
        &self,
        level: &str,
        message: &str,
        properties: Option<&Value>,
    ) -> Result<(), SinkError> {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let level = parse_level(level)?;
        match properties {
            Some(properties) => emit_at_level!(
                level,
                target: "exectime.query",
                properties = %properties,
                "{}",
                message
            ),
            None => emit_at_level!(level, target: "exectime.query", "{}", message),
        }
        Ok(())
    }
}

/// Writes query logs to stderr, one line per query.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    /// Prefix for log lines.
    pub prefix: String,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self {
            prefix: "[exectime]".to_string(),
        }
    }
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set prefix for log lines.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub(crate) fn render(&self, level: Level, message: &str, properties: Option<&Value>) -> String {
        match properties {
            Some(properties) => {
                format!("{} {} {} | {}", self.prefix, level, message, properties)
            }
            None => format!("{} {} {}", self.prefix, level, message),
        }
    }
}

impl LogSink for ConsoleSink {
    fn log(
        &self,
        level: &str,
        message: &str,
        properties: Option<&Value>,
    ) -> Result<(), SinkError> {
        let level = parse_level(level)?;
        eprintln!("{}", self.render(level, message, properties));
        Ok(())
    }
}

/// A single call recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub properties: Option<Value>,
}

/// Records every call in memory. Useful for asserting on query logs in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded entries.
    pub fn take(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn log(
        &self,
        level: &str,
        message: &str,
        properties: Option<&Value>,
    ) -> Result<(), SinkError> {
        let level = parse_level(level)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                level,
                message: message.to_string(),
                properties: properties.cloned(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn level_names() {
        assert_eq!(parse_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_level("log").unwrap(), Level::INFO);
        assert!(parse_level("verbose").unwrap_err().is_unknown_level());
        assert!(parse_level("").is_err());
    }

    #[test]
    fn memory_sink_records_and_drains() {
        let sink = MemorySink::new();
        sink.log("info", "hello", Some(&json!({"a": 1}))).unwrap();
        sink.log("debug", "bye", None).unwrap();

        assert_eq!(sink.len(), 2);
        let entries = sink.take();
        assert_eq!(entries[0].level, Level::INFO);
        assert_eq!(entries[0].properties, Some(json!({"a": 1})));
        assert_eq!(entries[1].properties, None);
        assert!(sink.is_empty());
    }

    #[test]
    fn memory_sink_rejects_unknown_level() {
        let sink = MemorySink::new();
        let err = sink.log("shout", "hello", None).unwrap_err();
        assert!(matches!(err, SinkError::UnknownLevel(ref l) if l == "shout"));
        assert!(sink.is_empty());
    }

    #[test]
    fn console_sink_rendering() {
        let sink = ConsoleSink::new().prefix("[db]");
        assert_eq!(sink.render(Level::DEBUG, "msg", None), "[db] DEBUG msg");
        assert_eq!(
            sink.render(Level::WARN, "msg", Some(&json!({"x": 1}))),
            r#"[db] WARN msg | {"x":1}"#
        );
    }

    #[test]
    fn tracing_sink_rejects_unknown_level() {
        assert!(TracingSink.log("nope", "msg", None).is_err());
        assert!(TracingSink.log("trace", "msg", None).is_ok());
    }
}
