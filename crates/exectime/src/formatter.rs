//! Turning a finished query into a sink call.

use crate::config::Verbosity;
use crate::error::ExecTimeResult;
use crate::sink::LogSink;
use serde_json::{Map, Value};

/// Everything known about a finished query, handed to the formatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryLog<'a> {
    /// Logical operation name (`"aggregate"` for pipelines).
    pub operation: &'a str,
    pub collection_name: &'a str,
    /// Wall-clock time between the pre and post hooks.
    pub execution_time_ms: u64,
    pub filter: Option<&'a Value>,
    pub update: Option<&'a Value>,
    /// Value attached with `additional_log_properties`.
    pub additional_log_properties: Option<&'a Value>,
    pub aggregation_pipeline: Option<&'a [Value]>,
    /// Call path captured when the query started.
    pub query_stack: Option<&'a str>,
}

impl QueryLog<'_> {
    /// The one-line summary emitted by the default formatter.
    pub fn message(&self) -> String {
        format!(
            "Query: {} in {} completed in: {} ms",
            self.operation, self.collection_name, self.execution_time_ms
        )
    }
}

/// A replacement for the built-in formatter.
///
/// It receives the raw record and is solely responsible for emitting it.
pub trait LogFormatter: Send + Sync {
    fn log(&self, record: &QueryLog<'_>) -> ExecTimeResult<()>;
}

impl<F> LogFormatter for F
where
    F: Fn(&QueryLog<'_>) -> ExecTimeResult<()> + Send + Sync,
{
    fn log(&self, record: &QueryLog<'_>) -> ExecTimeResult<()> {
        self(record)
    }
}

/// Build the structured properties the default formatter attaches.
///
/// With [`Verbosity::High`] the result is always an object, possibly empty.
/// With [`Verbosity::Normal`] it is `None` unless additional properties were
/// attached. Presence means "not `null`": falsy scalars such as `false`, `0`
/// and `""` are still logged.
pub fn build_properties(
    verbosity: Verbosity,
    record: &QueryLog<'_>,
) -> ExecTimeResult<Option<Value>> {
    let mut properties: Option<Map<String, Value>> = None;

    if verbosity == Verbosity::High {
        let mut map = Map::new();
        if let Some(filter) = record.filter.filter(|v| !v.is_null()) {
            map.insert("filter".to_string(), filter.clone());
        }
        if let Some(update) = record.update.filter(|v| !v.is_null()) {
            map.insert("update".to_string(), update.clone());
        }
        if let Some(pipeline) = record.aggregation_pipeline {
            map.insert(
                "aggregationPipeline".to_string(),
                Value::String(serde_json::to_string(pipeline)?),
            );
        }
        if let Some(stack) = record.query_stack.filter(|s| !s.is_empty()) {
            map.insert("queryStack".to_string(), Value::String(stack.to_string()));
        }
        properties = Some(map);
    }

    if let Some(additional) = record.additional_log_properties.filter(|v| !v.is_null()) {
        properties
            .get_or_insert_with(Map::new)
            .insert("additionalLogProperties".to_string(), additional.clone());
    }

    Ok(properties.map(Value::Object))
}

/// The built-in formatter: summary message plus verbosity-dependent properties.
pub fn default_log(
    sink: &dyn LogSink,
    level: &str,
    verbosity: Verbosity,
    record: &QueryLog<'_>,
) -> ExecTimeResult<()> {
    let properties = build_properties(verbosity, record)?;
    sink.log(level, &record.message(), properties.as_ref())?;
    Ok(())
}
