//! The view of an in-flight query that the execution-time hooks work with.

use crate::host::{Collection, Model};
use serde_json::Value;

/// Transient per-query state written by the pre-execution hook and read by
/// the post-execution hook.
///
/// It lives on the query object itself, so concurrent queries never share it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    start_millis: Option<i64>,
    query_stack: Option<String>,
    additional: Option<Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of an execution.
    pub fn arm(&mut self, start_millis: i64, query_stack: Option<String>) {
        self.start_millis = Some(start_millis);
        self.query_stack = query_stack;
    }

    /// Whether a start time is recorded.
    pub fn is_armed(&self) -> bool {
        self.start_millis.is_some()
    }

    pub fn start_millis(&self) -> Option<i64> {
        self.start_millis
    }

    pub fn query_stack(&self) -> Option<&str> {
        self.query_stack.as_deref()
    }

    /// Caller-attached properties for this query's log record.
    pub fn additional_log_properties(&self) -> Option<&Value> {
        self.additional.as_ref()
    }

    pub fn set_additional_log_properties(&mut self, properties: Value) {
        self.additional = Some(properties);
    }

    /// Consume the recorded start time and stack, disarming the context.
    ///
    /// Additional properties stay attached to the query.
    pub(crate) fn disarm(&mut self) -> Option<(i64, Option<String>)> {
        let start = self.start_millis.take()?;
        Some((start, self.query_stack.take()))
    }
}

/// Read access to a query (or aggregation) as it executes.
///
/// Implemented by the host's query types; [`crate::host::Query`] and
/// [`crate::host::Aggregate`] are the reference implementations.
pub trait QueryExecution {
    /// The operation name the query was issued with (`"find"`, `"deleteOne"`, ...).
    fn op(&self) -> &str;

    /// Whether this execution is an aggregation pipeline.
    fn is_aggregate(&self) -> bool {
        false
    }

    /// A collection the query targets directly.
    fn collection(&self) -> Option<&Collection> {
        None
    }

    /// The model the query is bound to.
    fn model(&self) -> Option<&Model> {
        None
    }

    /// Filter conditions.
    fn conditions(&self) -> Option<&Value> {
        None
    }

    /// Update document.
    fn update_doc(&self) -> Option<&Value> {
        None
    }

    /// Aggregation stages.
    fn pipeline(&self) -> Option<&[Value]> {
        None
    }

    fn exec_context(&self) -> &ExecutionContext;

    fn exec_context_mut(&mut self) -> &mut ExecutionContext;
}

/// Where a query's collection name comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionSource<'a> {
    /// The query holds the collection itself.
    Direct(&'a Collection),
    /// The query is bound to a model that owns the collection.
    Model(&'a Model),
}

impl<'a> CollectionSource<'a> {
    /// Resolve the source for an execution: a direct collection wins over
    /// the owning model's collection.
    pub fn resolve(exec: &'a (impl QueryExecution + ?Sized)) -> Option<Self> {
        match exec.collection() {
            Some(collection) => Some(CollectionSource::Direct(collection)),
            None => exec.model().map(CollectionSource::Model),
        }
    }

    pub fn collection_name(&self) -> &'a str {
        match self {
            CollectionSource::Direct(collection) => collection.name(),
            CollectionSource::Model(model) => model.collection().name(),
        }
    }
}

/// Operation name as it appears in the log: aggregations are always `"aggregate"`.
pub fn logical_op(exec: &(impl QueryExecution + ?Sized)) -> &str {
    if exec.is_aggregate() {
        "aggregate"
    } else {
        exec.op()
    }
}

/// Chaining method attaching caller data to a single query's log record.
pub trait AdditionalLogProperties: QueryExecution + Sized {
    /// Attach `properties` to this query's log record and return the query.
    ///
    /// A later call replaces the earlier value.
    fn additional_log_properties(mut self, properties: impl Into<Value>) -> Self {
        self.exec_context_mut()
            .set_additional_log_properties(properties.into());
        self
    }
}

impl<T: QueryExecution> AdditionalLogProperties for T {}
