//! A minimal object-mapping host: schemas with per-operation hooks, models,
//! and the query/aggregation types that run through them.
//!
//! Real hosts implement [`HookTarget`] and [`QueryExecution`] for their own
//! types; these are enough to drive the instrumentation end to end.

use crate::error::ExecTimeResult;
use crate::query::{ExecutionContext, QueryExecution, logical_op};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// A lifecycle callback run before or after an operation.
pub type Hook = Arc<dyn Fn(&mut dyn QueryExecution) -> ExecTimeResult<()> + Send + Sync>;

/// When a hook runs relative to the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Pre,
    Post,
}

/// Something that accepts pre/post hooks keyed by operation name.
pub trait HookTarget {
    /// Error raised when the target refuses a hook.
    type Error;

    fn pre(&mut self, op: &str, hook: Hook) -> Result<(), Self::Error>;

    fn post(&mut self, op: &str, hook: Hook) -> Result<(), Self::Error>;
}

/// Errors raised by [`Schema`] hook registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// Hooks cannot be added once the schema has been compiled into a model.
    #[error("Schema '{0}' is frozen; hooks must be registered before compiling")]
    Frozen(String),
}

/// A named collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A model bound to a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    name: String,
    collection: Collection,
}

impl Model {
    pub fn new(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: Collection::new(collection),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn find(&self, filter: Value) -> Query {
        Query::new("find", self).filter(filter)
    }

    pub fn find_one(&self, filter: Value) -> Query {
        Query::new("findOne", self).filter(filter)
    }

    /// Legacy `count`.
    pub fn count(&self, filter: Value) -> Query {
        Query::new("count", self).filter(filter)
    }

    pub fn count_documents(&self, filter: Value) -> Query {
        Query::new("countDocuments", self).filter(filter)
    }

    pub fn estimated_document_count(&self) -> Query {
        Query::new("estimatedDocumentCount", self)
    }

    pub fn find_one_and_update(&self, filter: Value, update: Value) -> Query {
        Query::new("findOneAndUpdate", self)
            .filter(filter)
            .update(update)
    }

    pub fn find_one_and_delete(&self, filter: Value) -> Query {
        Query::new("findOneAndDelete", self).filter(filter)
    }

    /// Legacy alias of `findOneAndDelete`.
    pub fn find_one_and_remove(&self, filter: Value) -> Query {
        Query::new("findOneAndRemove", self).filter(filter)
    }

    pub fn delete_one(&self, filter: Value) -> Query {
        Query::new("deleteOne", self).filter(filter)
    }

    pub fn delete_many(&self, filter: Value) -> Query {
        Query::new("deleteMany", self).filter(filter)
    }

    /// Legacy `remove`.
    pub fn remove(&self, filter: Value) -> Query {
        Query::new("remove", self).filter(filter)
    }

    pub fn aggregate(&self, pipeline: Vec<Value>) -> Aggregate {
        Aggregate::new(self, pipeline)
    }
}

/// A query built against a model or directly against a collection.
#[derive(Debug, Clone)]
pub struct Query {
    op: String,
    collection: Option<Collection>,
    model: Option<Model>,
    conditions: Option<Value>,
    update: Option<Value>,
    ctx: ExecutionContext,
}

impl Query {
    /// A query bound to `model`.
    pub fn new(op: impl Into<String>, model: &Model) -> Self {
        Self {
            op: op.into(),
            collection: None,
            model: Some(model.clone()),
            conditions: None,
            update: None,
            ctx: ExecutionContext::new(),
        }
    }

    /// A query issued straight against a collection.
    pub fn on_collection(op: impl Into<String>, collection: Collection) -> Self {
        Self {
            op: op.into(),
            collection: Some(collection),
            model: None,
            conditions: None,
            update: None,
            ctx: ExecutionContext::new(),
        }
    }

    pub fn filter(mut self, conditions: Value) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn update(mut self, update: Value) -> Self {
        self.update = Some(update);
        self
    }
}

impl QueryExecution for Query {
    fn op(&self) -> &str {
        &self.op
    }

    fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    fn conditions(&self) -> Option<&Value> {
        self.conditions.as_ref()
    }

    fn update_doc(&self) -> Option<&Value> {
        self.update.as_ref()
    }

    fn exec_context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn exec_context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }
}

/// An aggregation pipeline bound to a model.
#[derive(Debug, Clone)]
pub struct Aggregate {
    model: Model,
    pipeline: Vec<Value>,
    ctx: ExecutionContext,
}

impl Aggregate {
    pub fn new(model: &Model, pipeline: Vec<Value>) -> Self {
        Self {
            model: model.clone(),
            pipeline,
            ctx: ExecutionContext::new(),
        }
    }

    /// Append a stage.
    pub fn stage(mut self, stage: Value) -> Self {
        self.pipeline.push(stage);
        self
    }
}

impl QueryExecution for Aggregate {
    fn op(&self) -> &str {
        "aggregate"
    }

    fn is_aggregate(&self) -> bool {
        true
    }

    fn model(&self) -> Option<&Model> {
        Some(&self.model)
    }

    fn pipeline(&self) -> Option<&[Value]> {
        Some(&self.pipeline)
    }

    fn exec_context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn exec_context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }
}

/// A schema holding per-operation hooks.
///
/// Hooks for an operation run in registration order. The operation a query
/// dispatches under is its logical name, so every aggregation runs the
/// `"aggregate"` hooks.
#[derive(Clone, Default)]
pub struct Schema {
    name: String,
    pre: BTreeMap<String, Vec<Hook>>,
    post: BTreeMap<String, Vec<Hook>>,
    frozen: bool,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts = |hooks: &BTreeMap<String, Vec<Hook>>| {
            hooks
                .iter()
                .map(|(op, list)| (op.clone(), list.len()))
                .collect::<BTreeMap<_, _>>()
        };
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("pre", &counts(&self.pre))
            .field("post", &counts(&self.post))
            .field("frozen", &self.frozen)
            .finish()
    }
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Refuse further hook registration.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Number of hooks registered for `op` in `phase`.
    pub fn hook_count(&self, op: &str, phase: HookPhase) -> usize {
        let hooks = match phase {
            HookPhase::Pre => &self.pre,
            HookPhase::Post => &self.post,
        };
        hooks.get(op).map_or(0, Vec::len)
    }

    /// Operation names with at least one hook in either phase.
    pub fn hooked_ops(&self) -> Vec<&str> {
        let mut ops: Vec<&str> = self
            .pre
            .keys()
            .chain(self.post.keys())
            .map(String::as_str)
            .collect();
        ops.sort_unstable();
        ops.dedup();
        ops
    }

    fn run_hooks(
        &self,
        phase: HookPhase,
        op: &str,
        exec: &mut dyn QueryExecution,
    ) -> ExecTimeResult<()> {
        let hooks = match phase {
            HookPhase::Pre => self.pre.get(op),
            HookPhase::Post => self.post.get(op),
        };
        for hook in hooks.into_iter().flatten() {
            hook(&mut *exec)?;
        }
        Ok(())
    }

    /// Run `query` through its hooks: pre hooks, then `run`, then post hooks.
    ///
    /// A failing hook stops the sequence and its error is returned.
    pub fn exec<Q, R>(&self, query: &mut Q, run: impl FnOnce(&Q) -> R) -> ExecTimeResult<R>
    where
        Q: QueryExecution,
    {
        let op = logical_op(&*query).to_string();
        self.run_hooks(HookPhase::Pre, &op, &mut *query)?;
        let output = run(&*query);
        self.run_hooks(HookPhase::Post, &op, &mut *query)?;
        Ok(output)
    }

    /// Like [`Schema::exec`], but the operation is a future awaited between
    /// the pre and post hooks.
    pub async fn exec_async<Q, F>(&self, query: &mut Q, operation: F) -> ExecTimeResult<F::Output>
    where
        Q: QueryExecution,
        F: Future,
    {
        let op = logical_op(&*query).to_string();
        self.run_hooks(HookPhase::Pre, &op, &mut *query)?;
        let output = operation.await;
        self.run_hooks(HookPhase::Post, &op, &mut *query)?;
        Ok(output)
    }

    fn register(&mut self, phase: HookPhase, op: &str, hook: Hook) -> Result<(), HostError> {
        if self.frozen {
            return Err(HostError::Frozen(self.name.clone()));
        }
        let hooks = match phase {
            HookPhase::Pre => &mut self.pre,
            HookPhase::Post => &mut self.post,
        };
        hooks.entry(op.to_string()).or_default().push(hook);
        Ok(())
    }
}

impl HookTarget for Schema {
    type Error = HostError;

    fn pre(&mut self, op: &str, hook: Hook) -> Result<(), HostError> {
        self.register(HookPhase::Pre, op, hook)
    }

    fn post(&mut self, op: &str, hook: Hook) -> Result<(), HostError> {
        self.register(HookPhase::Post, op, hook)
    }
}

/// Wrap a closure as a [`Hook`].
pub fn hook<F>(f: F) -> Hook
where
    F: Fn(&mut dyn QueryExecution) -> ExecTimeResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}
