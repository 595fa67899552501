//! # exectime
//!
//! Execution-time logging for document-database query lifecycles.
//!
//! ## Features
//!
//! - **Hook pair**: a pre hook stamps the start time and call site, a post hook
//!   computes elapsed milliseconds and emits one log line per executed query
//! - **Fixed coverage**: find, findOne, count, countDocuments,
//!   estimatedDocumentCount, findOneAndUpdate, findOneAndRemove,
//!   findOneAndDelete, deleteOne, deleteMany, remove, aggregate
//! - **Pluggable output**: `tracing` by default, any [`LogSink`] or a full
//!   replacement [`LogFormatter`]
//! - **Per-query context**: attach extra data with
//!   [`additional_log_properties`](query::AdditionalLogProperties::additional_log_properties)
//!
//! ## Usage
//!
//! ```ignore
//! use exectime::prelude::*;
//! use serde_json::json;
//!
//! let mut schema = Schema::new("users");
//! log_execution_time(&mut schema, Some(ExecTimeConfig::new().with_logger_level("info")))?;
//!
//! let users = Model::new("User", "users");
//! let mut query = users
//!     .find_one(json!({"email": "a@example.com"}))
//!     .additional_log_properties(json!({"route": "/login"}));
//!
//! let user = schema.exec_async(&mut query, driver.find_one(..)).await?;
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod formatter;
pub mod host;
pub mod op;
pub mod plugin;
pub mod prelude;
pub mod provenance;
pub mod query;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ExecTimeConfig, Formatter, Settings, Verbosity};
pub use error::{ExecTimeError, ExecTimeResult, SinkError};
pub use formatter::{LogFormatter, QueryLog};
pub use host::{Aggregate, Collection, Hook, HookPhase, HookTarget, HostError, Model, Query, Schema};
pub use op::QueryOp;
pub use plugin::{ExecTime, log_execution_time};
pub use provenance::{BacktraceCapture, NoopCapture, ProvenanceCapture};
pub use query::{AdditionalLogProperties, CollectionSource, ExecutionContext, QueryExecution};
pub use sink::{ConsoleSink, Level, LogEntry, LogSink, MemorySink, TracingSink, parse_level};
