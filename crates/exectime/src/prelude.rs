//! Convenient imports for typical `exectime` usage.
//!
//! ```ignore
//! use exectime::prelude::*;
//! ```

pub use crate::{
    AdditionalLogProperties, ExecTime, ExecTimeConfig, ExecTimeError, ExecTimeResult, LogSink,
    Model, QueryExecution, QueryLog, Schema, Verbosity, log_execution_time,
};
