//! Registration of the execution-time hook pair.
//!
//! # Example
//!
//! ```rust,ignore
//! use exectime::{ExecTimeConfig, Model, Schema, Verbosity, log_execution_time};
//! use exectime::query::AdditionalLogProperties;
//! use serde_json::json;
//!
//! let mut schema = Schema::new("users");
//! log_execution_time(
//!     &mut schema,
//!     Some(ExecTimeConfig::new().with_logger_level("info").with_logger_verbosity(Verbosity::Normal)),
//! )?;
//!
//! let users = Model::new("User", "users");
//! let mut query = users.find(json!({"active": true})).additional_log_properties(json!({"requestId": "r-1"}));
//! schema.exec(&mut query, |q| run_on_driver(q))?;
//! // INFO exectime.query: Query: find in users completed in: 3 ms properties={"additionalLogProperties":{"requestId":"r-1"}}
//! ```

use crate::clock::{Clock, SystemClock, elapsed_millis};
use crate::config::{ExecTimeConfig, Settings};
use crate::error::{ExecTimeError, ExecTimeResult};
use crate::formatter::QueryLog;
use crate::host::{Hook, HookTarget, hook};
use crate::op::QueryOp;
use crate::provenance::normalize_stack;
use crate::query::{CollectionSource, QueryExecution, logical_op};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};


/// A handle owning one instrumentation configuration.
///
/// Every hook registered through the handle reads the same settings, so
/// registering again with a new config changes how all of them log (last
/// registration wins). Separate handles never see each other's settings.
#[derive(Clone)]
pub struct ExecTime {
    settings: Arc<RwLock<Settings>>,
    clock: Arc<dyn Clock>,
}

impl Default for ExecTime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExecTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecTime")
            .field("settings", &*self.read())
            .finish_non_exhaustive()
    }
}

impl ExecTime {
    /// Create a handle with default settings and the system clock.
    pub fn new() -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different time source.
    pub fn with_clock<C: Clock + 'static>(self, clock: C) -> Self {
        self.with_clock_arc(Arc::new(clock))
    }

    /// Use a different time source from an `Arc`.
    pub fn with_clock_arc(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `config` and attach a pre and post hook to every [`QueryOp`].
    ///
    /// Errors from the target are returned as-is.
    pub fn register<T>(&self, target: &mut T, config: Option<ExecTimeConfig>) -> Result<(), T::Error>
    where
        T: HookTarget + ?Sized,
    {
        if let Some(config) = config {
            self.settings
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .apply(config);
        }

        for op in QueryOp::ALL {
            target.pre(op.as_str(), self.pre_hook())?;
            target.post(op.as_str(), self.post_hook())?;
        }

        tracing::trace!(
            target: "exectime",
            ops = QueryOp::ALL.len(),
            "registered execution-time hooks"
        );
        Ok(())
    }

    fn pre_hook(&self) -> Hook {
        let this = self.clone();
        hook(move |exec| {
            this.before_query(exec);
            Ok(())
        })
    }

    fn post_hook(&self) -> Hook {
        let this = self.clone();
        hook(move |exec| this.after_query(exec))
    }

    /// Stamp the start time and capture the call site.
    ///
    /// Capture is best-effort: if nothing is captured the query is still armed.
    /// The stack is captured before the clock is read, so capture cost is not
    /// counted as query time. It is skipped entirely when the active formatter
    /// would never log it.
    pub fn before_query(&self, exec: &mut dyn QueryExecution) {
        let provenance = {
            let settings = self.read();
            settings.wants_stack().then(|| Arc::clone(&settings.provenance))
        };
        let stack = provenance
            .and_then(|capture| capture.capture())
            .map(normalize_stack);
        let start = self.clock.now_millis();
        exec.exec_context_mut().arm(start, stack);
    }

    /// Compute elapsed time and hand the record to the formatter.
    ///
    /// Does nothing when the query was never armed. Sink and formatter errors
    /// are returned unchanged.
    pub fn after_query(&self, exec: &mut dyn QueryExecution) -> ExecTimeResult<()> {
        let Some((start, stack)) = exec.exec_context_mut().disarm() else {
            return Ok(());
        };
        let execution_time_ms = elapsed_millis(start, self.clock.now_millis());

        let exec = &*exec;
        let operation = logical_op(exec);
        let collection = CollectionSource::resolve(exec)
            .ok_or_else(|| ExecTimeError::missing_collection(operation))?;

        let record = QueryLog {
            operation,
            collection_name: collection.collection_name(),
            execution_time_ms,
            filter: exec.conditions(),
            update: exec.update_doc(),
            additional_log_properties: exec.exec_context().additional_log_properties(),
            aggregation_pipeline: exec.pipeline(),
            query_stack: stack.as_deref(),
        };

        // Release the lock before calling out to the sink.
        let settings = self.settings();
        settings.emit(&record)
    }
}

/// Instrument `target` with a fresh [`ExecTime`] handle.
///
/// Returns the handle so the same settings can be registered on more targets.
pub fn log_execution_time<T>(
    target: &mut T,
    config: Option<ExecTimeConfig>,
) -> Result<ExecTime, T::Error>
where
    T: HookTarget + ?Sized,
{
    let exec_time = ExecTime::new();
    exec_time.register(target, config)?;
    Ok(exec_time)
}
