use crate::error::ExecTimeResult;
use crate::formatter::{LogFormatter, QueryLog, default_log};
use crate::provenance::{BacktraceCapture, ProvenanceCapture};
use crate::sink::{LogSink, TracingSink};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default level name the sink is called with.
pub const DEFAULT_LOGGER_LEVEL: &str = "debug";

/// How much query detail accompanies the summary message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Summary message only.
    Normal,
    /// Summary plus filter, update, pipeline, and call stack.
    #[default]
    High,
}

impl<'de> Deserialize<'de> for Verbosity {
    /// Accepts `"normal"`/`"high"` or the numeric forms `0`/`1`.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Number(u8),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "normal" => Ok(Verbosity::Normal),
                "high" => Ok(Verbosity::High),
                other => Err(serde::de::Error::custom(format!(
                    "unknown verbosity '{other}', expected 'normal' or 'high'"
                ))),
            },
            Repr::Number(0) => Ok(Verbosity::Normal),
            Repr::Number(1) => Ok(Verbosity::High),
            Repr::Number(n) => Err(serde::de::Error::custom(format!(
                "unknown verbosity {n}, expected 0 or 1"
            ))),
        }
    }
}

/// Options passed at registration.
///
/// Every field is optional: `Some` overrides the current setting, `None`
/// leaves it untouched. Only the plain fields can be deserialized; sinks,
/// formatters, and capture capabilities are set in code.
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecTimeConfig {
    /// Logging backend.
    #[serde(skip)]
    pub logger: Option<Arc<dyn LogSink>>,
    /// Level name the sink is called with.
    pub logger_level: Option<String>,
    /// Amount of query detail to include.
    pub logger_verbosity: Option<Verbosity>,
    /// Replacement for the built-in formatter.
    #[serde(skip)]
    pub logger_function: Option<Arc<dyn LogFormatter>>,
    /// Call-site capture used by the pre-execution hook.
    #[serde(skip)]
    pub provenance: Option<Arc<dyn ProvenanceCapture>>,
}

impl fmt::Debug for ExecTimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecTimeConfig")
            .field("logger", &self.logger.as_ref().map(|_| ".."))
            .field("logger_level", &self.logger_level)
            .field("logger_verbosity", &self.logger_verbosity)
            .field("logger_function", &self.logger_function.as_ref().map(|_| ".."))
            .field("provenance", &self.provenance.as_ref().map(|_| ".."))
            .finish()
    }
}

impl ExecTimeConfig {
    /// Create an empty configuration (overrides nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the plain fields from JSON, e.g. `{"logger_level": "info", "logger_verbosity": "normal"}`.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Set the logging backend.
    pub fn with_logger<S: LogSink + 'static>(self, logger: S) -> Self {
        self.with_logger_arc(Arc::new(logger))
    }

    /// Set the logging backend from an `Arc`.
    pub fn with_logger_arc(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set the level name the sink is called with.
    pub fn with_logger_level(mut self, level: impl Into<String>) -> Self {
        self.logger_level = Some(level.into());
        self
    }

    /// Set the verbosity.
    pub fn with_logger_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.logger_verbosity = Some(verbosity);
        self
    }

    /// Replace the built-in formatter.
    pub fn with_logger_function<F: LogFormatter + 'static>(self, formatter: F) -> Self {
        self.with_logger_function_arc(Arc::new(formatter))
    }

    /// Replace the built-in formatter from an `Arc`.
    pub fn with_logger_function_arc(mut self, formatter: Arc<dyn LogFormatter>) -> Self {
        self.logger_function = Some(formatter);
        self
    }

    /// Set the call-site capture capability.
    pub fn with_provenance<P: ProvenanceCapture + 'static>(mut self, capture: P) -> Self {
        self.provenance = Some(Arc::new(capture));
        self
    }
}

/// Which formatter turns records into sink calls.
#[derive(Clone, Default)]
pub enum Formatter {
    /// Summary message plus verbosity-dependent properties.
    #[default]
    Builtin,
    /// Caller-supplied formatter; the built-in logic never runs.
    Custom(Arc<dyn LogFormatter>),
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formatter::Builtin => f.write_str("Builtin"),
            Formatter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The resolved settings every hook invocation reads.
#[derive(Clone)]
pub struct Settings {
    pub logger: Arc<dyn LogSink>,
    pub logger_level: String,
    pub logger_verbosity: Verbosity,
    pub logger_function: Formatter,
    pub provenance: Arc<dyn ProvenanceCapture>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logger: Arc::new(TracingSink),
            logger_level: DEFAULT_LOGGER_LEVEL.to_string(),
            logger_verbosity: Verbosity::High,
            logger_function: Formatter::Builtin,
            provenance: Arc::new(BacktraceCapture),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("logger_level", &self.logger_level)
            .field("logger_verbosity", &self.logger_verbosity)
            .field("logger_function", &self.logger_function)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Overlay the fields `config` provides.
    pub fn apply(&mut self, config: ExecTimeConfig) {
        if let Some(logger) = config.logger {
            self.logger = logger;
        }
        if let Some(level) = config.logger_level {
            self.logger_level = level;
        }
        if let Some(verbosity) = config.logger_verbosity {
            self.logger_verbosity = verbosity;
        }
        if let Some(formatter) = config.logger_function {
            self.logger_function = Formatter::Custom(formatter);
        }
        if let Some(provenance) = config.provenance {
            self.provenance = provenance;
        }
    }

    /// Whether the active formatter can make use of a captured stack.
    ///
    /// The built-in formatter only logs it under [`Verbosity::High`]; a custom
    /// formatter always receives it.
    pub fn wants_stack(&self) -> bool {
        match self.logger_function {
            Formatter::Builtin => self.logger_verbosity == Verbosity::High,
            Formatter::Custom(_) => true,
        }
    }

    /// Hand a finished query to the active formatter.
    pub fn emit(&self, record: &QueryLog<'_>) -> ExecTimeResult<()> {
        match &self.logger_function {
            Formatter::Builtin => default_log(
                self.logger.as_ref(),
                &self.logger_level,
                self.logger_verbosity,
                record,
            ),
            Formatter::Custom(formatter) => formatter.log(record),
        }
    }
}
