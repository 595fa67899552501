//! Call-site capture for query provenance.
//!
//! The pre-execution hook asks a [`ProvenanceCapture`] for a diagnostic
//! string describing where the query was issued. Capture is best-effort:
//! returning `None` simply leaves the stack out of the log record.

use std::backtrace::{Backtrace, BacktraceStatus};

const ERROR_MARKER: &str = "Error";
const TRACE_MARKER: &str = "Trace";

/// Captures a description of the current call path.
pub trait ProvenanceCapture: Send + Sync {
    /// Capture the call path, or `None` if unavailable.
    fn capture(&self) -> Option<String>;
}

impl<F> ProvenanceCapture for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn capture(&self) -> Option<String> {
        self()
    }
}

/// Captures a `std::backtrace::Backtrace`, regardless of `RUST_BACKTRACE`.
///
/// The rendered text is headed by an `Error` line, the same shape an error
/// report takes; [`normalize_stack`] relabels it before storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceCapture;

impl ProvenanceCapture for BacktraceCapture {
    fn capture(&self) -> Option<String> {
        let backtrace = Backtrace::force_capture();
        match backtrace.status() {
            BacktraceStatus::Captured => Some(format!("{ERROR_MARKER}\n{backtrace}")),
            _ => None,
        }
    }
}

/// Never captures anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCapture;

impl ProvenanceCapture for NoopCapture {
    fn capture(&self) -> Option<String> {
        None
    }
}

/// Relabel a leading `Error` marker as `Trace`.
///
/// Only a marker at the very start of the text is replaced; the remaining
/// lines are left untouched.
pub fn normalize_stack(stack: String) -> String {
    match stack.strip_prefix(ERROR_MARKER) {
        Some(rest) => format!("{TRACE_MARKER}{rest}"),
        None => stack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_error_becomes_trace() {
        assert_eq!(
            normalize_stack("Error\n    at find (app.rs:10)".to_string()),
            "Trace\n    at find (app.rs:10)"
        );
    }

    #[test]
    fn only_the_leading_occurrence_is_replaced() {
        assert_eq!(
            normalize_stack("Error: Error in handler".to_string()),
            "Trace: Error in handler"
        );
    }

    #[test]
    fn other_text_is_unchanged() {
        let stack = "  Error\n at main".to_string();
        assert_eq!(normalize_stack(stack.clone()), stack);
        assert_eq!(normalize_stack("at main".to_string()), "at main");
        assert_eq!(normalize_stack(String::new()), "");
    }

    #[test]
    fn closures_are_captures() {
        let capture = || Some("custom".to_string());
        assert_eq!(capture.capture().as_deref(), Some("custom"));
        assert_eq!(NoopCapture.capture(), None);
    }

    #[test]
    fn backtrace_capture_normalizes_to_trace() {
        if let Some(stack) = BacktraceCapture.capture() {
            assert!(stack.starts_with("Error\n"));
            assert!(normalize_stack(stack).starts_with("Trace\n"));
        }
    }
}
