//! Events produced while parsing a run, and the sinks that receive them.

use tokio::sync::mpsc::UnboundedSender;

use super::record::{RunSummary, TestResult};

/// Non-fatal problem reported during a run.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Attribute line seen while no test result was open.
    #[error("Unexpected attribute: {key}\nLine: {line}")]
    UnexpectedAttribute { key: String, line: String },
    /// Line that is neither a header nor a continuation of an attribute.
    #[error("Expected continuing attribute but got: {line}")]
    UnexpectedContinuation { line: String },
    /// Text the runner wrote to stderr.
    #[error("{0}")]
    Stderr(String),
    /// Reading the runner's output failed.
    #[error("Failed to read runner output: {0}")]
    Read(String),
}

/// Output of a parse session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A test result was finalized.
    Test(TestResult),
    /// The run is over. Sent exactly once, after every `Test`.
    Done(RunSummary),
    /// Something went wrong; parsing continues.
    Error(RunError),
}

impl RunEvent {
    /// Returns true for the final `Done` event.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Returns the result if this is a `Test` event.
    #[must_use]
    pub fn test_result(&self) -> Option<&TestResult> {
        match self {
            Self::Test(result) => Some(result),
            _ => None,
        }
    }
}

/// Receiver of parse events.
pub trait EventSink {
    fn emit(&mut self, event: RunEvent);
}

impl EventSink for Vec<RunEvent> {
    fn emit(&mut self, event: RunEvent) {
        self.push(event);
    }
}

impl EventSink for UnboundedSender<RunEvent> {
    fn emit(&mut self, event: RunEvent) {
        if self.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }
}

type Handler<T> = Box<dyn FnMut(&T) + Send>;

/// Callback-style sink. Unset handlers do nothing.
pub struct Callbacks {
    on_test: Handler<TestResult>,
    on_done: Handler<RunSummary>,
    on_error: Handler<RunError>,
}

impl Callbacks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_test: Box::new(|_| {}),
            on_done: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
        }
    }

    /// Called for every finalized result.
    #[must_use]
    pub fn on_test(mut self, f: impl FnMut(&TestResult) + Send + 'static) -> Self {
        self.on_test = Box::new(f);
        self
    }

    /// Called once when the run is over.
    #[must_use]
    pub fn on_done(mut self, f: impl FnMut(&RunSummary) + Send + 'static) -> Self {
        self.on_done = Box::new(f);
        self
    }

    /// Called for every anomaly and stderr write.
    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(&RunError) + Send + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }
}

impl Default for Callbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}

impl EventSink for Callbacks {
    fn emit(&mut self, event: RunEvent) {
        match event {
            RunEvent::Test(result) => (self.on_test)(&result),
            RunEvent::Done(summary) => (self.on_done)(&summary),
            RunEvent::Error(err) => (self.on_error)(&err),
        }
    }
}
