//! Incremental state machine turning MSTest output into test results.
//!
//! MSTest prints a banner, a separator line, then one header line per test
//! (`Passed  Namespace.Class.Method`) optionally followed by `[key] = value`
//! detail lines whose values may wrap onto further lines. A summary line
//! such as `10/10 test(s) Passed` closes the block.

use super::buffer::LineBuffer;
use super::classify::{classify, is_begin_marker, LineKind};
use super::events::{EventSink, RunError, RunEvent};
use super::localization::{LocalizationTable, Messages};
use super::record::{DetailMap, RunSummary, TestResult};

/// Joins the lines of a multi-line attribute value.
pub const CONTINUATION_SEPARATOR: &str = "\r\n";

/// Where the parser is within the runner's output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParsePhase {
    /// Skipping the banner until the separator line.
    #[default]
    AwaitingBegin,
    /// Inside the result block.
    Parsing,
    /// End marker seen or stream closed; input is ignored.
    Stopped,
}

#[derive(Debug, Default)]
struct PendingAttribute {
    key: String,
    value: String,
}

/// Parser for one MSTest run.
#[derive(Debug)]
pub struct ResultParser {
    messages: Messages,
    details: DetailMap,
    phase: ParsePhase,
    buffer: LineBuffer,
    current: Option<TestResult>,
    attribute: PendingAttribute,
    summary: RunSummary,
    done_sent: bool,
}

impl ResultParser {
    /// Create a parser using the built-in localization table.
    #[must_use]
    pub fn new(details: DetailMap, language: &str) -> Self {
        Self::with_table(&LocalizationTable::builtin(), language, details)
    }

    /// Create a parser using tokens from `table`.
    #[must_use]
    pub fn with_table(table: &LocalizationTable, language: &str, details: DetailMap) -> Self {
        Self::with_messages(table.resolve(language).clone(), details)
    }

    #[must_use]
    pub fn with_messages(messages: Messages, details: DetailMap) -> Self {
        Self {
            messages,
            details,
            phase: ParsePhase::default(),
            buffer: LineBuffer::new(),
            current: None,
            attribute: PendingAttribute::default(),
            summary: RunSummary::default(),
            done_sent: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> ParsePhase {
        self.phase
    }

    /// Results finalized so far.
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Whether `Done` has been emitted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done_sent
    }

    /// Feed a raw chunk of stdout.
    pub fn push_chunk(&mut self, chunk: &[u8], sink: &mut impl EventSink) {
        if self.phase == ParsePhase::Stopped {
            return;
        }
        for line in self.buffer.push(chunk) {
            self.push_line(&line, sink);
        }
    }

    /// Feed one complete line without its terminator.
    pub fn push_line(&mut self, line: &str, sink: &mut impl EventSink) {
        if line.is_empty() {
            return;
        }
        match self.phase {
            ParsePhase::AwaitingBegin => {
                if is_begin_marker(line) {
                    tracing::trace!("Result block started");
                    self.phase = ParsePhase::Parsing;
                }
            }
            ParsePhase::Parsing => self.parse_line(line, sink),
            ParsePhase::Stopped => {}
        }
    }

    /// Signal that the stream closed. Emits `Done` unless already sent.
    pub fn finish(&mut self, sink: &mut impl EventSink) {
        if self.phase != ParsePhase::Stopped {
            if let Some(tail) = self.buffer.finish() {
                self.push_line(&tail, sink);
            }
        }
        if self.phase != ParsePhase::Stopped {
            if self.current.is_some() {
                tracing::debug!("Stream closed before end marker, keeping pending result");
            }
            self.finalize_current(sink);
            self.phase = ParsePhase::Stopped;
        }
        self.emit_done(sink);
    }

    fn parse_line(&mut self, line: &str, sink: &mut impl EventSink) {
        match classify(line, &self.messages) {
            LineKind::EndMarker => {
                tracing::trace!(line, "Result block ended");
                self.finalize_current(sink);
                self.phase = ParsePhase::Stopped;
                self.emit_done(sink);
            }
            LineKind::NewTestHeader { status, name } => {
                self.finalize_current(sink);
                let passed = status == self.messages.passed;
                self.current = Some(TestResult::new(status, name, passed));
            }
            LineKind::AttributeHeader { key, value } => {
                self.commit_attribute();
                if self.current.is_none() {
                    tracing::warn!(key = %key, line, "Attribute outside of a test result");
                    sink.emit(RunEvent::Error(RunError::UnexpectedAttribute {
                        key: key.into_owned(),
                        line: line.to_string(),
                    }));
                } else {
                    self.attribute = PendingAttribute {
                        key: key.into_owned(),
                        value: value.to_string(),
                    };
                }
            }
            LineKind::ContinuationLine => {
                if self.attribute.value.is_empty() {
                    tracing::warn!(line, "Continuation line without an open attribute");
                    sink.emit(RunEvent::Error(RunError::UnexpectedContinuation {
                        line: line.to_string(),
                    }));
                } else {
                    self.attribute.value.push_str(CONTINUATION_SEPARATOR);
                    self.attribute.value.push_str(line);
                }
            }
        }
    }

    /// Move the pending attribute into the open result. Empty values are
    /// dropped.
    fn commit_attribute(&mut self) {
        let PendingAttribute { key, value } = std::mem::take(&mut self.attribute);
        if value.is_empty() {
            return;
        }
        if let Some(result) = self.current.as_mut() {
            let key = self.details.resolve(&key).to_string();
            result.attributes.insert(key, value);
        }
    }

    fn finalize_current(&mut self, sink: &mut impl EventSink) {
        self.commit_attribute();
        let Some(result) = self.current.take() else {
            return;
        };
        tracing::debug!(name = %result.name, status = %result.status, "Test result");
        self.summary.record(&result);
        sink.emit(RunEvent::Test(result));
    }

    fn emit_done(&mut self, sink: &mut impl EventSink) {
        if self.done_sent {
            return;
        }
        self.done_sent = true;
        tracing::debug!(
            total = self.summary.total(),
            passed = self.summary.passed.len(),
            failed = self.summary.failed.len(),
            "Run finished"
        );
        sink.emit(RunEvent::Done(self.summary.clone()));
    }
}

impl Default for ResultParser {
    fn default() -> Self {
        Self::new(DetailMap::default(), super::localization::DEFAULT_LANGUAGE)
    }
}
