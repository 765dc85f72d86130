//! Running MSTest and streaming its results.
//!
//! Connects a spawned [`MsTestProcess`] to the [`StreamParser`] and reports
//! how the process ended.

use std::time::Duration;

use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::parser::{ResultParser, RunEvent, RunSummary, StreamError, StreamParser};

use super::MsTestProcess;

/// Default timeout for graceful process termination.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for a test run.
#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    /// Process stdout was not available.
    #[error("Process stdout not available")]
    NoStdout,
    /// Waiting on or terminating the process failed.
    #[error("Process error: {0}")]
    Process(#[from] std::io::Error),
    /// The event receiver went away mid-run.
    #[error(transparent)]
    Stream(#[from] StreamError),
    /// The parsing task panicked or was aborted.
    #[error("Parser task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// How a run ended.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Everything parsed from the run.
    pub summary: RunSummary,
    /// Exit code of the runner, if it exited normally.
    pub exit_code: Option<i32>,
    /// Whether the run was cancelled.
    pub cancelled: bool,
}

/// A test run in progress.
#[derive(Debug)]
pub struct TestRun {
    events: Receiver<RunEvent>,
    cancel: CancellationToken,
    handle: JoinHandle<Result<RunOutcome, RunnerError>>,
}

impl TestRun {
    /// Next event, or `None` once `Done` has been delivered.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Ask the runner to stop. Results parsed so far are still delivered.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run when triggered.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the process to exit and the output to be parsed.
    ///
    /// Events not yet taken with [`TestRun::next_event`] are discarded.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError` if the process or the parsing task fails.
    pub async fn wait(mut self) -> Result<RunOutcome, RunnerError> {
        while self.events.recv().await.is_some() {}
        self.handle.await?
    }
}

/// Start parsing a spawned runner. A `buffer` of zero is raised to one.
///
/// # Errors
///
/// Returns `RunnerError::NoStdout` if stdout was already taken.
pub fn run_tests(
    mut process: MsTestProcess,
    parser: ResultParser,
    buffer: usize,
) -> Result<TestRun, RunnerError> {
    let stdout = process.take_stdout().ok_or(RunnerError::NoStdout)?;
    let stderr = process.take_stderr();
    let (tx, events) = mpsc::channel(buffer.max(1));
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let handle = tokio::spawn(drive(process, parser, stdout, stderr, tx, token));

    Ok(TestRun {
        events,
        cancel,
        handle,
    })
}

async fn drive(
    mut process: MsTestProcess,
    parser: ResultParser,
    stdout: ChildStdout,
    stderr: Option<ChildStderr>,
    tx: Sender<RunEvent>,
    cancel: CancellationToken,
) -> Result<RunOutcome, RunnerError> {
    let parse = tokio::spawn(StreamParser::parse_output(parser, stdout, stderr, tx));

    let (status, cancelled) = tokio::select! {
        status = process.wait() => (status?, false),
        () = cancel.cancelled() => {
            tracing::info!("Run cancelled, terminating runner");
            process.graceful_terminate(DEFAULT_TERMINATE_TIMEOUT).await?;
            (process.wait().await?, true)
        }
    };
    tracing::info!(code = ?status.code(), "Test runner exited");

    let summary = parse.await??;
    Ok(RunOutcome {
        summary,
        exit_code: status.code(),
        cancelled,
    })
}
