//! Drives a [`ResultParser`] from a child's stdout and stderr.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio_stream::wrappers::ReceiverStream;

use super::events::{RunError, RunEvent};
use super::record::RunSummary;
use super::session::ResultParser;

/// Default capacity of the event channel.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Error type for stream operations.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// The event receiver was dropped before the run finished.
    #[error("Event channel closed")]
    ChannelClosed,
}

/// Async glue between runner output and parse events.
pub struct StreamParser;

impl StreamParser {
    /// Parse `stdout` and forward `stderr` on a background task.
    ///
    /// The channel yields every event of the run and closes after `Done`.
    /// A `buffer` of zero is raised to one.
    pub fn into_channel<O, E>(
        parser: ResultParser,
        stdout: O,
        stderr: Option<E>,
        buffer: usize,
    ) -> Receiver<RunEvent>
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(async move {
            if let Err(e) = Self::parse_output(parser, stdout, stderr, tx).await {
                tracing::debug!(error = %e, "Stopped forwarding events");
            }
        });
        rx
    }

    /// Like [`StreamParser::into_channel`], as a `Stream`.
    pub fn into_stream<O, E>(
        parser: ResultParser,
        stdout: O,
        stderr: Option<E>,
        buffer: usize,
    ) -> impl futures_core::Stream<Item = RunEvent>
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        ReceiverStream::new(Self::into_channel(parser, stdout, stderr, buffer))
    }

    /// Run a full session: parse stdout, forward stderr, then send `Done`.
    ///
    /// Stderr is drained before `Done` so that anything the runner printed
    /// there arrives first.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::ChannelClosed` if the receiver is dropped.
    pub async fn parse_output<O, E>(
        mut parser: ResultParser,
        stdout: O,
        stderr: Option<E>,
        tx: Sender<RunEvent>,
    ) -> Result<RunSummary, StreamError>
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let stderr_task =
            stderr.map(|stderr| tokio::spawn(Self::forward_stderr(stderr, tx.clone())));

        Self::parse_stdout(&mut parser, stdout, &tx).await?;

        if let Some(task) = stderr_task {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(error = %e, "Stderr forwarding stopped"),
                Err(e) => tracing::warn!(error = %e, "Stderr task failed"),
            }
        }

        let mut events = Vec::new();
        parser.finish(&mut events);
        forward(&tx, events).await?;
        Ok(parser.summary().clone())
    }

    /// Feed `stdout` into `parser` chunk by chunk until EOF.
    ///
    /// Output after the end marker is still read, so the child never blocks
    /// on a full pipe. Read failures are reported as events and end the
    /// loop. Does not send `Done`.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::ChannelClosed` if the receiver is dropped.
    pub async fn parse_stdout<R>(
        parser: &mut ResultParser,
        mut stdout: R,
        tx: &Sender<RunEvent>,
    ) -> Result<(), StreamError>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            let n = match stdout.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stdout");
                    forward(tx, vec![RunEvent::Error(RunError::Read(e.to_string()))]).await?;
                    break;
                }
            };
            tracing::trace!(bytes = n, "Stdout chunk");

            let mut events = Vec::new();
            parser.push_chunk(&chunk[..n], &mut events);
            forward(tx, events).await?;
        }
        Ok(())
    }

    /// Send each stderr chunk as an `Error` event until EOF.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::ChannelClosed` if the receiver is dropped.
    pub async fn forward_stderr<R>(mut stderr: R, tx: Sender<RunEvent>) -> Result<(), StreamError>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            let n = match stderr.read(&mut chunk).await {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stderr");
                    return Ok(());
                }
            };
            let text = String::from_utf8_lossy(&chunk[..n]).into_owned();
            if text.trim().is_empty() {
                continue;
            }
            tracing::debug!(text = %text.trim_end(), "Runner stderr");
            forward(&tx, vec![RunEvent::Error(RunError::Stderr(text))]).await?;
        }
    }
}

async fn forward(tx: &Sender<RunEvent>, events: Vec<RunEvent>) -> Result<(), StreamError> {
    for event in events {
        tx.send(event).await.map_err(|_| StreamError::ChannelClosed)?;
    }
    Ok(())
}
