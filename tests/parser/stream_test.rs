//! Tests for the async stream driver and channel integration.

use futures_util::StreamExt;
use mstest_runner::parser::{ResultParser, RunError, RunEvent, StreamParser};
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn into_channel_reassembles_split_lines() {
    // Each read returns exactly one of these chunks.
    let stdout = tokio_test::io::Builder::new()
        .read(b"Starting execution...\r\n---")
        .read(b"----\r\nPassed  Alpha.Test\r\nFai")
        .read(b"led  Beta.Test\r\n[errormessage] = boom\r")
        .read(b"\n1/2 test(s) Passed\r\n")
        .build();

    let mut rx = StreamParser::into_channel(
        ResultParser::default(),
        stdout,
        None::<tokio::io::Empty>,
        16,
    );

    let Some(RunEvent::Test(alpha)) = rx.recv().await else {
        panic!("Expected first test");
    };
    assert_eq!(alpha.name, "Alpha.Test");
    assert!(alpha.passed);

    let Some(RunEvent::Test(beta)) = rx.recv().await else {
        panic!("Expected second test");
    };
    assert_eq!(beta.status, "Failed");
    assert_eq!(beta.attribute("errorMessage"), Some("boom"));

    let Some(RunEvent::Done(summary)) = rx.recv().await else {
        panic!("Expected done");
    };
    assert_eq!(summary.total(), 2);

    // Channel should close after Done.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn into_channel_forwards_stderr_before_done() {
    let (stdout, mut stdout_writer) = tokio::io::duplex(1024);
    let (stderr, mut stderr_writer) = tokio::io::duplex(1024);

    tokio::spawn(async move {
        stderr_writer
            .write_all(b"Warning: test settings ignored\r\n")
            .await
            .unwrap();
        drop(stderr_writer);
        stdout_writer
            .write_all(b"----\r\nPassed A\r\n")
            .await
            .unwrap();
        drop(stdout_writer);
    });

    let rx = StreamParser::into_channel(ResultParser::default(), stdout, Some(stderr), 16);
    let events: Vec<RunEvent> = tokio_stream::wrappers::ReceiverStream::new(rx)
        .collect()
        .await;

    assert!(events.iter().any(|e| matches!(
        e,
        RunEvent::Error(RunError::Stderr(text)) if text.contains("test settings ignored")
    )));
    assert!(events.last().unwrap().is_terminal());
    let tests = events.iter().filter(|e| e.test_result().is_some()).count();
    assert_eq!(tests, 1);
}

#[tokio::test]
async fn into_stream_yields_done_on_empty_output() {
    let stdout = tokio_test::io::Builder::new().build();
    let events: Vec<RunEvent> =
        StreamParser::into_stream(ResultParser::default(), stdout, None::<tokio::io::Empty>, 4)
            .collect()
            .await;

    assert_eq!(events.len(), 1);
    let RunEvent::Done(summary) = &events[0] else {
        panic!("Expected Done");
    };
    assert_eq!(summary.total(), 0);
}

#[tokio::test]
async fn read_error_is_reported_and_done_still_sent() {
    let stdout = tokio_test::io::Builder::new()
        .read(b"----\r\nPassed A\r\n")
        .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
        .build();

    let events: Vec<RunEvent> =
        StreamParser::into_stream(ResultParser::default(), stdout, None::<tokio::io::Empty>, 4)
            .collect()
            .await;

    assert!(matches!(events[0], RunEvent::Error(RunError::Read(_))));
    assert_eq!(events[1].test_result().map(|r| r.name.as_str()), Some("A"));
    assert!(events[2].is_terminal());
}

#[tokio::test]
async fn output_after_end_marker_is_drained_but_ignored() {
    let stdout = tokio_test::io::Builder::new()
        .read(b"----\r\nPassed A\r\n1/1 test(s) Passed\r\n")
        .read(b"Passed Ghost\r\n[owner] = nobody\r\n")
        .build();

    let events: Vec<RunEvent> =
        StreamParser::into_stream(ResultParser::default(), stdout, None::<tokio::io::Empty>, 4)
            .collect()
            .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].test_result().unwrap().name, "A");
    assert!(events[1].is_terminal());
}

#[tokio::test]
async fn parse_output_returns_summary() {
    let stdout = tokio_test::io::Builder::new()
        .read(b"----\r\nPassed A\r\nFailed B\r\n2\r\n")
        .build();
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);

    let summary = StreamParser::parse_output(
        ResultParser::default(),
        stdout,
        None::<tokio::io::Empty>,
        tx,
    )
    .await
    .unwrap();

    assert_eq!(summary.passed.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    let mut received = 0;
    while rx.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, 3);
}

#[tokio::test]
async fn parse_output_fails_when_receiver_dropped() {
    let stdout = tokio_test::io::Builder::new()
        .read(b"----\r\nPassed A\r\n1\r\n")
        .build();
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    drop(rx);

    let result =
        StreamParser::parse_output(ResultParser::default(), stdout, None::<tokio::io::Empty>, tx)
            .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn zero_buffer_from_config_does_not_panic() {
    let config: mstest_runner::config::RunnerConfig = toml::from_str("channel_buffer = 0").unwrap();
    let stdout = tokio_test::io::Builder::new()
        .read(b"----\r\nPassed A\r\n1\r\n")
        .build();

    let events: Vec<RunEvent> = StreamParser::into_stream(
        ResultParser::default(),
        stdout,
        None::<tokio::io::Empty>,
        config.channel_buffer,
    )
    .collect()
    .await;

    assert_eq!(events.len(), 2);
    assert!(events[1].is_terminal());
}
