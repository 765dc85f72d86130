//! Tests for the result parser state machine.

use std::sync::{Arc, Mutex};

use mstest_runner::parser::{
    Callbacks, DetailMap, ParsePhase, ResultParser, RunError, RunEvent, RunSummary, TestResult,
};

/// Typical MSTest console output with `/detail:errormessage`.
const SAMPLE_OUTPUT: &str = "Microsoft (R) Test Execution Command Line Tool Version 12.0.21005.1\r\n\
Copyright (c) Microsoft Corporation. All rights reserved.\r\n\
\r\n\
Loading C:\\build\\Widgets.Tests.dll...\r\n\
Starting execution...\r\n\
\r\n\
Results               Top Level Tests\r\n\
-------               ---------------\r\n\
Passed                Widgets.Tests.ParserTests.ParsesEmpty\r\n\
Failed                Widgets.Tests.ParserTests.ParsesNested\r\n\
[errormessage] = Assert.AreEqual failed. Expected:<2>. Actual:<3>.\r\n\
Passed                Widgets.Tests.ParserTests.ParsesFlat\r\n\
Inconclusive          Widgets.Tests.ParserTests.ParsesLater\r\n\
2/4 test(s) Passed, 1 Failed, 1 Inconclusive\r\n\
\r\n\
Summary\r\n\
-------\r\n\
Test Run Failed.\r\n\
  Failed        1\r\n";

fn run_chunks(chunks: &[&[u8]]) -> Vec<RunEvent> {
    let mut parser = ResultParser::default();
    let mut events = Vec::new();
    for chunk in chunks {
        parser.push_chunk(chunk, &mut events);
    }
    parser.finish(&mut events);
    events
}

fn results(events: &[RunEvent]) -> Vec<&TestResult> {
    events.iter().filter_map(RunEvent::test_result).collect()
}

fn done(events: &[RunEvent]) -> &RunSummary {
    match events.last() {
        Some(RunEvent::Done(summary)) => summary,
        other => panic!("Expected Done last, got {other:?}"),
    }
}

#[test]
fn sample_output_yields_every_result() {
    let events = run_chunks(&[SAMPLE_OUTPUT.as_bytes()]);

    let results = results(&events);
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].name, "Widgets.Tests.ParserTests.ParsesEmpty");
    assert_eq!(
        results[1].attribute("errorMessage"),
        Some("Assert.AreEqual failed. Expected:<2>. Actual:<3>.")
    );

    let summary = done(&events);
    assert_eq!(summary.passed.len(), 2);
    assert_eq!(summary.failed.len(), 2);
    assert_eq!(summary.passed.len() + summary.failed.len(), results.len());
}

#[test]
fn summary_block_after_end_marker_is_ignored() {
    // "Failed        1" in the trailing summary must not become a result.
    let events = run_chunks(&[SAMPLE_OUTPUT.as_bytes()]);
    assert!(results(&events).iter().all(|r| r.name != "1"));
    assert!(!events
        .iter()
        .any(|e| matches!(e, RunEvent::Error(_))));
}

#[test]
fn done_fires_exactly_once_after_all_tests() {
    let events = run_chunks(&[SAMPLE_OUTPUT.as_bytes()]);
    let done_positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_terminal())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(done_positions, vec![events.len() - 1]);
}

#[test]
fn every_chunk_size_gives_same_results() {
    let bytes = SAMPLE_OUTPUT.as_bytes();
    let expected = run_chunks(&[bytes]);

    for size in [1, 2, 3, 7, 16, 64] {
        let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
        assert_eq!(run_chunks(&chunks), expected, "chunk size {size}");
    }
}

#[test]
fn line_split_across_chunks_is_one_line() {
    let events = run_chunks(&[
        b"----\r\nPass",
        b"ed   Split.Test\r\n[own",
        b"er] = carol\r\n1/1 test(s) Passed\r\n",
    ]);
    let results = results(&events);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, "Passed");
    assert_eq!(results[0].name, "Split.Test");
    assert!(results[0].passed);
    assert_eq!(results[0].attribute("owner"), Some("carol"));
}

#[test]
fn three_line_attribute_stays_with_its_result() {
    let events = run_chunks(&[
        b"----\r\n",
        b"Failed A\r\n[errorstacktrace] = at Widgets.A()\r\n",
        b"   at Widgets.B()\r\n   at Widgets.C()\r\n",
        b"Failed B\r\n2 Failed\r\n",
    ]);
    let results = results(&events);
    assert_eq!(
        results[0].attribute("errorStackTrace"),
        Some("at Widgets.A()\r\n   at Widgets.B()\r\n   at Widgets.C()")
    );
    assert!(results[1].attribute("errorStackTrace").is_none());
}

#[test]
fn banner_lines_before_begin_marker_ignored() {
    let events = run_chunks(&[
        b"[owner] = banner\r\nPassed Banner.Test\r\nrandom text\r\n",
        b"----\r\nPassed Real.Test\r\n1\r\n",
    ]);
    let results = results(&events);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Real.Test");
    assert!(results[0].attributes.is_empty());
}

#[test]
fn closed_stream_without_end_marker_still_done() {
    let events = run_chunks(&[b"----\r\nPassed A\r\nFailed B\r\n"]);
    let summary = done(&events);
    assert_eq!(summary.total(), 2);

    let events = run_chunks(&[b"Loading...\r\n"]);
    assert_eq!(events, vec![RunEvent::Done(RunSummary::default())]);
}

#[test]
fn unix_line_endings_accepted() {
    let events = run_chunks(&[b"----\nPassed A\n[owner] = x\n1/1\n"]);
    assert_eq!(results(&events)[0].attribute("owner"), Some("x"));
}

#[test]
fn anomalies_reported_and_parsing_continues() {
    let events = run_chunks(&[b"----\r\n[owner] = nobody\r\nstray\r\nPassed A\r\n1\r\n"]);

    let errors: Vec<&RunError> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Error(err) => Some(err),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], RunError::UnexpectedAttribute { key, .. } if key == "owner"));
    assert!(matches!(errors[1], RunError::UnexpectedContinuation { line } if line == "stray"));
    assert_eq!(results(&events).len(), 1);
}

#[test]
fn custom_detail_map_renames_keys() {
    let mut parser = ResultParser::new(DetailMap::new(["Owner", "ErrorMessage"]), "en");
    let mut events = Vec::new();
    parser.push_chunk(
        b"----\r\nFailed A\r\n[owner] = x\r\n[errormessage] = y\r\n[duration] = 00:00:01\r\n1\r\n",
        &mut events,
    );
    let result = &results(&events)[0];
    assert_eq!(result.attribute("Owner"), Some("x"));
    assert_eq!(result.attribute("ErrorMessage"), Some("y"));
    assert_eq!(result.attribute("duration"), Some("00:00:01"));
}

#[test]
fn unknown_language_uses_english() {
    let mut parser = ResultParser::new(DetailMap::default(), "tlh");
    let mut events = Vec::new();
    parser.push_chunk(b"----\r\nPassed A\r\nFinal Test Results:\r\n", &mut events);
    assert_eq!(parser.phase(), ParsePhase::Stopped);
    assert!(results(&events)[0].passed);
}

#[test]
fn callbacks_receive_events_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (on_test, on_done, on_error) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
    let mut sink = Callbacks::new()
        .on_test(move |r| on_test.lock().unwrap().push(format!("test {}", r.name)))
        .on_done(move |s| on_done.lock().unwrap().push(format!("done {}", s.total())))
        .on_error(move |_| on_error.lock().unwrap().push("error".to_string()));

    let mut parser = ResultParser::default();
    parser.push_chunk(b"----\r\nPassed A\r\nstray\r\nFailed B\r\n2/2\r\n", &mut sink);
    parser.finish(&mut sink);

    assert_eq!(
        *log.lock().unwrap(),
        vec!["error", "test A", "test B", "done 2"]
    );
}
