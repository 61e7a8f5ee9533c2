use std::io::BufReader;

use rt_chains::*;
use tempfile::TempDir;

mod common;

fn system_of(seed: i64) -> SystemParams {
    SystemParams {
        seed,
        ..common::sample_trace().system_params()
    }
}

fn chain(id: i64) -> ChainResult {
    ChainResult {
        id,
        ..common::sample_trace().chain_result()
    }
}

/// A results file written trace by trace reads back in order.
#[test]
fn test_results_write_then_read() {
    common::setup_test();
    let traces: Vec<Trace> = (0..3)
        .flat_map(|seed| (0..4).map(move |id| Trace::new(chain(id), &system_of(seed))))
        .collect();

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("results.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    write_traces(&mut file, &traces).unwrap();
    drop(file);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 12);
    assert!(!text.starts_with(char::is_alphabetic), "no header line");

    assert_eq!(read_traces(&path).unwrap(), traces);
}

/// The first malformed line aborts the read and is named in the error.
#[test]
fn test_results_malformed_line() {
    common::setup_test();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("results.txt");
    let good = common::sample_trace().to_line();
    std::fs::write(&path, format!("{good}{good}1 2 3\n{good}")).unwrap();

    let err = read_traces(&path).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("results.txt"), "{msg}");
    assert!(msg.contains("line 3"), "{msg}");
    assert!(msg.contains("\"1 2 3\""), "{msg}");

    let parse_err = err.downcast_ref::<ResultsError>().unwrap();
    assert!(matches!(parse_err, ResultsError::Parse { line_no: 3, .. }));
}

/// Missing results files surface the open failure.
#[test]
fn test_results_missing_file() {
    common::setup_test();
    let tmp = TempDir::new().unwrap();
    let err = read_traces(&tmp.path().join("absent.txt")).unwrap_err();
    assert!(format!("{err:#}").contains("absent.txt"));
    assert!(err.downcast_ref::<std::io::Error>().is_some());
}

/// The reader can be used incrementally on any buffered source.
#[test]
fn test_results_streaming_reader() {
    common::setup_test();
    let mut buf = Vec::new();
    write_traces(&mut buf, &[common::sample_trace(), common::sample_trace()]).unwrap();
    buf.extend_from_slice(b"\n\n");

    let mut reader = TraceReader::new(BufReader::new(buf.as_slice()));
    assert_eq!(reader.next().unwrap().unwrap(), common::sample_trace());
    assert_eq!(reader.line_no(), 1);
    assert_eq!(reader.next().unwrap().unwrap(), common::sample_trace());
    assert!(reader.next().is_none());
    assert_eq!(reader.line_no(), 4);
}
