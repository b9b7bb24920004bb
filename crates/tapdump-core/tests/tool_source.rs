use std::fs;
use std::path::PathBuf;

use tapdump_core::{
    LineSource, PipelineError, SourceError, ToolConfig, ToolLineSource, parse_capture_file,
};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tool(program: &str) -> ToolConfig {
    ToolConfig {
        program: program.to_string(),
        args: Vec::new(),
        ..ToolConfig::default()
    }
}

#[cfg(unix)]
#[test]
fn tool_output_is_read_line_by_line() {
    let mut source = ToolLineSource::run(&tool("cat"), &fixture("mixed.txt")).unwrap();
    let first = source.next_line().unwrap().expect("first line");
    assert!(first.starts_with("reading from file"));

    let mut count = 1;
    while source.next_line().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 11);
}

#[cfg(unix)]
#[test]
fn capture_file_pipeline_runs_the_tool() {
    let packets = parse_capture_file(&fixture("mixed.txt"), &tool("cat")).unwrap();
    assert_eq!(packets.len(), 3);
}

#[cfg(unix)]
#[test]
fn non_zero_exit_is_invocation_failure() {
    let err = match ToolLineSource::run(&tool("false"), &fixture("mixed.txt")) {
        Ok(_) => panic!("expected failing tool to be reported"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::ToolInvocationFailed { .. }));
}

#[test]
fn missing_program_is_invocation_failure() {
    let err = parse_capture_file(&fixture("mixed.txt"), &tool("tapdump-no-such-tool")).unwrap_err();
    match err {
        PipelineError::Source(SourceError::ToolInvocationFailed { program, .. }) => {
            assert_eq!(program, "tapdump-no-such-tool");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreadable_capture_is_invocation_failure() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcap");
    let err = match ToolLineSource::run(&ToolConfig::default(), &missing) {
        Ok(_) => panic!("expected missing capture to be reported"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("missing.pcap"));
    assert!(matches!(err, SourceError::ToolInvocationFailed { .. }));
}

#[cfg(unix)]
#[test]
fn empty_output_yields_no_packets() {
    let temp = TempDir::new().expect("tempdir");
    let empty = temp.path().join("empty.pcap");
    fs::write(&empty, "").unwrap();
    let packets = parse_capture_file(&empty, &tool("cat")).unwrap();
    assert!(packets.is_empty());
}
