//! Command line tests for tabscan.
//!
//! Tests cover:
//! 1. detect / header / count / inspect subcommands
//! 2. query sorting, paging and the summary trailer
//! 3. stdin input
//! 4. Error reporting and exit status

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::NamedTempFile;

// =============================================================================
// Helper functions
// =============================================================================

const PEOPLE: &str = "Name,Age,City\nJohn,30,NY\nJane,25,LA\nBob,35,Chi\n";

fn create_table_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
}

fn run_tabscan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tabscan"))
        .args(args)
        .output()
        .expect("Failed to run tabscan")
}

fn run_tabscan_with_stdin(args: &[&str], stdin_content: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tabscan"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn tabscan");

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(stdin_content.as_bytes()).unwrap();
    }

    child.wait_with_output().expect("Failed to wait for tabscan")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// =============================================================================
// Metadata subcommands
// =============================================================================

#[test]
fn test_detect_semicolon() {
    let file = create_table_file("a;b;c\n1;2;3\n4;5;6\n");
    let output = run_tabscan(&["detect", "-i", file.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Semicolon (;)\n");
}

#[test]
fn test_header_lists_columns() {
    let file = create_table_file(PEOPLE);
    let output = run_tabscan(&["header", "-i", file.path().to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Name\nAge\nCity\n");
}

#[test]
fn test_count_with_and_without_filter() {
    let file = create_table_file(PEOPLE);
    let path = file.path().to_str().unwrap();

    let output = run_tabscan(&["count", "-i", path]);
    assert_eq!(stdout(&output), "3\n");

    let output = run_tabscan(&["count", "-i", path, "-s", "jo"]);
    assert_eq!(stdout(&output), "1\n");

    let output = run_tabscan(&["count", "-i", path, "-s", "jo", "--inverse"]);
    assert_eq!(stdout(&output), "2\n");

    let output = run_tabscan(&["count", "-i", path, "-c", "Name=j", "-c", "City=a"]);
    assert_eq!(stdout(&output), "1\n");
}

#[test]
fn test_detect_carriage_return_only_file() {
    let file = create_table_file("a|b|c\r1|2|3\r4|5|6\r");
    let output = run_tabscan(&["detect", "-i", file.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Pipe (|)\n");

    let output = run_tabscan(&["count", "-i", file.path().to_str().unwrap()]);
    assert_eq!(stdout(&output), "2\n");
}

#[test]
fn test_count_keeps_quoted_empty_row() {
    let file = create_table_file("name\nA\n\"\"\n\n  \nB\n");
    let output = run_tabscan(&["count", "-i", file.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "3\n");
}

#[test]
fn test_version_flag() {
    let output = run_tabscan(&["--version"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), format!("tabscan {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_inspect() {
    let file = create_table_file("id|name\n1|x\n2|y\n");
    let output = run_tabscan(&["inspect", "-i", file.path().to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("delimiter\tPipe (|)\n"), "{}", text);
    assert!(text.contains("rows\t2\n"), "{}", text);
    assert!(text.contains("columns\t2\n0\tid\n1\tname\n"), "{}", text);
}

// =============================================================================
// Query
// =============================================================================

#[test]
fn test_query_sorted_page() {
    let file = create_table_file(PEOPLE);
    let output = run_tabscan(&[
        "query",
        "-i",
        file.path().to_str().unwrap(),
        "--sort",
        "Age",
        "--page-size",
        "2",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Name\tAge\tCity\nJane\t25\tLA\nJohn\t30\tNY\n# total=3 page=0 page_size=2 pages=2\n"
    );
}

#[test]
fn test_query_descending_second_page() {
    let file = create_table_file(PEOPLE);
    let output = run_tabscan(&[
        "query",
        "-i",
        file.path().to_str().unwrap(),
        "--sort",
        "Age",
        "--desc",
        "--page",
        "1",
        "--page-size",
        "2",
    ]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Name\tAge\tCity\nJane\t25\tLA\n# total=3 page=1 page_size=2 pages=2\n"
    );
}

#[test]
fn test_query_all_from_stdin() {
    let output = run_tabscan_with_stdin(&["query", "-i", "-", "--all", "-s", "a"], PEOPLE);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Name\tAge\tCity\nJane\t25\tLA\n# total=1 page=0 page_size=1 pages=1\n"
    );
}

#[test]
fn test_query_missing_input_reads_stdin() {
    let output = run_tabscan_with_stdin(&["count"], "x\ty\n1\t2\n");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "1\n");
}

#[test]
fn test_query_stats_on_stderr() {
    let file = create_table_file(PEOPLE);
    let output = run_tabscan(&["query", "-i", file.path().to_str().unwrap(), "--stats"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("Query stats: Scanned: 3, Matched: 3"));
}

#[test]
fn test_query_with_explicit_delimiter_and_threads() {
    let file = create_table_file("a,b;c\n1,2;3\n");
    let output = run_tabscan(&[
        "--threads",
        "2",
        "query",
        "-i",
        file.path().to_str().unwrap(),
        "-d",
        "semicolon",
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("a,b\tc\n1,2\t3\n"));
}

// =============================================================================
// Error handling
// =============================================================================

#[test]
fn test_missing_file_fails() {
    let output = run_tabscan(&["count", "-i", "/nonexistent/table.csv"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: Source '/nonexistent/table.csv' unavailable"));
}

#[test]
fn test_zero_page_size_fails() {
    let file = create_table_file(PEOPLE);
    let output = run_tabscan(&[
        "query",
        "-i",
        file.path().to_str().unwrap(),
        "--page-size",
        "0",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: Invalid page request"));
}

#[test]
fn test_bad_column_search_rejected() {
    let file = create_table_file(PEOPLE);
    let output = run_tabscan(&["count", "-i", file.path().to_str().unwrap(), "-c", "Name"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("NAME=PATTERN"));
}

#[test]
fn test_bad_delimiter_rejected() {
    let file = create_table_file(PEOPLE);
    let output = run_tabscan(&["header", "-i", file.path().to_str().unwrap(), "-d", "colon"]);
    assert!(!output.status.success());
}

#[test]
fn test_strict_columns() {
    let file = create_table_file("a,b,c\n1,2,3\n4,5\n");
    let path = file.path().to_str().unwrap();

    let output = run_tabscan(&["query", "-i", path]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("4\t5\t\n"));

    let output = run_tabscan(&["--strict-columns", "query", "-i", path]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Ragged row at line 3: expected 3 cells, found 2"));
}
