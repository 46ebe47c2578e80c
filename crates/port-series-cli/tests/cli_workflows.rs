#![allow(missing_docs)]

use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn cli_bin() -> &'static str {
    env!("CARGO_BIN_EXE_portseries")
}

fn run_cli(args: &[&str]) -> io::Result<Output> {
    Command::new(cli_bin()).args(args).output()
}

fn assert_cli_success(output: &Output) {
    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn write_u64_file(path: &Path, values: &[u64]) -> io::Result<()> {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    fs::write(path, bytes)
}

fn write_port(dir: &Path, port: &str, rows: &[(u64, u64)]) -> io::Result<()> {
    let ts: Vec<u64> = rows.iter().map(|(ts, _)| *ts).collect();
    let val: Vec<u64> = rows.iter().map(|(_, v)| *v).collect();
    fs::write(
        dir.join(format!("{port}.count")),
        (rows.len() as u64).to_le_bytes(),
    )?;
    write_u64_file(&dir.join(format!("{port}.ts")), &ts)?;
    write_u64_file(&dir.join(format!("{port}.val")), &val)
}

fn sample_dir() -> io::Result<TempDir> {
    let tmp = TempDir::new()?;
    write_port(tmp.path(), "8080", &[(1, 11), (3, 13), (5, 15)])?;
    write_port(tmp.path(), "9090", &[(2, 22), (3, 23), (4, 24)])?;
    Ok(tmp)
}

#[test]
fn read_previews_aligned_table() -> TestResult {
    let tmp = sample_dir()?;
    let dir = tmp.path().to_string_lossy().to_string();

    let output = run_cli(&[
        "read", "--dir", &dir, "--port", "8080=web", "--port", "9090=api",
    ])?;
    assert_cli_success(&output);

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("web"), "{stdout}");
    assert!(stdout.contains("api"), "{stdout}");
    assert!(stdout.contains("total_rows: 5"), "{stdout}");
    Ok(())
}

#[test]
fn read_writes_csv_with_requested_column_order() -> TestResult {
    let tmp = sample_dir()?;
    let dir = tmp.path().to_string_lossy().to_string();
    let out_path = tmp.path().join("aligned.csv");
    let out = out_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "read", "--dir", &dir, "--port", "9090=api", "--port", "8080=web", "--output", &out,
        "--max-rows", "0",
    ])?;
    assert_cli_success(&output);

    let text = fs::read_to_string(&out_path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "ts,api,web");
    assert!(lines[1].ends_with(",0,11"), "{}", lines[1]);
    assert!(lines[3].ends_with(",23,13"), "{}", lines[3]);

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("wrote:"), "{stdout}");
    Ok(())
}

#[test]
fn read_scales_time_and_exports_jsonl() -> TestResult {
    let tmp = TempDir::new()?;
    write_port(tmp.path(), "p", &[(0, 1), (10, 2), (20, 3)])?;
    let dir = tmp.path().to_string_lossy().to_string();
    let out_path = tmp.path().join("scaled.jsonl");
    let out = out_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "read", "--dir", &dir, "--port", "p", "--scale", "2", "--output", &out, "--format",
        "jsonl",
    ])?;
    assert_cli_success(&output);

    let text = fs::read_to_string(&out_path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[2].contains("00:00:00.000000040"), "{}", lines[2]);
    assert!(lines[2].contains("\"p\":3"), "{}", lines[2]);
    Ok(())
}

#[test]
fn read_rejects_non_positive_scale() -> TestResult {
    let tmp = sample_dir()?;
    let dir = tmp.path().to_string_lossy().to_string();

    let output = run_cli(&["read", "--dir", &dir, "--port", "8080", "--scale", "0"])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn read_requires_at_least_one_port() -> TestResult {
    let tmp = sample_dir()?;
    let dir = tmp.path().to_string_lossy().to_string();

    let output = run_cli(&["read", "--dir", &dir])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn read_reports_missing_port() -> TestResult {
    let tmp = sample_dir()?;
    let dir = tmp.path().to_string_lossy().to_string();

    let output = run_cli(&["read", "--dir", &dir, "--port", "8080", "--port", "7777"])?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("7777"), "{stderr}");
    Ok(())
}

#[test]
fn read_rejects_duplicate_column_names() -> TestResult {
    let tmp = sample_dir()?;
    let dir = tmp.path().to_string_lossy().to_string();

    let output = run_cli(&[
        "read", "--dir", &dir, "--port", "8080=x", "--port", "9090=x",
    ])?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Invalid --port list"), "{stderr}");
    Ok(())
}

#[test]
fn ports_lists_counts() -> TestResult {
    let tmp = sample_dir()?;
    let dir = tmp.path().to_string_lossy().to_string();

    let output = run_cli(&["ports", "--dir", &dir])?;
    assert_cli_success(&output);

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("8080"), "{stdout}");
    assert!(stdout.contains("9090"), "{stdout}");
    assert!(stdout.contains("first_ts"), "{stdout}");
    Ok(())
}
