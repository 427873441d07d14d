use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

fn filebench() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_filebench"));
    cmd.env_remove("FILEBENCH_RUNTIME")
        .env_remove("FILEBENCH_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn bench_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fib.aria"), "fib(20)").unwrap();
    fs::write(dir.path().join("loop.aria"), "loop").unwrap();
    fs::write(dir.path().join("notes.txt"), "skip me").unwrap();
    dir
}

fn fast_args<'a>(output: &'a Path) -> Vec<&'a str> {
    vec![
        "--runtime",
        "true",
        "--output",
        output.to_str().unwrap(),
        "--epochs",
        "2",
        "--no-counters",
        "--no-color",
        "--min-epoch-time-ms",
        "0",
        "--max-epoch-time-ms",
        "1",
    ]
}

#[test]
fn test_cli_exits_with_success_on_help() {
    filebench().arg("--help").assert().success();
}

#[test]
fn test_cli_requires_directory_argument() {
    filebench().assert().failure().code(2);
}

#[test]
fn test_cli_runs_matching_files_and_writes_results() {
    let inputs = bench_dir();
    let output = TempDir::new().unwrap();
    let mut cmd = filebench();
    cmd.arg(inputs.path().to_str().unwrap())
        .args(fast_args(output.path()))
        .arg("--no-save");
    cmd.assert().success();

    let json = fs::read_to_string(output.path().join("results/report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let names: Vec<&str> = value["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with("fib.aria"));
    assert!(names[1].ends_with("loop.aria"));
    assert!(!output.path().join("baseline").exists());
}

#[test]
fn test_cli_yes_promotes_baseline() {
    let inputs = bench_dir();
    let output = TempDir::new().unwrap();
    let mut cmd = filebench();
    cmd.arg(inputs.path().to_str().unwrap())
        .arg("fib")
        .args(fast_args(output.path()))
        .arg("--yes");
    cmd.assert().success();

    let json = fs::read_to_string(output.path().join("baseline/report.json")).unwrap();
    assert!(json.contains("fib.aria"));
    assert!(!json.contains("loop.aria"));
}

#[test]
fn test_cli_missing_directory_fails() {
    let output = TempDir::new().unwrap();
    let missing = output.path().join("does-not-exist");
    let mut cmd = filebench();
    cmd.arg(missing.to_str().unwrap())
        .args(fast_args(output.path()))
        .arg("--no-save");
    cmd.assert().failure().code(1);
}

#[test]
fn test_cli_rejects_dotted_extension() {
    let inputs = bench_dir();
    let output = TempDir::new().unwrap();
    let mut cmd = filebench();
    cmd.arg(inputs.path().to_str().unwrap())
        .args(fast_args(output.path()))
        .args(["--extension", ".aria", "--no-save"]);
    cmd.assert().failure().code(2);
}
