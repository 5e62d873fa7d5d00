// tests/cli_tests.rs

use std::fs;
use std::path::PathBuf;

use hdfq::cli::{self, CliError, OutputFormat, RepairOptions, RunOptions};
use hdfq::store::ErrorMode;
use tempfile::TempDir;

const DOCUMENT: &str = r#"{"kind": "group", "entries": {
    "x": {"kind": "dataset", "dtype": "int64", "shape": [], "data": [1]},
    "y": {"kind": "dataset", "dtype": "int64", "shape": [], "data": [2]}
}}"#;

fn document(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("doc.json");
    fs::write(&path, DOCUMENT).unwrap();
    path
}

fn options(filter: &str, path: PathBuf) -> RunOptions {
    RunOptions {
        filter: filter.to_string(),
        path,
        format: OutputFormat::Text,
        error_mode: ErrorMode::Ignore,
    }
}

fn run(options: &RunOptions) -> Result<String, CliError> {
    let mut out = Vec::new();
    cli::execute(options, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_keys() {
    let dir = TempDir::new().unwrap();
    let output = run(&options("keys", document(&dir))).unwrap();
    assert_eq!(output, "[\n  'x',\n  'y'\n]\n");
}

#[test]
fn test_read_only_filter_does_not_rewrite() {
    let dir = TempDir::new().unwrap();
    let path = document(&dir);
    run(&options(".x", path.clone())).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), DOCUMENT);
}

#[test]
fn test_assignment_is_persisted() {
    let dir = TempDir::new().unwrap();
    let path = document(&dir);

    let output = run(&options(".x = 9 | .x", path.clone())).unwrap();
    assert_eq!(output, "9\n");

    let output = run(&options(".x", path)).unwrap();
    assert_eq!(output, "9\n");
}

#[test]
fn test_delete_is_persisted() {
    let dir = TempDir::new().unwrap();
    let path = document(&dir);
    run(&options("del(.x)", path.clone())).unwrap();
    assert_eq!(run(&options("keys", path)).unwrap(), "[\n  'y'\n]\n");
}

#[test]
fn test_partial_pipeline_is_persisted() {
    let dir = TempDir::new().unwrap();
    let path = document(&dir);

    let err = run(&options(".x = 5 | .missing", path.clone())).unwrap_err();
    assert_eq!(err.to_string(), "Evaluation error: key 'missing' not found");
    assert_eq!(run(&options(".x", path)).unwrap(), "5\n");
}

#[test]
fn test_nan_assignment_keeps_document_writable() {
    let dir = TempDir::new().unwrap();
    let path = document(&dir);

    run(&options(".a = nan", path.clone())).unwrap();
    run(&options(".x = 2", path.clone())).unwrap();
    assert_eq!(run(&options(".a", path)).unwrap(), "NaN\n");
}

#[test]
fn test_json_format() {
    let dir = TempDir::new().unwrap();
    let mut options = options("", document(&dir));
    options.format = OutputFormat::Json;
    assert_eq!(run(&options).unwrap(), "{\n  \"x\": 1,\n  \"y\": 2\n}\n");
}

#[test]
fn test_missing_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.json");
    let err = run(&options("keys", path.clone())).unwrap_err();
    assert!(matches!(err, CliError::MissingPath(_)));
    assert_eq!(
        err.to_string(),
        format!("{} does not exist for 'PATH'.", path.display())
    );
}

#[test]
fn test_parse_error_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = document(&dir);
    let err = run(&options("1 = 2", path.clone())).unwrap_err();
    assert!(matches!(err, CliError::Parse(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), DOCUMENT);
}

#[test]
fn test_repair_command() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r#"{"kind": "group", "entries": {
            "x": {"kind": "dataset", "dtype": "int64", "shape": [], "data": [1]},
            "bad": {"kind": "dataset", "dtype": "int64", "shape": [3], "data": []}
        }}"#,
    )
    .unwrap();

    let mut out = Vec::new();
    let report = cli::repair_document(
        &RepairOptions {
            path: path.clone(),
            verbose: true,
        },
        &mut out,
    )
    .unwrap();

    assert_eq!(report.recovered, 1);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Recovered 1 entries, dropped 1.\n  dropped .bad\n"
    );
    assert_eq!(run(&options("keys", path)).unwrap(), "[\n  'x'\n]\n");
}

#[test]
fn test_repair_missing_path() {
    let dir = TempDir::new().unwrap();
    let err = cli::repair_document(
        &RepairOptions {
            path: dir.path().join("missing.json"),
            verbose: false,
        },
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, CliError::MissingPath(_)));
}
