use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INVOICE: &str = "Factura: INV-01\nFecha: 15/03/2024\nCliente: Empresa SA\nTotal: $100.00\n";
const OTHER_INVOICE: &str = "Factura: INV-02\nFecha: 2024-04-01\nTotal: 250.50\n";

fn docrec() -> Command {
    Command::cargo_bin("docrec").unwrap()
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_process_invoice_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "invoice.txt", INVOICE);

    docrec()
        .args(["process", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-01"))
        .stdout(predicate::str::contains("2024-03-15"))
        .stdout(predicate::str::contains("_source_file").not());
}

#[test]
fn test_process_csv_output() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "invoice.txt", INVOICE);

    docrec()
        .args(["process", &input, "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("invoice_id,"))
        .stdout(predicate::str::contains("INV-01,2024-03-15"));
}

#[test]
fn test_process_report_from_json_tables() {
    let dir = TempDir::new().unwrap();
    let input = write(
        dir.path(),
        "ventas.json",
        r#"{"text": "", "tables": [[["Producto", "Importe"], ["A", "1.234,50"], ["TOTAL", "1.234,50"]]]}"#,
    );

    docrec()
        .args(["process", &input, "-p", "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"producto\": \"A\""))
        .stdout(predicate::str::contains("1234.5"))
        .stdout(predicate::str::contains("TOTAL").not());
}

#[test]
fn test_process_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.txt");

    docrec()
        .args(["process", &missing.to_string_lossy()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("document not found"));
}

#[test]
fn test_unknown_parser_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "invoice.txt", INVOICE);

    docrec()
        .args(["process", &input, "-p", "receipt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown parser"));
}

#[test]
fn test_batch_writes_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);
    write(dir.path(), "b.txt", OTHER_INVOICE);
    write(dir.path(), "notes.md", "ignored");
    let output = dir.path().join("out").join("records.json");
    let pattern = dir.path().join("*").to_string_lossy().into_owned();

    docrec()
        .args(["batch", &pattern, "-o", &output.to_string_lossy()])
        .assert()
        .success();

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["invoice_id"], "INV-01");
    assert_eq!(records[1]["invoice_id"], "INV-02");
    assert!(records[0].get("_source_file").is_none());
}

#[test]
fn test_batch_keep_internal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", INVOICE);
    let output = dir.path().join("records.json");
    let pattern = dir.path().join("*.txt").to_string_lossy().into_owned();

    docrec()
        .args(["batch", &pattern, "-o", &output.to_string_lossy(), "--keep-internal"])
        .assert()
        .success();

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(records[0]["_source_file"], "a.txt");
}

#[test]
fn test_batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("*.pdf").to_string_lossy().into_owned();

    docrec()
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "invoice.txt", INVOICE);
    let output = dir.path().join("records.json");

    docrec()
        .args(["process", &input, "-o", &output.to_string_lossy(), "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Dry run"));

    assert!(!output.exists());
}

#[test]
fn test_config_init_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let config = config.to_string_lossy();

    docrec()
        .args(["-c", &config, "config", "init"])
        .assert()
        .success();

    docrec()
        .args(["-c", &config, "config", "get", "validation.max_errors"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10"));

    docrec()
        .args(["-c", &config, "config", "set", "parsers.0.enabled", "false"])
        .assert()
        .success();

    docrec()
        .args(["-c", &config, "config", "get", "parsers.0.enabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));

    docrec()
        .args(["-c", &config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_get_unknown_key() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    docrec()
        .args(["-c", &config.to_string_lossy(), "config", "get", "no.such.key"])
        .assert()
        .failure();
}
