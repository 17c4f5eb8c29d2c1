//! # CLI Command Tests
//!
//! Runs the `taxbot` binary inside a temporary working directory holding its own
//! `config.yml`, so every path the commands touch stays inside the test directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Creates a working directory with a config that points every path into it.
fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("config.yml"),
        r#"
store:
  path: "db/test.db"
dataset_inference:
  kind: ollama
  api_url: "http://127.0.0.1:9"
  model: "gemma3:4b"
  timeout_secs: 2
paths:
  merge_input_dir: "qa"
  merge_output: "out/merged.jsonl"
  clean_input: "uu.json"
  clean_output: "out/uu_clean.json"
  synth_input: "out/uu_clean.json"
  synth_output: "out/qa_generated.jsonl"
  window_questions: "windows.jsonl"
  selected_questions: "out/selected.jsonl"
  convert_input: "qa_generated.jsonl"
  convert_output: "out/chat.jsonl"
batch:
  questions_per_kind: 1
"#,
    )
    .unwrap();
    dir
}

fn taxbot(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("taxbot").unwrap();
    cmd.current_dir(dir)
        .env_remove("TAXBOT_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn read_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_clean_command_writes_cleaned_records() {
    // Arrange
    let dir = workspace();
    fs::write(
        dir.path().join("uu.json"),
        json!([{"Pasal": "Pasal 5", "Sumber": "(Sumber : UU X)"}]).to_string(),
    )
    .unwrap();

    // Act & Assert
    taxbot(dir.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Cleaned 1 records into 'out/uu_clean.json'.",
        ));

    let cleaned: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out/uu_clean.json")).unwrap())
            .unwrap();
    assert_eq!(cleaned, json!([{"Pasal": "5", "Sumber": "UU X"}]));
}

#[test]
fn test_merge_command_counts_records() {
    let dir = workspace();
    let qa = dir.path().join("qa");
    fs::create_dir(&qa).unwrap();
    fs::write(qa.join("a.jsonl"), "{\"Isi\": \"satu\"}\nnot json\n").unwrap();
    fs::write(qa.join("b.jsonl"), "{\"Isi\": \"dua\"}\n").unwrap();

    taxbot(dir.path())
        .arg("merge")
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 2 records"));

    assert_eq!(read_lines(&dir.path().join("out/merged.jsonl")).len(), 2);
}

#[test]
fn test_convert_command_builds_chat_records() {
    let dir = workspace();
    fs::write(
        dir.path().join("qa_generated.jsonl"),
        format!(
            "{}\n",
            json!({"type": "specific", "instruction": "Berapa tarif PPN?", "output": "11%.", "source": "Pasal 7 UU HPP"})
        ),
    )
    .unwrap();

    taxbot(dir.path())
        .arg("convert")
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 1 records"));

    let records = read_lines(&dir.path().join("out/chat.jsonl"));
    assert_eq!(records[0]["messages"][2]["content"], "11%.\nSource: Pasal 7 UU HPP");
}

#[test]
fn test_select_command_samples_each_kind() {
    let dir = workspace();
    let windows = [
        json!({"window_start_chunk": 0, "window_end_chunk": 2, "text": "t",
               "question_spesifik": "Berapa tarif PPN?", "question_studi_kasus": "Bagaimana jika terlambat?"}),
        json!({"window_start_chunk": 1, "window_end_chunk": 3, "text": "t",
               "question_spesifik": null, "question_studi_kasus": null}),
    ];
    fs::write(
        dir.path().join("windows.jsonl"),
        windows
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    )
    .unwrap();

    taxbot(dir.path())
        .arg("select")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 2 questions"));

    let selected = read_lines(&dir.path().join("out/selected.jsonl"));
    assert_eq!(
        selected,
        vec![
            json!({"type": "spesifik", "prompt": "Berapa tarif PPN?"}),
            json!({"type": "studi_kasus", "prompt": "Bagaimana jika terlambat?"}),
        ]
    );
}

#[test]
fn test_synth_aborts_when_the_engine_is_unreachable() {
    let dir = workspace();
    fs::create_dir(dir.path().join("out")).unwrap();
    fs::write(
        dir.path().join("out/uu_clean.json"),
        json!([{"Isi": "Tarif PPN 11%.", "Sumber": "Pasal 7"}]).to_string(),
    )
    .unwrap();

    taxbot(dir.path())
        .arg("synth")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Synth failed"))
        .stderr(predicate::str::contains("not reachable"));

    assert!(!dir.path().join("out/qa_generated.jsonl").exists());
}

#[test]
fn test_chat_exits_on_exit_command() {
    let dir = workspace();

    taxbot(dir.path())
        .arg("chat")
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("User: "))
        .stdout(predicate::str::contains("Bye!"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = workspace();

    taxbot(dir.path())
        .args(["--config", "missing.yml", "clean"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Clean failed"))
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_dump_exports_an_empty_store() {
    let dir = workspace();

    taxbot(dir.path())
        .arg("dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chunks in store: 0"))
        .stdout(predicate::str::contains(
            "Exported 0 chunks to 'dataset/exported_chunks.json'.",
        ));

    let exported: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("dataset/exported_chunks.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(exported, json!([]));
}

#[test]
fn test_log_file_keeps_earlier_runs() {
    let dir = workspace();
    let log = dir.path().join("taxbot.log");
    fs::write(&log, "earlier run\n").unwrap();
    fs::write(dir.path().join("uu.json"), "[]").unwrap();

    taxbot(dir.path()).arg("--help").assert().success();
    taxbot(dir.path())
        .arg("clean")
        .env("RUST_LOG", "info")
        .assert()
        .success();

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.starts_with("earlier run\n"));
    assert!(content.contains("Loading configuration from 'config.yml'."));
}
