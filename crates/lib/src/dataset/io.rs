//! JSON and JSON Lines helpers shared by the batch commands.

use super::DatasetError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};
use tracing::warn;

/// How many characters of an invalid line end up in the log.
const FRAGMENT_CHARS: usize = 50;

pub(crate) fn fragment(line: &str) -> String {
    line.chars().take(FRAGMENT_CHARS).collect()
}

fn ensure_parent(path: &Path) -> Result<(), DatasetError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(DatasetError::io(parent))
        }
        _ => Ok(()),
    }
}

/// Reads a JSON Lines file. Blank lines are ignored; lines that fail to parse are
/// logged with a short fragment and skipped.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let file = File::open(path).map_err(DatasetError::io(path))?;
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(DatasetError::io(path))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(
                "Invalid JSON in '{}' line {}: {}... ({e})",
                path.display(),
                idx + 1,
                fragment(line)
            ),
        }
    }
    Ok(records)
}

/// Like [`read_jsonl`], but a missing file reads as empty.
pub fn read_jsonl_or_empty<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_jsonl(path)
}

/// Reads a `.json` file holding either an array of records or a single record.
pub fn read_json_records(path: &Path) -> Result<Vec<Value>, DatasetError> {
    let text = fs::read_to_string(path).map_err(DatasetError::io(path))?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Array(items) => Ok(items),
        obj @ Value::Object(_) => Ok(vec![obj]),
        other => Err(DatasetError::InvalidInput {
            path: path.display().to_string(),
            reason: format!("expected an array or object, found {}", type_name(&other)),
        }),
    }
}

/// Reads records from `.json` (array or object) or JSON Lines, chosen by extension.
pub fn read_records(path: &Path) -> Result<Vec<Value>, DatasetError> {
    if is_json_array_path(path) {
        read_json_records(path)
    } else {
        read_jsonl(path)
    }
}

/// Writes `records` as JSON Lines, replacing the file.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<(), DatasetError> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(DatasetError::io(path))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(DatasetError::io(path))?;
    }
    writer.flush().map_err(DatasetError::io(path))
}

/// Appends `records` as JSON Lines, creating the file when needed.
pub fn append_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<(), DatasetError> {
    ensure_parent(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(DatasetError::io(path))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(DatasetError::io(path))?;
    }
    writer.flush().map_err(DatasetError::io(path))
}

/// Writes `records` as a pretty-printed JSON array, replacing the file.
pub fn write_json_array<T: Serialize>(path: &Path, records: &[T]) -> Result<(), DatasetError> {
    ensure_parent(path)?;
    let text = serde_json::to_string_pretty(records)?;
    fs::write(path, text).map_err(DatasetError::io(path))
}

/// Writes a JSON array for `.json` paths and JSON Lines otherwise.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), DatasetError> {
    if is_json_array_path(path) {
        write_json_array(path, records)
    } else {
        write_jsonl(path, records)
    }
}

/// Number of lines in `path`, or 0 when it does not exist.
pub fn count_lines(path: &Path) -> Result<usize, DatasetError> {
    if !path.exists() {
        return Ok(0);
    }
    let file = File::open(path).map_err(DatasetError::io(path))?;
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        line.map_err(DatasetError::io(path))?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn is_json_array_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
