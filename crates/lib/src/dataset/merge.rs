//! Merges every `.json` and `.jsonl` file in a directory into one output file.

use super::{io, DatasetError};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// Fields whose embedded newlines are flattened when requested.
const FLATTEN_FIELDS: [&str; 2] = ["Isi", "Penjelasan"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Replace `\n` with a space in the `Isi` and `Penjelasan` fields.
    pub flatten_newlines: bool,
}

/// The `.json` / `.jsonl` files directly inside `dir`, sorted by file name.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(DatasetError::io(dir))? {
        let path = entry.map_err(DatasetError::io(dir))?.path();
        let is_input = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "json" || e == "jsonl");
        if is_input {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn flatten(record: &mut Value) {
    let Some(obj) = record.as_object_mut() else {
        return;
    };
    for field in FLATTEN_FIELDS {
        if let Some(Value::String(s)) = obj.get_mut(field) {
            *s = s.replace('\n', " ");
        }
    }
}

/// Reads every input file in `input_dir`, concatenates their records and writes them to
/// `output` (a JSON array when it ends in `.json`, JSON Lines otherwise).
///
/// Malformed JSON Lines are skipped; an unreadable `.json` file is skipped with a
/// warning. Returns the number of merged records.
pub fn merge_directory(
    input_dir: &Path,
    output: &Path,
    options: &MergeOptions,
) -> Result<usize, DatasetError> {
    let files = list_input_files(input_dir)?;
    info!("Found {} input files in '{}'", files.len(), input_dir.display());

    let mut merged = Vec::new();
    for path in files {
        if output.exists() && fs::canonicalize(&path).ok() == fs::canonicalize(output).ok() {
            continue;
        }
        let records = if io::is_json_array_path(&path) {
            match io::read_json_records(&path) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Skipping '{}': {e}", path.display());
                    continue;
                }
            }
        } else {
            io::read_jsonl(&path)?
        };
        info!("Read {} records from '{}'", records.len(), path.display());
        merged.extend(records);
    }

    if options.flatten_newlines {
        merged.iter_mut().for_each(flatten);
    }

    io::write_records(output, &merged)?;
    info!("Merged {} records into '{}'", merged.len(), output.display());
    Ok(merged.len())
}
